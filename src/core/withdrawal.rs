use super::annuity::{MONTHS_PER_YEAR, monthly_rate};
use super::types::{CorpusHealth, Milestone, SipResult, SwpInputs, SwpResult, SwpYear};

/// Hard ceiling on simulated months (50 years).
pub const MAX_SIMULATION_MONTHS: u32 = 600;
/// Checkpoints kept on the result for display.
pub const MAX_REPORTED_YEARS: usize = 30;
/// Annual withdrawal rate considered sustainable (the 4 % rule).
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

const LOW_CORPUS_PERCENT: f64 = 25.0;
const CRITICAL_CORPUS_PERCENT: f64 = 10.0;
const MILESTONES: [(f64, &str); 3] = [
    (0.25, "25% Duration"),
    (0.5, "50% Duration"),
    (0.75, "75% Duration"),
];

/// Month-by-month state of a corpus under fixed withdrawals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawdown {
    pub corpus: f64,
    pub months: u32,
    pub total_withdrawn: f64,
}

impl Drawdown {
    pub fn new(corpus: f64) -> Self {
        Self {
            corpus,
            months: 0,
            total_withdrawn: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.corpus <= 0.0 || self.months >= MAX_SIMULATION_MONTHS
    }

    /// One month of growth followed by one withdrawal. A corpus that cannot
    /// cover the full withdrawal is paid out entirely.
    pub fn step(&mut self, rate: f64, withdrawal: f64) {
        self.corpus *= 1.0 + rate;
        if self.corpus >= withdrawal {
            self.corpus -= withdrawal;
            self.total_withdrawn += withdrawal;
        } else {
            self.total_withdrawn += self.corpus;
            self.corpus = 0.0;
        }
        self.months += 1;
    }

    fn at_year_boundary(&self) -> bool {
        self.months > 0 && self.months % 12 == 0
    }
}

pub fn sustainable_withdrawal(corpus: f64) -> f64 {
    corpus * SAFE_WITHDRAWAL_RATE / MONTHS_PER_YEAR
}

pub fn corpus_health(corpus_percentage: f64) -> CorpusHealth {
    if corpus_percentage < CRITICAL_CORPUS_PERCENT {
        CorpusHealth::Critical
    } else if corpus_percentage < LOW_CORPUS_PERCENT {
        CorpusHealth::Low
    } else {
        CorpusHealth::Healthy
    }
}

fn run_drawdown(inputs: &SwpInputs) -> Option<(Drawdown, Vec<SwpYear>)> {
    let valid = [
        inputs.total_investment,
        inputs.monthly_withdrawal,
        inputs.annual_return,
    ]
    .iter()
    .all(|v| v.is_finite() && *v > 0.0);
    if !valid {
        return None;
    }

    let rate = monthly_rate(inputs.annual_return);
    let mut state = Drawdown::new(inputs.total_investment);
    let mut checkpoints = Vec::new();

    while !state.is_finished() {
        state.step(rate, inputs.monthly_withdrawal);
        if state.at_year_boundary() {
            let corpus_percentage = state.corpus / inputs.total_investment * 100.0;
            checkpoints.push(SwpYear {
                year: state.months / 12,
                remaining_value: state.corpus,
                total_withdrawn: state.total_withdrawn,
                monthly_income: inputs.monthly_withdrawal,
                corpus_percentage,
                health: corpus_health(corpus_percentage),
            });
        }
    }
    Some((state, checkpoints))
}

/// Runs the withdrawal plan until the corpus is exhausted or the 50-year
/// ceiling is reached. Returns `None` unless every input is strictly
/// positive.
pub fn simulate_withdrawal(inputs: &SwpInputs) -> Option<SwpResult> {
    let (state, mut yearly_data) = run_drawdown(inputs)?;
    yearly_data.truncate(MAX_REPORTED_YEARS);

    let sustainable = sustainable_withdrawal(inputs.total_investment);
    Some(SwpResult {
        total_investment: inputs.total_investment,
        monthly_withdrawal: inputs.monthly_withdrawal,
        annual_return: inputs.annual_return,
        years_lasting: f64::from(state.months) / MONTHS_PER_YEAR,
        months_lasting: state.months,
        total_withdrawn: state.total_withdrawn,
        remaining_value: state.corpus,
        monthly_income_percentage: inputs.monthly_withdrawal / inputs.total_investment * 100.0,
        sustainable_withdrawal: sustainable,
        is_sustainable: inputs.monthly_withdrawal <= sustainable,
        yearly_data,
    })
}

/// Every year-end checkpoint of the plan, without the display cap applied
/// by [`simulate_withdrawal`].
pub fn withdrawal_schedule(inputs: &SwpInputs) -> Vec<SwpYear> {
    run_drawdown(inputs)
        .map(|(_, checkpoints)| checkpoints)
        .unwrap_or_default()
}

/// Withdrawal plan seeded from a SIP maturity value, drawing at the 4 % rule
/// rounded down to whole rupees.
pub fn suggest_from_sip(sip: &SipResult) -> SwpInputs {
    SwpInputs::new(
        sip.future_value,
        sustainable_withdrawal(sip.future_value).floor(),
        sip.annual_return,
    )
}

/// Corpus checkpoints at a quarter, half and three quarters of the time the
/// plan lasts. Marks that fall before the first year or past the reported
/// checkpoints are skipped.
pub fn milestones(result: &SwpResult) -> Vec<Milestone> {
    MILESTONES
        .iter()
        .filter_map(|&(fraction, label)| {
            let year = (result.years_lasting * fraction).floor() as u32;
            if year == 0 {
                return None;
            }
            result
                .yearly_data
                .iter()
                .find(|point| point.year == year)
                .map(|point| Milestone {
                    year,
                    label,
                    remaining: point.remaining_value,
                })
        })
        .collect()
}
