//! Presentation-only ratios re-derived from finished results.

use serde::Serialize;

use super::format::format_rs;
use crate::core::{SipResult, SwpResult};

const DAYS_PER_MONTH: f64 = 30.0;

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipInsights {
    /// Years for money to double at the annual rate; `None` at zero rate.
    pub doubling_years: Option<f64>,
    pub total_return_percent: f64,
    pub monthly_return_multiplier: f64,
    pub average_yearly_growth: f64,
    pub yearly_investment: f64,
    pub average_monthly_return: f64,
    pub wealth_multiplier: f64,
}

pub fn sip_insights(sip: &SipResult) -> SipInsights {
    let doubling_years = (sip.annual_return > 0.0)
        .then(|| std::f64::consts::LN_2 / (sip.annual_return / 100.0).ln_1p());
    let principal = sip.investment_amount * 12.0 * sip.sip_duration;
    SipInsights {
        doubling_years,
        total_return_percent: ratio(sip.total_gains, sip.total_investment) * 100.0,
        monthly_return_multiplier: if principal > 0.0 {
            sip.future_value / principal - 1.0
        } else {
            0.0
        },
        average_yearly_growth: ratio(sip.total_gains, sip.sip_duration),
        yearly_investment: sip.investment_amount * 12.0,
        average_monthly_return: ratio(sip.total_gains, sip.sip_duration * 12.0),
        wealth_multiplier: ratio(sip.future_value, sip.total_investment),
    }
}

impl SipInsights {
    pub fn lines(&self) -> Vec<String> {
        let doubling = self
            .doubling_years
            .map(|years| format!("{years:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        vec![
            format!("Investment doubles in approximately {doubling} years"),
            format!("Total return percentage: {:.1}%", self.total_return_percent),
            format!(
                "Monthly return multiplier: {:.2}x",
                self.monthly_return_multiplier
            ),
            format!(
                "Average yearly wealth growth: {}",
                format_rs(self.average_yearly_growth)
            ),
            format!(
                "Yearly investment amount: {}",
                format_rs(self.yearly_investment)
            ),
            format!(
                "Average monthly returns: {}",
                format_rs(self.average_monthly_return)
            ),
            format!(
                "Wealth multiplier at maturity: {:.2}x",
                self.wealth_multiplier
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpInsights {
    pub monthly_income: f64,
    pub yearly_income: f64,
    /// Yearly withdrawals as a percentage of the starting corpus.
    pub withdrawal_rate: f64,
    pub monthly_withdrawal_percent: f64,
    pub total_income: f64,
    pub corpus_preservation: f64,
    pub total_months: u32,
    pub average_monthly_reduction: f64,
    pub income_to_corpus_percent: f64,
    pub is_sustainable: bool,
}

pub fn swp_insights(swp: &SwpResult) -> SwpInsights {
    let corpus = swp.total_investment;
    let yearly_income = swp.monthly_withdrawal * 12.0;
    let total_months = swp.months_lasting;
    SwpInsights {
        monthly_income: swp.monthly_withdrawal,
        yearly_income,
        withdrawal_rate: ratio(yearly_income, corpus) * 100.0,
        monthly_withdrawal_percent: ratio(swp.monthly_withdrawal, corpus) * 100.0,
        total_income: swp.total_withdrawn,
        corpus_preservation: ratio(swp.remaining_value, corpus) * 100.0,
        total_months,
        average_monthly_reduction: ratio(corpus - swp.remaining_value, f64::from(total_months)),
        income_to_corpus_percent: ratio(swp.total_withdrawn, corpus) * 100.0,
        is_sustainable: swp.is_sustainable,
    }
}

impl SwpInsights {
    pub fn sustainability_text(&self) -> &'static str {
        if self.is_sustainable {
            "Your corpus can sustain this withdrawal plan"
        } else {
            "Consider reducing withdrawal amount"
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Monthly Income: {}", format_rs(self.monthly_income)),
            format!("Yearly Income: {}", format_rs(self.yearly_income)),
            format!("Annual Withdrawal Rate: {:.2}%", self.withdrawal_rate),
            format!(
                "Monthly Return Needed: {:.3}%",
                self.monthly_withdrawal_percent
            ),
            format!("Total Income Generated: {}", format_rs(self.total_income)),
            format!("Corpus Preservation: {:.1}%", self.corpus_preservation),
            format!("Total withdrawal months: {} months", self.total_months),
            format!(
                "Average monthly corpus reduction: {}",
                format_rs(self.average_monthly_reduction)
            ),
            format!(
                "Income vs corpus ratio: {:.1}%",
                self.income_to_corpus_percent
            ),
            format!("Sustainability: {}", self.sustainability_text()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalTimeline {
    pub years: u32,
    pub months: u32,
    pub total_months: u32,
    pub daily_income: f64,
    pub weekly_income: f64,
    pub quarterly_income: f64,
}

pub fn withdrawal_timeline(swp: &SwpResult) -> WithdrawalTimeline {
    let daily_income = swp.monthly_withdrawal / DAYS_PER_MONTH;
    WithdrawalTimeline {
        years: swp.months_lasting / 12,
        months: swp.months_lasting % 12,
        total_months: swp.months_lasting,
        daily_income,
        weekly_income: daily_income * 7.0,
        quarterly_income: swp.monthly_withdrawal * 3.0,
    }
}

impl WithdrawalTimeline {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "Total Withdrawal Period: {} years and {} months",
                self.years, self.months
            ),
            format!("Total Months of Income: {} months", self.total_months),
            format!("Daily Income: {}", format_rs(self.daily_income)),
            format!("Weekly Income: {}", format_rs(self.weekly_income)),
            format!("Quarterly Income: {}", format_rs(self.quarterly_income)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyInsights {
    pub sip_years: f64,
    pub swp_years: f64,
    pub journey_years: f64,
    pub total_invested: f64,
    /// SIP gains plus everything withdrawn plus what is left at the end.
    pub total_wealth_created: f64,
    pub overall_return_percent: f64,
    pub wealth_multiplier: f64,
    pub net_gain: f64,
    pub efficiency_percent: f64,
    pub final_legacy: f64,
    pub yearly_investment: f64,
    pub yearly_withdrawal: f64,
    pub cash_flow_ratio: f64,
    pub daily_investment: f64,
    pub daily_withdrawal: f64,
    pub weekly_investment: f64,
    pub weekly_withdrawal: f64,
    pub investment_months: f64,
    pub withdrawal_months: u32,
}

pub fn journey_insights(sip: &SipResult, swp: &SwpResult) -> JourneyInsights {
    let total_wealth_created = sip.total_gains + swp.total_withdrawn + swp.remaining_value;
    let net_gain = total_wealth_created - sip.total_investment;
    let daily_investment = sip.investment_amount / DAYS_PER_MONTH;
    let daily_withdrawal = swp.monthly_withdrawal / DAYS_PER_MONTH;
    JourneyInsights {
        sip_years: sip.sip_duration,
        swp_years: swp.years_lasting,
        journey_years: sip.sip_duration + swp.years_lasting,
        total_invested: sip.total_investment,
        total_wealth_created,
        overall_return_percent: ratio(total_wealth_created, sip.total_investment) * 100.0,
        wealth_multiplier: ratio(total_wealth_created, sip.total_investment),
        net_gain,
        efficiency_percent: ratio(net_gain, sip.total_investment) * 100.0,
        final_legacy: swp.remaining_value,
        yearly_investment: sip.investment_amount * 12.0,
        yearly_withdrawal: swp.monthly_withdrawal * 12.0,
        cash_flow_ratio: ratio(swp.monthly_withdrawal, sip.investment_amount),
        daily_investment,
        daily_withdrawal,
        weekly_investment: daily_investment * 7.0,
        weekly_withdrawal: daily_withdrawal * 7.0,
        investment_months: sip.sip_duration * 12.0,
        withdrawal_months: swp.months_lasting,
    }
}

impl JourneyInsights {
    pub fn journey_lines(&self) -> Vec<String> {
        vec![
            format!("Total Investment Journey: {:.1} years", self.journey_years),
            format!(
                "SIP Phase Duration: {} years ({:.0} months)",
                self.sip_years, self.investment_months
            ),
            format!(
                "SWP Phase Duration: {:.1} years ({} months)",
                self.swp_years, self.withdrawal_months
            ),
            format!("Total Amount Invested: {}", format_rs(self.total_invested)),
            format!(
                "Total Wealth Created: {}",
                format_rs(self.total_wealth_created)
            ),
            format!(
                "Overall Return Percentage: {:.1}%",
                self.overall_return_percent
            ),
            format!("Wealth Multiplier: {:.2}x", self.wealth_multiplier),
            format!("Net Wealth Gain: {}", format_rs(self.net_gain)),
            format!("Investment Efficiency: {:.1}%", self.efficiency_percent),
            format!("Final Legacy Value: {}", format_rs(self.final_legacy)),
            format!(
                "Yearly Investment Amount: {}",
                format_rs(self.yearly_investment)
            ),
            format!(
                "Yearly Withdrawal Amount: {}",
                format_rs(self.yearly_withdrawal)
            ),
        ]
    }

    pub fn cash_flow_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Cash Flow Ratio: {:.2}x (Withdrawal vs Investment)",
                self.cash_flow_ratio
            ),
            format!("Daily Investment: {}", format_rs(self.daily_investment)),
            format!("Daily Withdrawal: {}", format_rs(self.daily_withdrawal)),
            format!("Weekly Investment: {}", format_rs(self.weekly_investment)),
            format!("Weekly Withdrawal: {}", format_rs(self.weekly_withdrawal)),
            format!(
                "Total Months of Investment: {:.0} months",
                self.investment_months
            ),
            format!(
                "Total Months of Withdrawal: {} months",
                self.withdrawal_months
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SipInputs, SwpInputs, calculate_sip, simulate_withdrawal};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn sip_doubling_time_uses_log_rule() {
        let sip = calculate_sip(&SipInputs::new(5_000.0, 15.0, 12.0)).expect("valid");
        let insights = sip_insights(&sip);
        let doubling = insights.doubling_years.expect("positive rate");
        assert_approx_tol(doubling, 2f64.ln() / 1.12f64.ln(), 1e-12);
        assert_approx_tol(insights.yearly_investment, 60_000.0, 1e-12);
        assert_approx_tol(insights.wealth_multiplier, sip.wealth_multiplier, 1e-12);
        assert_approx_tol(
            insights.total_return_percent,
            sip.total_gains / 900_000.0 * 100.0,
            1e-9,
        );
        assert_approx_tol(insights.monthly_return_multiplier, sip.wealth_multiplier - 1.0, 1e-12);
        assert!(insights.lines()[0].contains("6.1 years"));
    }

    #[test]
    fn zero_rate_has_no_doubling_time() {
        let sip = calculate_sip(&SipInputs::new(1_000.0, 2.0, 0.0)).expect("valid");
        let insights = sip_insights(&sip);
        assert_eq!(insights.doubling_years, None);
        assert!(insights.lines()[0].contains("n/a"));
    }

    #[test]
    fn swp_rates_and_timeline() {
        let swp = simulate_withdrawal(&SwpInputs::new(1_000_000.0, 15_000.0, 12.0))
            .expect("valid");
        let insights = swp_insights(&swp);
        assert_approx_tol(insights.withdrawal_rate, 18.0, 1e-12);
        assert_approx_tol(insights.monthly_withdrawal_percent, 1.5, 1e-12);
        assert_approx_tol(insights.corpus_preservation, 0.0, 1e-12);
        assert_eq!(insights.total_months, 111);
        assert_eq!(
            insights.sustainability_text(),
            "Consider reducing withdrawal amount"
        );

        let timeline = withdrawal_timeline(&swp);
        assert_eq!((timeline.years, timeline.months), (9, 3));
        assert_approx_tol(timeline.daily_income, 500.0, 1e-12);
        assert_approx_tol(timeline.weekly_income, 3_500.0, 1e-12);
        assert_approx_tol(timeline.quarterly_income, 45_000.0, 1e-12);
    }

    #[test]
    fn journey_totals_combine_both_phases() {
        let sip = calculate_sip(&SipInputs::new(5_000.0, 15.0, 12.0)).expect("valid");
        let swp = simulate_withdrawal(&SwpInputs::new(sip.future_value, 20_000.0, 12.0))
            .expect("valid");
        let journey = journey_insights(&sip, &swp);

        assert_approx_tol(
            journey.total_wealth_created,
            sip.total_gains + swp.total_withdrawn + swp.remaining_value,
            1e-6,
        );
        assert_approx_tol(journey.journey_years, 15.0 + swp.years_lasting, 1e-12);
        assert_approx_tol(journey.cash_flow_ratio, 4.0, 1e-12);
        assert_approx_tol(journey.net_gain, journey.total_wealth_created - 900_000.0, 1e-6);
        assert_eq!(journey.journey_lines().len(), 12);
    }
}
