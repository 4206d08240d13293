use chrono::{DateTime, Utc};

use super::error::CalcError;
use super::series::{whole_years, yearly_series};
use super::types::{
    InflationAdjusted, InstrumentProjection, RateScenario, SipInputs, SipResult, StepUpResult,
    StepUpYear, TaxAdjusted,
};

pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const DEFAULT_STEP_UP_PERCENT: f64 = 10.0;
pub const COMPARISON_RATES: [f64; 5] = [8.0, 10.0, 12.0, 15.0, 18.0];

const ZERO_RATE_EPS: f64 = 1e-12;

struct Instrument {
    name: &'static str,
    annual_return: f64,
    risk: &'static str,
    liquidity: &'static str,
}

const INSTRUMENTS: [Instrument; 4] = [
    Instrument {
        name: "Bank FD",
        annual_return: 6.5,
        risk: "Low",
        liquidity: "Medium",
    },
    Instrument {
        name: "Debt Funds",
        annual_return: 8.0,
        risk: "Low-Medium",
        liquidity: "High",
    },
    Instrument {
        name: "Hybrid Funds",
        annual_return: 10.0,
        risk: "Medium",
        liquidity: "High",
    },
    Instrument {
        name: "Equity Funds",
        annual_return: 12.0,
        risk: "High",
        liquidity: "High",
    },
];

pub fn monthly_rate(annual_percent: f64) -> f64 {
    annual_percent / 100.0 / MONTHS_PER_YEAR
}

/// Value after `months` of a contribution paid at the start of every month
/// and compounded monthly at `rate`.
///
/// ```text
/// FV = P * ((1 + r)^n - 1) / r * (1 + r)
/// ```
///
/// A zero rate degenerates to `P * n`. Non-positive month counts yield zero.
pub fn annuity_due_value(amount: f64, rate: f64, months: f64) -> f64 {
    if months <= 0.0 {
        return 0.0;
    }
    if rate.abs() < ZERO_RATE_EPS {
        return amount * months;
    }
    amount * (((1.0 + rate).powf(months) - 1.0) / rate) * (1.0 + rate)
}

pub fn future_value(amount: f64, annual_percent: f64, years: f64) -> Result<f64, CalcError> {
    check_sip_inputs(&SipInputs::new(amount, years, annual_percent))?;
    Ok(annuity_due_value(
        amount,
        monthly_rate(annual_percent),
        years * MONTHS_PER_YEAR,
    ))
}

pub fn calculate_sip(inputs: &SipInputs) -> Result<SipResult, CalcError> {
    calculate_sip_at(inputs, Utc::now())
}

pub fn calculate_sip_at(inputs: &SipInputs, now: DateTime<Utc>) -> Result<SipResult, CalcError> {
    let future_value = future_value(
        inputs.investment_amount,
        inputs.annual_return,
        inputs.sip_duration,
    )?;
    let total_investment = inputs.investment_amount * inputs.total_months();
    let total_gains = future_value - total_investment;

    Ok(SipResult {
        investment_amount: inputs.investment_amount,
        sip_duration: inputs.sip_duration,
        annual_return: inputs.annual_return,
        future_value,
        total_investment,
        total_gains,
        wealth_multiplier: future_value / total_investment,
        monthly_return: monthly_rate(inputs.annual_return) * 100.0,
        yearly_data: yearly_series(
            inputs.investment_amount,
            inputs.annual_return,
            inputs.sip_duration,
        ),
        calculated_at: now,
        id: now.timestamp_millis(),
    })
}

/// Compares the nominal projection with one grown at the inflation-adjusted
/// (Fisher) real rate.
pub fn inflation_adjusted(
    inputs: &SipInputs,
    inflation_percent: f64,
) -> Result<InflationAdjusted, CalcError> {
    check_sip_inputs(inputs)?;
    if !inflation_percent.is_finite() || inflation_percent <= -100.0 {
        return Err(CalcError::invalid("inflationRate", "must be > -100"));
    }

    let real_return_rate =
        ((1.0 + inputs.annual_return / 100.0) / (1.0 + inflation_percent / 100.0) - 1.0) * 100.0;
    let months = inputs.total_months();
    let real_value = annuity_due_value(
        inputs.investment_amount,
        monthly_rate(real_return_rate),
        months,
    );
    let nominal_value = annuity_due_value(
        inputs.investment_amount,
        monthly_rate(inputs.annual_return),
        months,
    );

    Ok(InflationAdjusted {
        inflation_rate: inflation_percent,
        real_return_rate,
        real_value,
        nominal_value,
        inflation_impact: nominal_value - real_value,
    })
}

/// Applies a flat tax on gains at maturity.
pub fn tax_adjusted(inputs: &SipInputs, tax_percent: f64) -> Result<TaxAdjusted, CalcError> {
    check_sip_inputs(inputs)?;
    if !(0.0..=100.0).contains(&tax_percent) {
        return Err(CalcError::invalid("taxRate", "must be between 0 and 100"));
    }

    let total_investment = inputs.investment_amount * inputs.total_months();
    let gross_returns = annuity_due_value(
        inputs.investment_amount,
        monthly_rate(inputs.annual_return),
        inputs.total_months(),
    );
    let gains = gross_returns - total_investment;
    let tax_on_gains = gains * tax_percent / 100.0;
    let net_returns = gross_returns - tax_on_gains;
    let effective_rate = if total_investment > 0.0 {
        ((net_returns / total_investment).powf(1.0 / inputs.sip_duration) - 1.0) * 100.0
    } else {
        0.0
    };

    Ok(TaxAdjusted {
        tax_rate: tax_percent,
        gross_returns,
        total_investment,
        gains,
        tax_on_gains,
        net_returns,
        effective_rate,
    })
}

/// Projects a SIP whose monthly contribution grows by `step_up_percent` every
/// year.
///
/// Each year is valued as a 12-month annuity-due block at that year's
/// contribution; the running total is carried forward by one year of monthly
/// compounding before the next block is added. Contributions do not step up
/// inside a year. Leftover months of a fractional duration are valued as one
/// shorter block rather than dropped, so the result never falls below the
/// level SIP over the same months.
pub fn step_up(inputs: &SipInputs, step_up_percent: f64) -> Result<StepUpResult, CalcError> {
    check_sip_inputs(inputs)?;
    if !step_up_percent.is_finite() || step_up_percent < 0.0 {
        return Err(CalcError::invalid("stepUpRate", "must be >= 0"));
    }

    let rate = monthly_rate(inputs.annual_return);
    let year_growth = (1.0 + rate).powf(MONTHS_PER_YEAR);
    let full_years = whole_years(inputs.sip_duration);
    let trailing_months = inputs.total_months() - f64::from(full_years) * MONTHS_PER_YEAR;

    let mut schedule = Vec::with_capacity(full_years as usize + 1);
    let mut total_value = 0.0;
    let mut current_sip = inputs.investment_amount;

    for year in 1..=full_years {
        let year_value = annuity_due_value(current_sip, rate, MONTHS_PER_YEAR);
        total_value = total_value * year_growth + year_value;
        schedule.push(StepUpYear {
            year,
            monthly_contribution: current_sip,
            value_at_year_end: total_value,
        });
        current_sip *= 1.0 + step_up_percent / 100.0;
    }

    if trailing_months > 1e-9 {
        let block = annuity_due_value(current_sip, rate, trailing_months);
        total_value = total_value * (1.0 + rate).powf(trailing_months) + block;
        schedule.push(StepUpYear {
            year: full_years + 1,
            monthly_contribution: current_sip,
            value_at_year_end: total_value,
        });
    }

    let regular_value = annuity_due_value(inputs.investment_amount, rate, inputs.total_months());

    Ok(StepUpResult {
        step_up_rate: step_up_percent,
        step_up_value: total_value,
        regular_value,
        additional_benefit: total_value - regular_value,
        schedule,
    })
}

/// Monthly contribution needed to reach `target` after `years`.
///
/// Uses the end-of-month annuity inversion `target * r / ((1 + r)^n - 1)`,
/// so feeding the answer back through [`future_value`] lands one period of
/// growth above the target. Non-positive targets or horizons need nothing.
pub fn required_monthly_contribution(target: f64, years: f64, annual_percent: f64) -> f64 {
    if !(target > 0.0) || !(years > 0.0) || !annual_percent.is_finite() {
        return 0.0;
    }

    let rate = monthly_rate(annual_percent);
    let months = years * MONTHS_PER_YEAR;
    if rate.abs() < ZERO_RATE_EPS {
        return target / months;
    }

    let required = target * rate / ((1.0 + rate).powf(months) - 1.0);
    required.max(0.0)
}

pub fn return_scenarios(inputs: &SipInputs) -> Result<Vec<RateScenario>, CalcError> {
    check_sip_inputs(inputs)?;
    Ok(COMPARISON_RATES
        .iter()
        .map(|&annual_return| RateScenario {
            annual_return,
            future_value: annuity_due_value(
                inputs.investment_amount,
                monthly_rate(annual_return),
                inputs.total_months(),
            ),
            is_selected: (annual_return - inputs.annual_return).abs() < 1e-9,
        })
        .collect())
}

pub fn instrument_comparison(inputs: &SipInputs) -> Result<Vec<InstrumentProjection>, CalcError> {
    check_sip_inputs(inputs)?;
    Ok(INSTRUMENTS
        .iter()
        .map(|instrument| InstrumentProjection {
            name: instrument.name,
            annual_return: instrument.annual_return,
            risk: instrument.risk,
            liquidity: instrument.liquidity,
            future_value: annuity_due_value(
                inputs.investment_amount,
                monthly_rate(instrument.annual_return),
                inputs.total_months(),
            ),
        })
        .collect())
}

fn check_sip_inputs(inputs: &SipInputs) -> Result<(), CalcError> {
    if !inputs.investment_amount.is_finite() || inputs.investment_amount <= 0.0 {
        return Err(CalcError::invalid("investmentAmount", "must be > 0"));
    }
    if !inputs.sip_duration.is_finite() || inputs.sip_duration <= 0.0 {
        return Err(CalcError::invalid("sipDuration", "must be > 0"));
    }
    if !inputs.annual_return.is_finite() || inputs.annual_return < 0.0 {
        return Err(CalcError::invalid("annualReturn", "must be >= 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> SipInputs {
        SipInputs::new(5_000.0, 15.0, 12.0)
    }

    #[test]
    fn reference_sip_matches_closed_form() {
        let result = calculate_sip(&sample_inputs()).expect("valid inputs");

        let expected = 5_000.0 * ((1.01_f64.powi(180) - 1.0) / 0.01) * 1.01;
        assert_approx_tol(result.future_value, expected, 1.0);
        assert_approx_tol(result.future_value, 2_522_880.0, 50.0);
        assert_approx_tol(result.total_investment, 900_000.0, 1e-9);
        assert_approx_tol(result.total_gains, expected - 900_000.0, 1.0);
        assert_approx_tol(result.monthly_return, 1.0, 1e-12);
        assert_eq!(result.yearly_data.len(), 15);
    }

    #[test]
    fn zero_rate_accumulates_linearly() {
        let value = future_value(1_000.0, 0.0, 10.0).expect("zero rate is valid");
        assert_approx_tol(value, 120_000.0, 1e-9);
        assert_approx_tol(annuity_due_value(250.0, 0.0, 4.0), 1_000.0, 1e-12);
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        assert!(future_value(0.0, 12.0, 10.0).is_err());
        assert!(future_value(1_000.0, 12.0, 0.0).is_err());
        assert!(future_value(1_000.0, -1.0, 10.0).is_err());
        assert!(future_value(f64::NAN, 12.0, 10.0).is_err());

        let err = future_value(1_000.0, 12.0, -2.0).expect_err("negative duration");
        assert_eq!(
            err,
            CalcError::InvalidInput {
                field: "sipDuration",
                reason: "must be > 0"
            }
        );
    }

    #[test]
    fn kernel_guards_negative_month_counts() {
        assert_eq!(annuity_due_value(1_000.0, 0.01, -12.0), 0.0);
        assert_eq!(annuity_due_value(1_000.0, 0.01, 0.0), 0.0);
    }

    #[test]
    fn result_id_and_timestamp_come_from_creation_time() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let result = calculate_sip_at(&sample_inputs(), now).expect("valid inputs");
        assert_eq!(result.calculated_at, now);
        assert_eq!(result.id, now.timestamp_millis());
    }

    #[test]
    fn inflation_shrinks_real_value() {
        let adjusted = inflation_adjusted(&sample_inputs(), 6.0).expect("valid");
        let expected_real = ((1.12 / 1.06) - 1.0) * 100.0;
        assert_approx_tol(adjusted.real_return_rate, expected_real, 1e-9);
        assert!(adjusted.real_value < adjusted.nominal_value);
        assert_approx_tol(
            adjusted.inflation_impact,
            adjusted.nominal_value - adjusted.real_value,
            1e-9,
        );

        let fv = future_value(5_000.0, 12.0, 15.0).expect("valid");
        assert_approx_tol(adjusted.nominal_value, fv, 1e-6);
    }

    #[test]
    fn matching_inflation_leaves_only_principal_in_real_terms() {
        let adjusted = inflation_adjusted(&sample_inputs(), 12.0).expect("valid");
        assert_approx_tol(adjusted.real_return_rate, 0.0, 1e-12);
        assert_approx_tol(adjusted.real_value, 900_000.0, 1e-6);
    }

    #[test]
    fn zero_inflation_has_no_impact() {
        let adjusted = inflation_adjusted(&sample_inputs(), 0.0).expect("valid");
        assert_approx_tol(adjusted.inflation_impact, 0.0, 1e-6);
    }

    #[test]
    fn tax_only_touches_gains() {
        let inputs = sample_inputs();
        let taxed = tax_adjusted(&inputs, 20.0).expect("valid");
        assert_approx_tol(taxed.tax_on_gains, taxed.gains * 0.2, 1e-6);
        assert_approx_tol(taxed.net_returns, taxed.gross_returns - taxed.tax_on_gains, 1e-6);

        let expected_effective =
            ((taxed.net_returns / taxed.total_investment).powf(1.0 / 15.0) - 1.0) * 100.0;
        assert_approx_tol(taxed.effective_rate, expected_effective, 1e-9);

        let untaxed = tax_adjusted(&inputs, 0.0).expect("valid");
        assert_approx_tol(untaxed.net_returns, untaxed.gross_returns, 1e-9);

        let confiscated = tax_adjusted(&inputs, 100.0).expect("valid");
        assert_approx_tol(confiscated.net_returns, confiscated.total_investment, 1e-6);
        assert_approx_tol(confiscated.effective_rate, 0.0, 1e-9);

        assert!(tax_adjusted(&inputs, 120.0).is_err());
    }

    #[test]
    fn step_up_hand_calculation_for_two_years() {
        let inputs = SipInputs::new(1_000.0, 2.0, 12.0);
        let result = step_up(&inputs, 10.0).expect("valid");

        let block = ((1.01_f64.powi(12) - 1.0) / 0.01) * 1.01;
        let expected = 1_000.0 * block * 1.01_f64.powi(12) + 1_100.0 * block;
        assert_approx_tol(result.step_up_value, expected, 1e-6);
        assert_eq!(result.schedule.len(), 2);
        assert_approx_tol(result.schedule[1].monthly_contribution, 1_100.0, 1e-9);
        assert_approx_tol(
            result.additional_benefit,
            result.step_up_value - result.regular_value,
            1e-9,
        );
    }

    #[test]
    fn zero_step_up_matches_plain_sip() {
        let result = step_up(&sample_inputs(), 0.0).expect("valid");
        assert_approx_tol(result.step_up_value, result.regular_value, 1e-4);
    }

    #[test]
    fn fractional_duration_adds_trailing_block() {
        let inputs = SipInputs::new(1_000.0, 2.5, 12.0);
        let result = step_up(&inputs, 0.0).expect("valid");
        assert_eq!(result.schedule.len(), 3);
        assert_approx_tol(result.step_up_value, result.regular_value, 1e-4);
    }

    #[test]
    fn required_sip_handles_edges() {
        assert_eq!(required_monthly_contribution(0.0, 10.0, 12.0), 0.0);
        assert_eq!(required_monthly_contribution(100_000.0, 0.0, 12.0), 0.0);
        assert_approx_tol(
            required_monthly_contribution(120_000.0, 10.0, 0.0),
            1_000.0,
            1e-9,
        );
    }

    #[test]
    fn return_scenarios_flag_selected_rate() {
        let scenarios = return_scenarios(&sample_inputs()).expect("valid");
        assert_eq!(scenarios.len(), COMPARISON_RATES.len());
        let selected: Vec<_> = scenarios.iter().filter(|s| s.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_approx_tol(selected[0].annual_return, 12.0, 1e-12);
        assert!(scenarios.windows(2).all(|w| w[0].future_value < w[1].future_value));
    }

    #[test]
    fn instrument_comparison_orders_by_return() {
        let projections = instrument_comparison(&sample_inputs()).expect("valid");
        assert_eq!(projections.len(), 4);
        assert_eq!(projections[0].name, "Bank FD");
        assert!(
            projections
                .windows(2)
                .all(|w| w[0].future_value < w[1].future_value)
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_future_value_exceeds_principal_when_rate_positive(
            amount in 100u32..10_000_000,
            years in 1u32..=50,
            rate_bp in 100u32..=5_000
        ) {
            let amount = amount as f64;
            let years = years as f64;
            let rate = rate_bp as f64 / 100.0;
            let principal = amount * years * 12.0;

            let fv = future_value(amount, rate, years).expect("valid");
            prop_assert!(fv > principal);

            let flat = future_value(amount, 0.0, years).expect("valid");
            prop_assert!((flat - principal).abs() <= principal * 1e-12);
        }

        #[test]
        fn prop_gains_and_multiplier_are_consistent(
            amount in 100u32..10_000_000,
            years in 1u32..=50,
            rate_bp in 100u32..=5_000
        ) {
            let inputs = SipInputs::new(amount as f64, years as f64, rate_bp as f64 / 100.0);
            let result = calculate_sip(&inputs).expect("valid");
            let principal = inputs.investment_amount * inputs.total_months();

            prop_assert!((result.total_investment - principal).abs() <= principal * 1e-12);
            prop_assert!((result.total_gains - (result.future_value - principal)).abs()
                <= result.future_value * 1e-12);
            prop_assert!((result.wealth_multiplier - result.future_value / principal).abs() <= 1e-12);
        }

        #[test]
        fn prop_step_up_never_loses_to_regular_sip(
            amount in 100u32..1_000_000,
            years in 1u32..=50,
            rate_bp in 100u32..=5_000,
            step_bp in 0u32..=5_000
        ) {
            let inputs = SipInputs::new(amount as f64, years as f64, rate_bp as f64 / 100.0);
            let result = step_up(&inputs, step_bp as f64 / 100.0).expect("valid");
            prop_assert!(result.step_up_value >= result.regular_value * (1.0 - 1e-9));
        }

        #[test]
        fn prop_required_sip_inverts_future_value_up_to_one_period(
            target in 10_000u32..100_000_000,
            years in 1u32..=50,
            rate_bp in 100u32..=5_000
        ) {
            let target = target as f64;
            let years = years as f64;
            let annual = rate_bp as f64 / 100.0;
            let rate = monthly_rate(annual);

            let required = required_monthly_contribution(target, years, annual);
            prop_assert!(required > 0.0);

            let reached = future_value(required, annual, years).expect("valid");
            let relative = reached / target - 1.0;
            prop_assert!((relative - rate).abs() <= 1e-6);
            prop_assert!(relative <= monthly_rate(50.0) + 1e-6);
        }
    }
}
