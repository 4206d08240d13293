use super::annuity::{MONTHS_PER_YEAR, annuity_due_value, monthly_rate};
use super::types::YearlyPoint;

pub(crate) fn whole_years(years: f64) -> u32 {
    if years.is_finite() && years > 0.0 {
        years.floor() as u32
    } else {
        0
    }
}

/// Year-end snapshots of a SIP, one per completed year.
///
/// Every point is evaluated directly from the closed form at `year * 12`
/// months, so no error accumulates across years.
pub fn yearly_series(monthly_amount: f64, annual_percent: f64, years: f64) -> Vec<YearlyPoint> {
    let rate = monthly_rate(annual_percent);
    (1..=whole_years(years))
        .map(|year| {
            let months = f64::from(year) * MONTHS_PER_YEAR;
            let investment = monthly_amount * months;
            let value = annuity_due_value(monthly_amount, rate, months);
            YearlyPoint {
                year,
                investment,
                value,
                returns: value - investment,
            }
        })
        .collect()
}
