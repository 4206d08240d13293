mod annuity;
mod error;
mod series;
mod solver;
mod types;
mod validation;
mod withdrawal;

pub use annuity::{
    COMPARISON_RATES, DEFAULT_STEP_UP_PERCENT, MONTHS_PER_YEAR, annuity_due_value, calculate_sip,
    calculate_sip_at, future_value, inflation_adjusted, instrument_comparison, monthly_rate,
    required_monthly_contribution, return_scenarios, step_up, tax_adjusted,
};
pub use error::CalcError;
pub use series::yearly_series;
pub use solver::{DEFAULT_GOAL_RETURN_PERCENT, default_goals, plan_goals};
pub use types::{
    CorpusHealth, Goal, GoalPlan, GoalPriority, GoalProgress, InflationAdjusted,
    InstrumentProjection, Milestone, RateScenario, SipInputs, SipResult, StepUpResult, StepUpYear,
    SwpInputs, SwpResult, SwpYear, TaxAdjusted, YearlyPoint,
};
pub use validation::{
    Field, MAX_DURATION_YEARS, MAX_INVESTMENT_AMOUNT, MAX_RETURN_PERCENT, MIN_DURATION_YEARS,
    MIN_INVESTMENT_AMOUNT, MIN_RETURN_PERCENT, SIP_FIELDS, SWP_FIELDS, ValidationErrors,
    ValidationResult, validate_annual_return, validate_goal, validate_investment_amount,
    validate_percentage, validate_sip, validate_sip_duration, validate_swp,
};
pub use withdrawal::{
    Drawdown, MAX_REPORTED_YEARS, MAX_SIMULATION_MONTHS, SAFE_WITHDRAWAL_RATE, corpus_health,
    milestones, simulate_withdrawal, suggest_from_sip, sustainable_withdrawal, withdrawal_schedule,
};
