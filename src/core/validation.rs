use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::types::{SipInputs, SwpInputs};

pub const MIN_INVESTMENT_AMOUNT: f64 = 100.0;
pub const MAX_INVESTMENT_AMOUNT: f64 = 10_000_000.0;
pub const MIN_DURATION_YEARS: f64 = 1.0;
pub const MAX_DURATION_YEARS: f64 = 50.0;
pub const MIN_RETURN_PERCENT: f64 = 1.0;
pub const MAX_RETURN_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    InvestmentAmount,
    SipDuration,
    AnnualReturn,
    TotalInvestment,
    MonthlyWithdrawal,
    WithdrawalReturn,
    GoalName,
    GoalAmount,
    GoalYears,
    InflationRate,
    TaxRate,
    StepUpRate,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Field::InvestmentAmount => "investmentAmount",
            Field::SipDuration => "sipDuration",
            Field::AnnualReturn => "annualReturn",
            Field::TotalInvestment => "totalInvestment",
            Field::MonthlyWithdrawal => "monthlyWithdrawal",
            Field::WithdrawalReturn => "withdrawalReturn",
            Field::GoalName => "goalName",
            Field::GoalAmount => "goalAmount",
            Field::GoalYears => "goalYears",
            Field::InflationRate => "inflationRate",
            Field::TaxRate => "taxRate",
            Field::StepUpRate => "stepUpRate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    fn invalid(message: &str) -> Self {
        ValidationResult::Invalid(message.to_string())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Active field errors, keyed by field. Recording a valid result clears the
/// field's previous message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: Field, result: ValidationResult) {
        match result {
            ValidationResult::Valid => {
                self.0.remove(&field);
            }
            ValidationResult::Invalid(message) => {
                self.0.insert(field, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub fn any(&self, fields: &[Field]) -> bool {
        fields.iter().any(|field| self.0.contains_key(field))
    }

    /// Replaces the messages for `fields` with whatever `other` holds for them.
    pub fn replace_fields(&mut self, fields: &[Field], other: ValidationErrors) {
        for field in fields {
            self.0.remove(field);
        }
        self.0.extend(
            other
                .0
                .into_iter()
                .filter(|(field, _)| fields.contains(field)),
        );
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {message}", field.key())?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn bounded(
    value: f64,
    label: &str,
    (min, min_message): (f64, &str),
    (max, max_message): (f64, &str),
) -> ValidationResult {
    if !value.is_finite() {
        ValidationResult::Invalid(format!("{label} must be a number"))
    } else if value <= 0.0 {
        ValidationResult::Invalid(format!("{label} must be greater than 0"))
    } else if value > max {
        ValidationResult::invalid(max_message)
    } else if value < min {
        ValidationResult::invalid(min_message)
    } else {
        ValidationResult::Valid
    }
}

fn positive(value: f64, label: &str) -> ValidationResult {
    if !value.is_finite() {
        ValidationResult::Invalid(format!("{label} must be a number"))
    } else if value <= 0.0 {
        ValidationResult::Invalid(format!("{label} must be greater than 0"))
    } else {
        ValidationResult::Valid
    }
}

pub fn validate_investment_amount(value: f64) -> ValidationResult {
    bounded(
        value,
        "Investment amount",
        (MIN_INVESTMENT_AMOUNT, "Minimum investment amount is ₹100"),
        (
            MAX_INVESTMENT_AMOUNT,
            "Investment amount cannot exceed 1 Crore",
        ),
    )
}

pub fn validate_sip_duration(value: f64) -> ValidationResult {
    bounded(
        value,
        "Duration",
        (MIN_DURATION_YEARS, "Minimum duration is 1 year"),
        (MAX_DURATION_YEARS, "Maximum duration is 50 years"),
    )
}

pub fn validate_annual_return(value: f64) -> ValidationResult {
    bounded(
        value,
        "Return rate",
        (MIN_RETURN_PERCENT, "Minimum return rate is 1%"),
        (MAX_RETURN_PERCENT, "Maximum return rate is 50%"),
    )
}

pub const SIP_FIELDS: [Field; 3] = [Field::InvestmentAmount, Field::SipDuration, Field::AnnualReturn];
pub const SWP_FIELDS: [Field; 3] = [
    Field::TotalInvestment,
    Field::MonthlyWithdrawal,
    Field::WithdrawalReturn,
];

pub fn validate_sip(inputs: &SipInputs) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.record(
        Field::InvestmentAmount,
        validate_investment_amount(inputs.investment_amount),
    );
    errors.record(Field::SipDuration, validate_sip_duration(inputs.sip_duration));
    errors.record(Field::AnnualReturn, validate_annual_return(inputs.annual_return));
    errors
}

pub fn validate_swp(inputs: &SwpInputs) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.record(
        Field::TotalInvestment,
        positive(inputs.total_investment, "Corpus"),
    );
    errors.record(
        Field::MonthlyWithdrawal,
        positive(inputs.monthly_withdrawal, "Monthly withdrawal"),
    );
    errors.record(
        Field::WithdrawalReturn,
        positive(inputs.annual_return, "Return rate"),
    );
    errors
}

pub fn validate_goal(name: &str, amount: f64, years: f64) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let name_result = if name.trim().is_empty() {
        ValidationResult::invalid("Goal name is required")
    } else {
        ValidationResult::Valid
    };
    errors.record(Field::GoalName, name_result);
    errors.record(Field::GoalAmount, positive(amount, "Goal amount"));
    errors.record(Field::GoalYears, positive(years, "Goal horizon"));
    errors
}

/// Rates such as inflation, tax and step-up must sit within 0..=100 %.
pub fn validate_percentage(value: f64, label: &str) -> ValidationResult {
    if !value.is_finite() {
        ValidationResult::Invalid(format!("{label} must be a number"))
    } else if !(0.0..=100.0).contains(&value) {
        ValidationResult::Invalid(format!("{label} must be between 0 and 100"))
    } else {
        ValidationResult::Valid
    }
}
