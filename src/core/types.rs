use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monthly SIP parameters. Rates are annual percentages (12.0 means 12 %).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipInputs {
    pub investment_amount: f64,
    pub sip_duration: f64,
    pub annual_return: f64,
}

impl SipInputs {
    pub fn new(investment_amount: f64, sip_duration: f64, annual_return: f64) -> Self {
        Self {
            investment_amount,
            sip_duration,
            annual_return,
        }
    }

    pub fn total_months(&self) -> f64 {
        self.sip_duration * 12.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyPoint {
    pub year: u32,
    pub investment: f64,
    pub value: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResult {
    pub investment_amount: f64,
    pub sip_duration: f64,
    pub annual_return: f64,
    pub future_value: f64,
    pub total_investment: f64,
    pub total_gains: f64,
    pub wealth_multiplier: f64,
    /// Monthly rate expressed in percent.
    pub monthly_return: f64,
    pub yearly_data: Vec<YearlyPoint>,
    pub calculated_at: DateTime<Utc>,
    pub id: i64,
}

impl SipResult {
    pub fn inputs(&self) -> SipInputs {
        SipInputs::new(self.investment_amount, self.sip_duration, self.annual_return)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpInputs {
    pub total_investment: f64,
    pub monthly_withdrawal: f64,
    pub annual_return: f64,
}

impl SwpInputs {
    pub fn new(total_investment: f64, monthly_withdrawal: f64, annual_return: f64) -> Self {
        Self {
            total_investment,
            monthly_withdrawal,
            annual_return,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusHealth {
    Healthy,
    Low,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpYear {
    pub year: u32,
    pub remaining_value: f64,
    pub total_withdrawn: f64,
    pub monthly_income: f64,
    /// Remaining corpus as a percentage of the starting corpus.
    pub corpus_percentage: f64,
    pub health: CorpusHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpResult {
    pub total_investment: f64,
    pub monthly_withdrawal: f64,
    pub annual_return: f64,
    pub years_lasting: f64,
    pub months_lasting: u32,
    pub total_withdrawn: f64,
    pub remaining_value: f64,
    pub monthly_income_percentage: f64,
    pub sustainable_withdrawal: f64,
    pub is_sustainable: bool,
    pub yearly_data: Vec<SwpYear>,
}

impl SwpResult {
    pub fn inputs(&self) -> SwpInputs {
        SwpInputs::new(
            self.total_investment,
            self.monthly_withdrawal,
            self.annual_return,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub year: u32,
    pub label: &'static str,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    High,
    Medium,
    Low,
}

impl GoalPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalPriority::High => "high",
            GoalPriority::Medium => "medium",
            GoalPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub years: f64,
    pub priority: GoalPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal: Goal,
    pub required_sip: f64,
    pub is_affordable: bool,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub current_sip: f64,
    pub annual_return: f64,
    pub goals: Vec<GoalProgress>,
    pub total_required_sip: f64,
    /// Positive when the current SIP falls short of the total requirement.
    pub shortfall: f64,
    /// Positive when the current SIP exceeds the total requirement.
    pub surplus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationAdjusted {
    pub inflation_rate: f64,
    pub real_return_rate: f64,
    pub real_value: f64,
    pub nominal_value: f64,
    pub inflation_impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxAdjusted {
    pub tax_rate: f64,
    pub gross_returns: f64,
    pub total_investment: f64,
    pub gains: f64,
    pub tax_on_gains: f64,
    pub net_returns: f64,
    /// Annualised growth of the net value over the principal, in percent.
    pub effective_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpYear {
    pub year: u32,
    pub monthly_contribution: f64,
    pub value_at_year_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpResult {
    pub step_up_rate: f64,
    pub step_up_value: f64,
    pub regular_value: f64,
    pub additional_benefit: f64,
    pub schedule: Vec<StepUpYear>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateScenario {
    pub annual_return: f64,
    pub future_value: f64,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentProjection {
    pub name: &'static str,
    pub annual_return: f64,
    pub risk: &'static str,
    pub liquidity: &'static str,
    pub future_value: f64,
}
