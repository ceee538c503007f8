use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state_credit::StateCreditMethod;
use super::year_financials::YearFinancials;

/// Business-profile field the eligibility gate found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRequirement {
    CurrentWages,
    RdWagePercentage,
}

/// Three projected years, soonest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureProjection {
    pub years: Vec<YearFinancials>,
    pub total_credits: Decimal,
    /// Effective growth rate (fraction) after the floor was applied.
    pub growth_rate_applied: Decimal,
}

/// Prior years still open for a retroactive claim, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookbackSummary {
    pub years: Vec<YearFinancials>,
    pub total: Decimal,
    pub can_lookback: bool,
}

/// State program applied to the assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCreditSummary {
    pub state_code: String,
    pub program_available: bool,
    pub credit_rate: Decimal,
    pub method: Option<StateCreditMethod>,
}

/// Qualified small business payroll-tax offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QsbAssessment {
    pub eligible: bool,
    pub max_payroll_offset: Decimal,
    pub applicable_offset: Decimal,
}

/// Complete credit determination for one assessment snapshot.
///
/// Produced fresh on every computation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub tax_year: i32,

    // Eligibility
    pub is_qualified: bool,
    pub has_disqualifier: bool,
    pub qualification_score: u8,
    pub disqualifiers: Vec<String>,
    pub missing_requirements: Vec<ProfileRequirement>,

    // Timeline
    pub current_year: YearFinancials,
    pub future: FutureProjection,
    pub lookback: LookbackSummary,

    pub state: StateCreditSummary,
    pub qsb: QsbAssessment,

    // Totals, all over the years of `all_years()`
    /// Sum of every year's chosen credit.
    pub total_credit: Decimal,
    /// Sum of every year's advisory fees.
    pub total_fees: Decimal,
    /// `total_credit / total_fees`, zero when no fees are charged.
    pub roi: Decimal,
    /// Same sum as `total_credit`.
    pub total_value_n_years: Decimal,
}

impl CalculationResult {
    /// Current, projected and lookback years in display order.
    pub fn all_years(&self) -> impl Iterator<Item = &YearFinancials> {
        std::iter::once(&self.current_year)
            .chain(self.future.years.iter())
            .chain(self.lookback.years.iter())
    }
}
