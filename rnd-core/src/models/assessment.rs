use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Legal form of the business being assessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    CCorporation,
    SCorporation,
    Partnership,
    Llc,
    SoleProprietorship,
    NonProfit,
    Government,
    #[default]
    Unknown,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CCorporation => "c_corporation",
            Self::SCorporation => "s_corporation",
            Self::Partnership => "partnership",
            Self::Llc => "llc",
            Self::SoleProprietorship => "sole_proprietorship",
            Self::NonProfit => "non_profit",
            Self::Government => "government",
            Self::Unknown => "unknown",
        }
    }

    /// Parses the stored code; anything unrecognised maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "c_corporation" | "c_corp" => Self::CCorporation,
            "s_corporation" | "s_corp" => Self::SCorporation,
            "partnership" => Self::Partnership,
            "llc" => Self::Llc,
            "sole_proprietorship" => Self::SoleProprietorship,
            "non_profit" | "nonprofit" => Self::NonProfit,
            "government" => Self::Government,
            _ => Self::Unknown,
        }
    }

    /// Disqualifying factor implied by the entity type itself, if any.
    pub fn implied_disqualifier(&self) -> Option<&'static str> {
        match self {
            Self::NonProfit => Some("Non-profit organization"),
            Self::Government => Some("Government entity"),
            _ => None,
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

/// One prior tax year of actuals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalYear {
    /// Tax year; `0` means "assign by position" (first entry is the most
    /// recent prior year).
    #[serde(deserialize_with = "null_as_default")]
    pub year: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub revenue: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub w2_wages: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub supply_spend: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub contract_research_spend: Decimal,
}

/// Which spend bucket a planned initiative adds to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendCategory {
    #[default]
    Wages,
    Supplies,
    ContractResearch,
}

/// Additional R&D spend the client plans for a projected year onward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannedInitiative {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// First projected year (1 = next year) the spend applies to.
    #[serde(deserialize_with = "null_as_default")]
    pub start_year_offset: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub category: SpendCategory,
    #[serde(deserialize_with = "null_as_default")]
    pub annual_spend: Decimal,
}

/// Complete snapshot of one client's assessment answers.
///
/// Every field is optional on the wire, and an explicit `null` counts as
/// absent: numbers default to zero, collections to empty. The engine only
/// ever borrows a snapshot; edits produce a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentInput {
    // Contact / business profile
    #[serde(deserialize_with = "null_as_default")]
    pub company_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub industry: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_type: EntityType,
    #[serde(deserialize_with = "null_as_default")]
    pub employee_count: u32,

    // Eligibility
    #[serde(deserialize_with = "null_as_default")]
    pub disqualifying_factors: BTreeSet<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub qualifying_activities: BTreeSet<String>,

    // Financial history (up to 4 prior years)
    #[serde(deserialize_with = "null_as_default")]
    pub historical_years: Vec<HistoricalYear>,

    // Current year
    #[serde(deserialize_with = "null_as_default")]
    pub tax_year: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub current_revenue: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub current_wages: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub rd_wage_percentage: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub supply_spend: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub contract_research_spend: Decimal,

    // Prior credit history
    #[serde(deserialize_with = "null_as_default")]
    pub rd_credit_years_previously_claimed: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub claimed_tax_years: Vec<i32>,
    #[serde(deserialize_with = "null_as_default")]
    pub qualifying_activity_years: u32,

    // Assumptions (percent units)
    pub federal_fee_rate: Option<Decimal>,
    pub state_fee_rate: Option<Decimal>,
    #[serde(deserialize_with = "null_as_default")]
    pub growth_rate: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub planned_initiatives: Vec<PlannedInitiative>,
}

/// Reads an absent-or-null field as its default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
