use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which part of the timeline a computed year belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearKind {
    Current,
    Projected,
    Lookback,
}

/// The two IRS credit computation methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditMethod {
    /// Alternative Simplified Credit.
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    /// Regular (fixed-base) credit.
    Traditional,
}

impl CreditMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Traditional => "Traditional",
        }
    }
}

/// Advisory/cloud-service fees attributed to one year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub federal_fee: Decimal,
    pub state_fee: Decimal,
    pub total: Decimal,
}

/// Every derived figure for one computed tax year.
///
/// Never persisted on its own; always embedded in a
/// [`CalculationResult`](crate::CalculationResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearFinancials {
    pub tax_year: i32,
    pub kind: YearKind,

    // Inputs used for the year
    pub gross_receipts: Decimal,
    pub total_wages: Decimal,
    pub supply_spend: Decimal,
    pub contract_research_spend: Decimal,

    // QRE breakdown
    pub qualified_wages: Decimal,
    pub contract_research_qre: Decimal,
    pub supply_qre: Decimal,
    pub service_fee_qre: Decimal,
    pub total_qre: Decimal,

    // Method comparison
    pub asc_credit: Decimal,
    pub traditional_credit: Decimal,
    pub asc_rate: Decimal,
    pub traditional_base: Decimal,
    pub average_prior_qre: Decimal,
    pub traditional_available: bool,
    pub best_method: CreditMethod,

    // Credit split
    pub chosen_credit: Decimal,
    pub federal_credit: Decimal,
    pub state_credit: Decimal,
    pub total_credit: Decimal,

    // Fees and return
    pub fees: FeeBreakdown,
    pub net_benefit: Decimal,
    pub roi: Decimal,
}

impl YearFinancials {
    /// A year with every monetary field at zero.
    pub fn zeroed(
        tax_year: i32,
        kind: YearKind,
    ) -> Self {
        Self {
            tax_year,
            kind,
            gross_receipts: Decimal::ZERO,
            total_wages: Decimal::ZERO,
            supply_spend: Decimal::ZERO,
            contract_research_spend: Decimal::ZERO,
            qualified_wages: Decimal::ZERO,
            contract_research_qre: Decimal::ZERO,
            supply_qre: Decimal::ZERO,
            service_fee_qre: Decimal::ZERO,
            total_qre: Decimal::ZERO,
            asc_credit: Decimal::ZERO,
            traditional_credit: Decimal::ZERO,
            asc_rate: Decimal::ZERO,
            traditional_base: Decimal::ZERO,
            average_prior_qre: Decimal::ZERO,
            traditional_available: false,
            best_method: CreditMethod::Asc,
            chosen_credit: Decimal::ZERO,
            federal_credit: Decimal::ZERO,
            state_credit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            fees: FeeBreakdown::default(),
            net_benefit: Decimal::ZERO,
            roi: Decimal::ZERO,
        }
    }
}
