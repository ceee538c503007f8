//! Qualified Research Expense (QRE) aggregation.
//!
//! Combines the four QRE components for one tax year:
//!
//! | Step | Component | Formula |
//! |------|-----------|---------|
//! | 1 | Qualified wages | total wages × R&D wage % (clamped to 0–100) |
//! | 2 | Contract research QRE | contract spend × 65% (statutory limitation) |
//! | 3 | Supply QRE | supply spend × 100% |
//! | 4 | Pre-fee QRE | 1 + 2 + 3 |
//! | 5 | Fee baseline | pre-fee QRE × (federal fee rate + state fee rate) |
//! | 6 | Service-fee QRE | fee baseline × service-fee share (77%) |
//! | 7 | Total QRE | 4 + 6 |
//!
//! The advisory fee depends on QRE and is itself partly a QRE, which is a
//! fixed-point relationship. It is resolved in a single pass: the fee is
//! charged against the pre-fee QRE of step 4 and is never recomputed against
//! the total of step 7. There is no iteration to convergence; published
//! results depend on this exact order.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rnd_core::calculations::qre::{FeeRates, QreAggregator, QreInputs};
//!
//! let aggregator = QreAggregator::new(dec!(0.77));
//! let inputs = QreInputs {
//!     total_wages: dec!(500000.00),
//!     rd_wage_percentage: dec!(20),
//!     contract_research_spend: dec!(10000.00),
//!     supply_spend: dec!(5000.00),
//! };
//! let fees = FeeRates { federal: dec!(0.015), state: dec!(0.005) };
//!
//! let result = aggregator.aggregate(&inputs, &fees);
//!
//! assert_eq!(result.qualified_wages, dec!(100000.00));
//! assert_eq!(result.contract_research_qre, dec!(6500.00));
//! assert_eq!(result.pre_fee_qre, dec!(111500.00));
//! assert_eq!(result.fee_baseline, dec!(2230.00));
//! assert_eq!(result.service_fee_qre, dec!(1717.10));
//! assert_eq!(result.total_qre, dec!(113217.10));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::{
    clamp_amount, clamp_percentage, percent_to_rate, round_half_up,
};

/// Share of contract research spend that counts as QRE (IRC §41(b)(3)).
pub const CONTRACT_RESEARCH_SHARE: Decimal = dec!(0.65);

/// Share of supply spend that counts as QRE.
pub const SUPPLY_SHARE: Decimal = dec!(1.00);

/// Spend figures for one year, before any percentage is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QreInputs {
    pub total_wages: Decimal,
    /// Percent of wages spent on qualified research (percent units).
    pub rd_wage_percentage: Decimal,
    pub contract_research_spend: Decimal,
    pub supply_spend: Decimal,
}

/// Advisory fee rates as fractions of the pre-fee QRE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub federal: Decimal,
    pub state: Decimal,
}

impl FeeRates {
    pub fn combined(&self) -> Decimal {
        self.federal + self.state
    }
}

/// QRE components for one year. Every amount is ≥ 0 and rounded to the cent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QreBreakdown {
    pub qualified_wages: Decimal,
    pub contract_research_qre: Decimal,
    pub supply_qre: Decimal,
    /// Wages + contract + supply QRE; the basis the fee is charged against.
    pub pre_fee_qre: Decimal,
    /// Annual advisory/cloud-service fee.
    pub fee_baseline: Decimal,
    pub service_fee_qre: Decimal,
    pub total_qre: Decimal,
}

/// Single-pass QRE aggregator.
#[derive(Debug, Clone)]
pub struct QreAggregator {
    service_fee_share: Decimal,
}

impl QreAggregator {
    /// Creates an aggregator counting `service_fee_share` of the fee baseline
    /// as QRE.
    pub fn new(service_fee_share: Decimal) -> Self {
        Self { service_fee_share }
    }

    /// Aggregates one year's QRE.
    pub fn aggregate(
        &self,
        inputs: &QreInputs,
        fees: &FeeRates,
    ) -> QreBreakdown {
        // Steps 1-3
        let qualified_wages = self.qualified_wages(inputs.total_wages, inputs.rd_wage_percentage);
        let contract_research_qre = self.contract_research_qre(inputs.contract_research_spend);
        let supply_qre = self.supply_qre(inputs.supply_spend);

        // Step 4: prior-iteration estimate used for the fee
        let pre_fee_qre = qualified_wages + contract_research_qre + supply_qre;

        // Steps 5-6
        let fee_baseline = self.fee_baseline(pre_fee_qre, fees);
        let service_fee_qre = self.service_fee_qre(fee_baseline);

        // Step 7
        let total_qre = pre_fee_qre + service_fee_qre;

        QreBreakdown {
            qualified_wages,
            contract_research_qre,
            supply_qre,
            pre_fee_qre,
            fee_baseline,
            service_fee_qre,
            total_qre,
        }
    }

    /// Qualified wages (step 1). Out-of-range percentages are clamped.
    fn qualified_wages(
        &self,
        total_wages: Decimal,
        rd_wage_percentage: Decimal,
    ) -> Decimal {
        let clamped = clamp_percentage(rd_wage_percentage);
        if clamped != rd_wage_percentage {
            warn!(
                rd_wage_percentage = %rd_wage_percentage,
                clamped = %clamped,
                "R&D wage percentage outside 0-100; clamped"
            );
        }
        round_half_up(clamp_amount(total_wages) * percent_to_rate(clamped))
    }

    /// Contract research QRE (step 2).
    fn contract_research_qre(
        &self,
        spend: Decimal,
    ) -> Decimal {
        round_half_up(clamp_amount(spend) * CONTRACT_RESEARCH_SHARE)
    }

    /// Supply QRE (step 3).
    fn supply_qre(
        &self,
        spend: Decimal,
    ) -> Decimal {
        round_half_up(clamp_amount(spend) * SUPPLY_SHARE)
    }

    /// Fee baseline (step 5).
    fn fee_baseline(
        &self,
        pre_fee_qre: Decimal,
        fees: &FeeRates,
    ) -> Decimal {
        round_half_up(pre_fee_qre * fees.combined().clamp(Decimal::ZERO, Decimal::TWO))
    }

    /// Service-fee QRE (step 6).
    fn service_fee_qre(
        &self,
        fee_baseline: Decimal,
    ) -> Decimal {
        round_half_up(fee_baseline * self.service_fee_share)
    }
}
