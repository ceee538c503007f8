//! Credit method comparison: Alternative Simplified Credit vs. Traditional.
//!
//! # Alternative Simplified Credit (ASC)
//!
//! | Condition | Credit |
//! |-----------|--------|
//! | No prior qualifying activity | 6% × current QRE |
//! | Otherwise | 14% × max(0, current QRE − 50% × average prior QRE) |
//!
//! The average prior QRE always divides the three prior years' QRE by three;
//! a missing year contributes zero.
//!
//! # Traditional (regular) credit
//!
//! Requires three prior years, each with positive gross receipts and wages.
//!
//! | Step | Formula |
//! |------|---------|
//! | Fixed-base % | 3% for start-ups (≤ 5 qualifying years), else Σ prior QRE / Σ prior receipts capped at 16% |
//! | Base amount | fixed-base % × average prior gross receipts |
//! | Credit base | current QRE − min(base amount, 50% × current QRE) |
//! | Credit | 20% × max(0, credit base) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rnd_core::CreditMethod;
//! use rnd_core::calculations::credit_method::{CreditMethodEngine, CreditMethodInputs};
//!
//! let engine = CreditMethodEngine::new(None);
//! let comparison = engine.compare(&CreditMethodInputs {
//!     current_qre: dec!(100000.00),
//!     prior_years: &[],
//!     qualifying_activity_years: 0,
//! });
//!
//! assert_eq!(comparison.asc_credit, dec!(6000.00));
//! assert!(!comparison.traditional_available);
//! assert_eq!(comparison.best_method, CreditMethod::Asc);
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{max, non_negative, round_half_up, safe_div};
use crate::models::CreditMethod;

/// ASC rate when the taxpayer has no prior qualifying activity.
pub const ASC_STARTUP_RATE: Decimal = dec!(0.06);

/// ASC rate on QRE above half the prior average.
pub const ASC_RATE: Decimal = dec!(0.14);

/// Share of the 3-year average prior QRE subtracted under the ASC.
pub const ASC_PRIOR_AVERAGE_SHARE: Decimal = dec!(0.50);

/// Traditional credit rate.
pub const TRADITIONAL_RATE: Decimal = dec!(0.20);

/// The base amount may never exceed this share of current QRE.
pub const BASE_LIMITATION: Decimal = dec!(0.50);

/// Fixed-base percentage for start-up companies.
pub const STARTUP_FIXED_BASE_PERCENTAGE: Decimal = dec!(0.03);

/// Statutory ceiling on the fixed-base percentage.
pub const MAX_FIXED_BASE_PERCENTAGE: Decimal = dec!(0.16);

/// Qualifying years during which the start-up fixed-base percentage applies.
pub const STARTUP_YEARS: u32 = 5;

/// Number of prior years both methods look back over.
pub const PRIOR_YEARS: usize = 3;

/// Figures for one year preceding the year being computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorYear {
    pub tax_year: i32,
    pub qre: Decimal,
    pub gross_receipts: Decimal,
    pub wages: Decimal,
}

impl PriorYear {
    fn has_receipts_and_wages(&self) -> bool {
        self.gross_receipts > Decimal::ZERO && self.wages > Decimal::ZERO
    }
}

/// Inputs to one method comparison.
#[derive(Debug, Clone, Copy)]
pub struct CreditMethodInputs<'a> {
    pub current_qre: Decimal,
    /// Prior years, most recent first. Only the first three are used.
    pub prior_years: &'a [PriorYear],
    pub qualifying_activity_years: u32,
}

/// Both credits for one year and the method that wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub asc_credit: Decimal,
    pub traditional_credit: Decimal,
    /// Rate the ASC was computed with (6% or 14%).
    pub asc_rate: Decimal,
    /// Fixed-base percentage × average prior gross receipts, before the 50% cap.
    pub traditional_base: Decimal,
    pub fixed_base_percentage: Decimal,
    pub average_prior_qre: Decimal,
    pub traditional_available: bool,
    pub best_method: CreditMethod,
}

impl MethodComparison {
    /// The larger of the two credits.
    pub fn chosen_credit(&self) -> Decimal {
        max(self.asc_credit, self.traditional_credit)
    }
}

/// Computes both credits for a year and selects the better one.
#[derive(Debug, Clone, Default)]
pub struct CreditMethodEngine {
    fixed_base_override: Option<Decimal>,
}

impl CreditMethodEngine {
    /// Creates an engine. `fixed_base_override` replaces the derived
    /// fixed-base percentage when set.
    pub fn new(fixed_base_override: Option<Decimal>) -> Self {
        Self {
            fixed_base_override,
        }
    }

    /// Compares ASC and Traditional for one year.
    pub fn compare(
        &self,
        inputs: &CreditMethodInputs<'_>,
    ) -> MethodComparison {
        let current_qre = non_negative(inputs.current_qre);
        let prior = &inputs.prior_years[..inputs.prior_years.len().min(PRIOR_YEARS)];

        let average_prior_qre = self.average_prior_qre(prior);
        let (asc_credit, asc_rate) =
            self.asc_credit(current_qre, average_prior_qre, inputs.qualifying_activity_years);

        let traditional_available = self.traditional_available(prior);
        let (traditional_credit, traditional_base, fixed_base_percentage) =
            if traditional_available {
                let fixed_base_percentage =
                    self.fixed_base_percentage(prior, inputs.qualifying_activity_years);
                let traditional_base = self.traditional_base(prior, fixed_base_percentage);
                let credit = self.traditional_credit(current_qre, traditional_base);
                (credit, traditional_base, fixed_base_percentage)
            } else {
                (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
            };

        let best_method =
            self.best_method(asc_credit, traditional_credit, traditional_available);

        MethodComparison {
            asc_credit,
            traditional_credit,
            asc_rate,
            traditional_base,
            fixed_base_percentage,
            average_prior_qre,
            traditional_available,
            best_method,
        }
    }

    /// Average QRE over the three prior years; missing years count as zero.
    fn average_prior_qre(
        &self,
        prior: &[PriorYear],
    ) -> Decimal {
        let total: Decimal = prior.iter().map(|year| non_negative(year.qre)).sum();
        round_half_up(total / Decimal::from(PRIOR_YEARS as u32))
    }

    /// ASC credit and the rate used.
    fn asc_credit(
        &self,
        current_qre: Decimal,
        average_prior_qre: Decimal,
        qualifying_activity_years: u32,
    ) -> (Decimal, Decimal) {
        if qualifying_activity_years == 0 {
            return (round_half_up(current_qre * ASC_STARTUP_RATE), ASC_STARTUP_RATE);
        }

        let excess = non_negative(current_qre - average_prior_qre * ASC_PRIOR_AVERAGE_SHARE);
        (round_half_up(excess * ASC_RATE), ASC_RATE)
    }

    /// Traditional needs three prior years with receipts and wages.
    fn traditional_available(
        &self,
        prior: &[PriorYear],
    ) -> bool {
        prior.len() == PRIOR_YEARS && prior.iter().all(PriorYear::has_receipts_and_wages)
    }

    /// Fixed-base percentage: override, start-up rate, or historical ratio
    /// capped at 16%.
    fn fixed_base_percentage(
        &self,
        prior: &[PriorYear],
        qualifying_activity_years: u32,
    ) -> Decimal {
        if let Some(percentage) = self.fixed_base_override {
            return percentage;
        }
        if qualifying_activity_years <= STARTUP_YEARS {
            return STARTUP_FIXED_BASE_PERCENTAGE;
        }

        let qre: Decimal = prior.iter().map(|year| non_negative(year.qre)).sum();
        let receipts: Decimal = prior.iter().map(|year| year.gross_receipts).sum();
        // Receipts are positive here; a quotient too large for Decimal is above the cap.
        qre.checked_div(receipts)
            .unwrap_or(MAX_FIXED_BASE_PERCENTAGE)
            .min(MAX_FIXED_BASE_PERCENTAGE)
            .round_dp(6)
    }

    /// Fixed-base percentage × average prior gross receipts.
    fn traditional_base(
        &self,
        prior: &[PriorYear],
        fixed_base_percentage: Decimal,
    ) -> Decimal {
        let receipts: Decimal = prior.iter().map(|year| year.gross_receipts).sum();
        let average_receipts = safe_div(receipts, Decimal::from(PRIOR_YEARS as u32));
        round_half_up(fixed_base_percentage * average_receipts)
    }

    /// 20% of current QRE above the base amount, with the base limited to
    /// half of current QRE.
    fn traditional_credit(
        &self,
        current_qre: Decimal,
        traditional_base: Decimal,
    ) -> Decimal {
        let limited_base = traditional_base.min(round_half_up(current_qre * BASE_LIMITATION));
        let credit_base = non_negative(current_qre - limited_base);
        round_half_up(credit_base * TRADITIONAL_RATE)
    }

    /// ASC wins ties and whenever Traditional is unavailable.
    fn best_method(
        &self,
        asc_credit: Decimal,
        traditional_credit: Decimal,
        traditional_available: bool,
    ) -> CreditMethod {
        if !traditional_available || asc_credit >= traditional_credit {
            CreditMethod::Asc
        } else {
            CreditMethod::Traditional
        }
    }
}
