//! Engine configuration.
//!
//! [`EngineConfig`] carries the business-policy knobs that are not statutory
//! constants: default fee rates, the growth floor, the service-fee QRE share
//! and the lookback claim policy. Every field has a default so a partial TOML
//! document (or none at all) yields a usable configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by [`EngineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineConfigError {
    /// The growth floor must be between 0 and 1.
    #[error("minimum growth rate must be between 0 and 1, got {0}")]
    InvalidMinimumGrowthRate(Decimal),

    /// The default federal fee rate must be between 0 and 1.
    #[error("default federal fee rate must be between 0 and 1, got {0}")]
    InvalidFederalFeeRate(Decimal),

    /// The default state fee rate must be between 0 and 1.
    #[error("default state fee rate must be between 0 and 1, got {0}")]
    InvalidStateFeeRate(Decimal),

    /// The service-fee QRE share must be between 0 and 1.
    #[error("service fee QRE share must be between 0 and 1, got {0}")]
    InvalidServiceFeeShare(Decimal),

    /// A fixed-base percentage override must be between 0 and 0.16.
    #[error("fixed base percentage must be between 0 and 0.16, got {0}")]
    InvalidFixedBasePercentage(Decimal),

    /// At most three lookback years can be amended.
    #[error("lookback max_years must be between 0 and 3, got {0}")]
    InvalidLookbackYears(u32),
}

/// How `rd_credit_years_previously_claimed` / `claimed_tax_years` map onto
/// concrete prior tax years when deciding lookback eligibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMapping {
    /// A count of `N` covers the `N` most recent prior tax years.
    #[default]
    MostRecent,
    /// Only the years listed in `claimed_tax_years` are covered.
    ExplicitYears,
    /// Covered by either rule.
    Either,
}

/// Lookback eligibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookbackPolicy {
    pub claim_mapping: ClaimMapping,
    /// Number of prior years examined (statute of limitations allows 3).
    pub max_years: u32,
}

impl Default for LookbackPolicy {
    fn default() -> Self {
        Self {
            claim_mapping: ClaimMapping::MostRecent,
            max_years: 3,
        }
    }
}

impl LookbackPolicy {
    /// Whether `year` is already covered by a prior claim.
    ///
    /// # Example
    ///
    /// ```
    /// use rnd_core::config::{ClaimMapping, LookbackPolicy};
    ///
    /// let policy = LookbackPolicy { claim_mapping: ClaimMapping::MostRecent, max_years: 3 };
    ///
    /// // Two years claimed as of 2025 covers 2024 and 2023.
    /// assert!(policy.is_claimed(2024, 2025, 2, &[]));
    /// assert!(policy.is_claimed(2023, 2025, 2, &[]));
    /// assert!(!policy.is_claimed(2022, 2025, 2, &[]));
    /// ```
    pub fn is_claimed(
        &self,
        year: i32,
        tax_year: i32,
        claimed_count: u32,
        claimed_years: &[i32],
    ) -> bool {
        let by_count = || {
            let offset = i64::from(tax_year) - i64::from(year);
            offset >= 1 && offset <= i64::from(claimed_count)
        };
        let by_list = || claimed_years.contains(&year);

        match self.claim_mapping {
            ClaimMapping::MostRecent => by_count(),
            ClaimMapping::ExplicitYears => by_list(),
            ClaimMapping::Either => by_count() || by_list(),
        }
    }
}

/// Business-policy configuration for the credit engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tax year used when an assessment leaves `tax_year` at zero.
    pub default_tax_year: i32,

    /// Floor applied to the growth assumption for projected years (fraction).
    pub minimum_growth_rate: Decimal,

    /// Federal advisory fee rate used when the assessment supplies none (fraction).
    pub default_federal_fee_rate: Decimal,

    /// State advisory fee rate used when the assessment supplies none (fraction).
    pub default_state_fee_rate: Decimal,

    /// Share of the fee baseline that counts as service-fee QRE.
    pub service_fee_qre_share: Decimal,

    /// Overrides the derived Traditional-method fixed-base percentage.
    pub fixed_base_percentage: Option<Decimal>,

    pub lookback: LookbackPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_tax_year: 2025,
            minimum_growth_rate: Decimal::new(5, 2),
            default_federal_fee_rate: Decimal::new(15, 3),
            default_state_fee_rate: Decimal::new(5, 3),
            service_fee_qre_share: Decimal::new(77, 2),
            fixed_base_percentage: None,
            lookback: LookbackPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`EngineConfigError`] if any rate lies outside `[0, 1]`, the
    /// fixed-base override exceeds the 16% statutory cap, or the lookback
    /// window exceeds three years.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rnd_core::config::{EngineConfig, EngineConfigError};
    ///
    /// let config = EngineConfig {
    ///     minimum_growth_rate: dec!(1.5),
    ///     ..EngineConfig::default()
    /// };
    ///
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(EngineConfigError::InvalidMinimumGrowthRate(dec!(1.5)))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if !is_fraction(self.minimum_growth_rate) {
            return Err(EngineConfigError::InvalidMinimumGrowthRate(
                self.minimum_growth_rate,
            ));
        }
        if !is_fraction(self.default_federal_fee_rate) {
            return Err(EngineConfigError::InvalidFederalFeeRate(
                self.default_federal_fee_rate,
            ));
        }
        if !is_fraction(self.default_state_fee_rate) {
            return Err(EngineConfigError::InvalidStateFeeRate(
                self.default_state_fee_rate,
            ));
        }
        if !is_fraction(self.service_fee_qre_share) {
            return Err(EngineConfigError::InvalidServiceFeeShare(
                self.service_fee_qre_share,
            ));
        }
        if let Some(percentage) = self.fixed_base_percentage {
            if percentage < Decimal::ZERO || percentage > Decimal::new(16, 2) {
                return Err(EngineConfigError::InvalidFixedBasePercentage(percentage));
            }
        }
        if self.lookback.max_years > 3 {
            return Err(EngineConfigError::InvalidLookbackYears(
                self.lookback.max_years,
            ));
        }
        Ok(())
    }
}

fn is_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // EngineConfig::validate tests
    // =========================================================================

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_config_uses_five_percent_growth_floor() {
        assert_eq!(EngineConfig::default().minimum_growth_rate, dec!(0.05));
        assert_eq!(EngineConfig::default().service_fee_qre_share, dec!(0.77));
    }

    #[test]
    fn validate_rejects_negative_federal_fee_rate() {
        let config = EngineConfig {
            default_federal_fee_rate: dec!(-0.01),
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(EngineConfigError::InvalidFederalFeeRate(dec!(-0.01)))
        );
    }

    #[test]
    fn validate_rejects_state_fee_rate_above_one() {
        let config = EngineConfig {
            default_state_fee_rate: dec!(1.01),
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(EngineConfigError::InvalidStateFeeRate(dec!(1.01)))
        );
    }

    #[test]
    fn validate_rejects_service_fee_share_above_one() {
        let config = EngineConfig {
            service_fee_qre_share: dec!(1.2),
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(EngineConfigError::InvalidServiceFeeShare(dec!(1.2)))
        );
    }

    #[test]
    fn validate_rejects_fixed_base_above_statutory_cap() {
        let config = EngineConfig {
            fixed_base_percentage: Some(dec!(0.17)),
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(EngineConfigError::InvalidFixedBasePercentage(dec!(0.17)))
        );
    }

    #[test]
    fn validate_rejects_more_than_three_lookback_years() {
        let config = EngineConfig {
            lookback: LookbackPolicy {
                max_years: 4,
                ..LookbackPolicy::default()
            },
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(EngineConfigError::InvalidLookbackYears(4))
        );
    }

    // =========================================================================
    // LookbackPolicy::is_claimed tests
    // =========================================================================

    #[test]
    fn most_recent_mapping_ignores_explicit_years() {
        let policy = LookbackPolicy::default();

        assert!(!policy.is_claimed(2022, 2025, 0, &[2022]));
    }

    #[test]
    fn explicit_mapping_ignores_count() {
        let policy = LookbackPolicy {
            claim_mapping: ClaimMapping::ExplicitYears,
            max_years: 3,
        };

        assert!(!policy.is_claimed(2024, 2025, 3, &[]));
        assert!(policy.is_claimed(2023, 2025, 0, &[2023]));
    }

    #[test]
    fn either_mapping_accepts_both_rules() {
        let policy = LookbackPolicy {
            claim_mapping: ClaimMapping::Either,
            max_years: 3,
        };

        assert!(policy.is_claimed(2024, 2025, 1, &[]));
        assert!(policy.is_claimed(2022, 2025, 1, &[2022]));
        assert!(!policy.is_claimed(2023, 2025, 1, &[2022]));
    }

    #[test]
    fn count_never_covers_current_or_future_years() {
        let policy = LookbackPolicy::default();

        assert!(!policy.is_claimed(2025, 2025, 3, &[]));
        assert!(!policy.is_claimed(2026, 2025, 3, &[]));
    }

    #[test]
    fn config_deserializes_from_partial_document() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "default_tax_year": 2024, "lookback": { "claim_mapping": "explicit_years" } }"#,
        )
        .unwrap();

        assert_eq!(config.default_tax_year, 2024);
        assert_eq!(config.lookback.claim_mapping, ClaimMapping::ExplicitYears);
        assert_eq!(config.lookback.max_years, 3);
        assert_eq!(config.minimum_growth_rate, dec!(0.05));
    }
}
