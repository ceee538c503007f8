//! The credit engine: turns one assessment snapshot into a complete
//! [`CalculationResult`].
//!
//! Control flow:
//!
//! 1. Eligibility gate. A disqualifier short-circuits every monetary figure
//!    to zero.
//! 2. Current year: QRE aggregation, ASC / Traditional comparison, summary.
//! 3. Three projected years, each seeing the years computed before it.
//! 4. Up to three lookback years from historical actuals.
//! 5. Totals, ROI and the qualified small business offset.
//!
//! The engine is pure: no I/O, no interior mutability, so a single instance
//! can be shared across threads. Memoization lives in
//! [`MemoizedEngine`](crate::cache::MemoizedEngine).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, info_span, warn};

use crate::calculations::common::{clamp_percentage, percent_to_rate};
use crate::calculations::credit_method::CreditMethodEngine;
use crate::calculations::eligibility::{EligibilityGate, EligibilityOutcome};
use crate::calculations::projector::{
    History, MultiYearProjector, PROJECTION_YEARS, PriorWindow, YearInputs, YearPipeline,
    floored_growth_rate,
};
use crate::calculations::qre::{FeeRates, QreAggregator};
use crate::calculations::summary::{SummaryComposer, Timeline};
use crate::config::{EngineConfig, EngineConfigError};
use crate::models::{
    AssessmentInput, CalculationResult, FutureProjection, LookbackSummary, QsbAssessment,
    StateCreditRow, StateCreditSummary, StateCreditTable, YearFinancials, YearKind,
};

/// Computes R&D credit determinations against a fixed configuration and
/// state reference table.
#[derive(Debug, Clone)]
pub struct CreditEngine {
    config: EngineConfig,
    states: Arc<StateCreditTable>,
}

impl CreditEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineConfigError`] when the configuration is invalid.
    pub fn new(
        config: EngineConfig,
        states: Arc<StateCreditTable>,
    ) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self { config, states })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn states(&self) -> &StateCreditTable {
        &self.states
    }

    /// Computes the full determination for one snapshot.
    ///
    /// Total over every input: never panics and never rejects.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use rust_decimal_macros::dec;
    /// use rnd_core::{AssessmentInput, CreditEngine, EngineConfig, StateCreditTable};
    ///
    /// let engine = CreditEngine::new(
    ///     EngineConfig::default(),
    ///     Arc::new(StateCreditTable::default()),
    /// ).unwrap();
    ///
    /// let input = AssessmentInput {
    ///     current_wages: dec!(500000),
    ///     rd_wage_percentage: dec!(20),
    ///     ..AssessmentInput::default()
    /// };
    ///
    /// let result = engine.calculate(&input);
    ///
    /// assert!(result.is_qualified);
    /// assert_eq!(result.current_year.qualified_wages, dec!(100000.00));
    /// assert_eq!(result.future.years.len(), 3);
    /// ```
    pub fn calculate(
        &self,
        input: &AssessmentInput,
    ) -> CalculationResult {
        let tax_year = self.tax_year(input);
        let span = info_span!("calculate", tax_year, state = %input.state);
        let _enter = span.enter();

        let eligibility = EligibilityGate.evaluate(input);
        let composer = SummaryComposer::new(self.state_program(&input.state));
        let state = composer.state_summary(&input.state);

        if eligibility.has_disqualifier {
            info!(
                disqualifiers = ?eligibility.disqualifiers,
                "disqualified; monetary figures zeroed"
            );
            return self.disqualified(input, tax_year, eligibility, &composer, state);
        }

        let history = History::normalize(tax_year, &input.historical_years);
        let fee_rates = self.fee_rates(input, composer.has_state_program());
        let pipeline = YearPipeline::new(
            QreAggregator::new(self.config.service_fee_qre_share),
            CreditMethodEngine::new(self.config.fixed_base_percentage),
            composer,
            fee_rates,
        );

        let mut window =
            PriorWindow::from_history(&history, input.rd_wage_percentage, pipeline.aggregator());

        let current_inputs = YearInputs::current(input, tax_year);
        let current_year = pipeline.compute(&current_inputs, &window.preceding(tax_year));
        window.record(&current_year);

        let projector = MultiYearProjector::new(
            &pipeline,
            self.config.minimum_growth_rate,
            self.config.lookback,
        );
        let future = projector.project_future(input, &current_inputs, &mut window);
        let lookback = projector.lookback(input, tax_year, &history, &window);

        let qsb = composer.qsb(&current_year, history.receipt_years(), false);
        let result = composer.compose(
            tax_year,
            eligibility,
            Timeline {
                current_year,
                future,
                lookback,
            },
            state,
            qsb,
        );

        info!(
            total_credit = %result.total_credit,
            total_value = %result.total_value_n_years,
            lookback_years = result.lookback.years.len(),
            "calculation complete"
        );
        result
    }

    /// The assessment's tax year, or the configured default when unset.
    fn tax_year(
        &self,
        input: &AssessmentInput,
    ) -> i32 {
        if input.tax_year == 0 {
            self.config.default_tax_year
        } else {
            input.tax_year
        }
    }

    /// The state's reference row when it runs a credit program.
    fn state_program(
        &self,
        state_code: &str,
    ) -> Option<&StateCreditRow> {
        if !state_code.trim().is_empty() && self.states.get(state_code).is_none() {
            warn!(state = state_code, "state not in reference table; no state credit");
        }
        self.states.available_program(state_code)
    }

    /// Fee rates as fractions. The state rate is zero without a state program.
    fn fee_rates(
        &self,
        input: &AssessmentInput,
        has_state_program: bool,
    ) -> FeeRates {
        let federal = input
            .federal_fee_rate
            .map(|percent| percent_to_rate(clamp_percentage(percent)))
            .unwrap_or(self.config.default_federal_fee_rate);

        let state = if has_state_program {
            input
                .state_fee_rate
                .map(|percent| percent_to_rate(clamp_percentage(percent)))
                .unwrap_or(self.config.default_state_fee_rate)
        } else {
            Decimal::ZERO
        };

        FeeRates { federal, state }
    }

    /// Result for a disqualified assessment: same shape, every amount zero.
    fn disqualified(
        &self,
        input: &AssessmentInput,
        tax_year: i32,
        eligibility: EligibilityOutcome,
        composer: &SummaryComposer<'_>,
        state: StateCreditSummary,
    ) -> CalculationResult {
        let future = FutureProjection {
            years: (1..=PROJECTION_YEARS)
                .map(|offset| {
                    let year = tax_year.saturating_add_unsigned(offset);
                    YearFinancials::zeroed(year, YearKind::Projected)
                })
                .collect(),
            total_credits: Decimal::ZERO,
            growth_rate_applied: floored_growth_rate(
                input.growth_rate,
                self.config.minimum_growth_rate,
            ),
        };

        composer.compose(
            tax_year,
            eligibility,
            Timeline {
                current_year: YearFinancials::zeroed(tax_year, YearKind::Current),
                future,
                lookback: LookbackSummary::default(),
            },
            state,
            QsbAssessment::default(),
        )
    }
}
