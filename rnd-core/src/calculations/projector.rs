//! Multi-year projection: three future years and up to three lookback years.
//!
//! Each year is computed by the same [`YearPipeline`]: QRE aggregation, then
//! the ASC / Traditional comparison, then the per-year summary.
//!
//! # Future years
//!
//! Year `n` (1..=3) compounds current revenue, wages, supply spend and
//! contract research spend by `(1 + g)^n`, where `g` is the requested growth
//! rate floored at the configured minimum (5% by default). Planned initiatives
//! add their annual spend from their start offset onward, and qualifying
//! activity years grow by `n`.
//!
//! # Lookback years
//!
//! Candidates are the historical years immediately before the tax year, most
//! recent first. A candidate is used only when it has positive revenue and
//! wages and no earlier claim covers it. These are actuals: nothing is
//! compounded and skipped years are not zero-filled.
//!
//! # Prior history
//!
//! Every computation looks at the three tax years preceding it through a
//! [`PriorWindow`]. Historical years enter the window with their wage, supply
//! and contract QRE (no advisory fee was paid for them); computed years enter
//! with their total QRE as soon as they are computed.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rust_decimal_macros::dec;

use crate::calculations::common::{clamp_amount, percent_to_rate, round_half_up};
use crate::calculations::credit_method::{
    CreditMethodEngine, CreditMethodInputs, PRIOR_YEARS, PriorYear,
};
use crate::calculations::qre::{FeeRates, QreAggregator, QreInputs};
use crate::calculations::summary::SummaryComposer;
use crate::config::LookbackPolicy;
use crate::models::{
    AssessmentInput, FutureProjection, HistoricalYear, LookbackSummary, PlannedInitiative,
    SpendCategory, YearFinancials, YearKind,
};

/// Number of projected future years.
pub const PROJECTION_YEARS: u32 = 3;

/// Highest growth fraction applied to a projection (1000% per year).
pub const MAX_GROWTH_RATE: Decimal = dec!(10);

/// Converts a growth percentage to a fraction no lower than `minimum` and no
/// higher than [`MAX_GROWTH_RATE`].
pub fn floored_growth_rate(
    growth_percent: Decimal,
    minimum: Decimal,
) -> Decimal {
    let requested = percent_to_rate(growth_percent);
    if requested > MAX_GROWTH_RATE {
        warn!(
            requested = %requested,
            applied = %MAX_GROWTH_RATE,
            "growth rate above ceiling"
        );
        return MAX_GROWTH_RATE.max(minimum);
    }
    if requested < minimum {
        debug!(
            requested = %requested,
            applied = %minimum,
            "growth rate below floor"
        );
        return minimum;
    }
    requested
}

/// Raw figures for one year, before any QRE or credit is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearInputs {
    pub tax_year: i32,
    pub kind: YearKind,
    pub gross_receipts: Decimal,
    pub total_wages: Decimal,
    /// Percent units.
    pub rd_wage_percentage: Decimal,
    pub supply_spend: Decimal,
    pub contract_research_spend: Decimal,
    pub qualifying_activity_years: u32,
}

impl YearInputs {
    /// Current-year figures straight from the assessment.
    pub fn current(
        input: &AssessmentInput,
        tax_year: i32,
    ) -> Self {
        Self {
            tax_year,
            kind: YearKind::Current,
            gross_receipts: clamp_amount(input.current_revenue),
            total_wages: clamp_amount(input.current_wages),
            rd_wage_percentage: input.rd_wage_percentage,
            supply_spend: clamp_amount(input.supply_spend),
            contract_research_spend: clamp_amount(input.contract_research_spend),
            qualifying_activity_years: input.qualifying_activity_years,
        }
    }

    fn qre_inputs(&self) -> QreInputs {
        QreInputs {
            total_wages: self.total_wages,
            rd_wage_percentage: self.rd_wage_percentage,
            contract_research_spend: self.contract_research_spend,
            supply_spend: self.supply_spend,
        }
    }
}

/// QRE aggregation, method comparison and summary for a single year.
#[derive(Debug, Clone)]
pub struct YearPipeline<'a> {
    aggregator: QreAggregator,
    methods: CreditMethodEngine,
    composer: SummaryComposer<'a>,
    fee_rates: FeeRates,
}

impl<'a> YearPipeline<'a> {
    pub fn new(
        aggregator: QreAggregator,
        methods: CreditMethodEngine,
        composer: SummaryComposer<'a>,
        fee_rates: FeeRates,
    ) -> Self {
        Self {
            aggregator,
            methods,
            composer,
            fee_rates,
        }
    }

    pub fn aggregator(&self) -> &QreAggregator {
        &self.aggregator
    }

    /// Computes one year against the given prior history (most recent first).
    pub fn compute(
        &self,
        inputs: &YearInputs,
        prior_years: &[PriorYear],
    ) -> YearFinancials {
        let qre = self.aggregator.aggregate(&inputs.qre_inputs(), &self.fee_rates);
        let comparison = self.methods.compare(&CreditMethodInputs {
            current_qre: qre.total_qre,
            prior_years,
            qualifying_activity_years: inputs.qualifying_activity_years,
        });

        let year = self
            .composer
            .compose_year(inputs, &qre, &comparison, &self.fee_rates);

        debug!(
            tax_year = year.tax_year,
            kind = ?year.kind,
            total_qre = %year.total_qre,
            asc = %year.asc_credit,
            traditional = %year.traditional_credit,
            best = year.best_method.as_str(),
            "computed year"
        );
        year
    }
}

/// Historical actuals normalised for lookup: most recent first, one entry per
/// year, every year before the tax year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    years: Vec<HistoricalYear>,
}

impl History {
    /// Normalises raw entries.
    ///
    /// Entries with `year == 0` are placed by position (the first entry is the
    /// year before `tax_year`). Entries at or after `tax_year` are dropped, and
    /// when a year appears twice the earlier entry wins. Amounts are clamped
    /// to `[0, MAX_AMOUNT]`.
    pub fn normalize(
        tax_year: i32,
        entries: &[HistoricalYear],
    ) -> Self {
        let mut years: Vec<HistoricalYear> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let year = if entry.year == 0 {
                    let position = i32::try_from(index).unwrap_or(i32::MAX);
                    tax_year.saturating_sub(1).saturating_sub(position)
                } else {
                    entry.year
                };

                if year >= tax_year {
                    warn!(year, tax_year, "historical year not before tax year; ignored");
                    return None;
                }

                Some(HistoricalYear {
                    year,
                    revenue: clamp_amount(entry.revenue),
                    w2_wages: clamp_amount(entry.w2_wages),
                    supply_spend: clamp_amount(entry.supply_spend),
                    contract_research_spend: clamp_amount(entry.contract_research_spend),
                })
            })
            .collect();

        years.sort_by(|a, b| b.year.cmp(&a.year));
        years.dedup_by_key(|entry| entry.year);

        Self { years }
    }

    pub fn years(&self) -> &[HistoricalYear] {
        &self.years
    }

    pub fn get(
        &self,
        year: i32,
    ) -> Option<&HistoricalYear> {
        self.years.iter().find(|entry| entry.year == year)
    }

    /// Historical years with positive revenue.
    pub fn receipt_years(&self) -> usize {
        self.years
            .iter()
            .filter(|entry| entry.revenue > Decimal::ZERO)
            .count()
    }
}

/// Rolling record of already-known years, used as prior history.
#[derive(Debug, Clone, Default)]
pub struct PriorWindow {
    years: BTreeMap<i32, PriorYear>,
}

impl PriorWindow {
    /// Seeds the window with historical actuals. Historical QRE is wages at
    /// the assessment's R&D percentage plus contract and supply QRE, without
    /// any service-fee QRE.
    pub fn from_history(
        history: &History,
        rd_wage_percentage: Decimal,
        aggregator: &QreAggregator,
    ) -> Self {
        let years = history
            .years()
            .iter()
            .map(|entry| {
                let qre = aggregator.aggregate(
                    &QreInputs {
                        total_wages: entry.w2_wages,
                        rd_wage_percentage,
                        contract_research_spend: entry.contract_research_spend,
                        supply_spend: entry.supply_spend,
                    },
                    &FeeRates::default(),
                );
                let prior = PriorYear {
                    tax_year: entry.year,
                    qre: qre.total_qre,
                    gross_receipts: entry.revenue,
                    wages: entry.w2_wages,
                };
                (entry.year, prior)
            })
            .collect();

        Self { years }
    }

    /// Adds (or replaces) a computed year.
    pub fn record(
        &mut self,
        year: &YearFinancials,
    ) {
        self.years.insert(
            year.tax_year,
            PriorYear {
                tax_year: year.tax_year,
                qre: year.total_qre,
                gross_receipts: year.gross_receipts,
                wages: year.total_wages,
            },
        );
    }

    /// The known years among the three before `tax_year`, most recent first.
    pub fn preceding(
        &self,
        tax_year: i32,
    ) -> Vec<PriorYear> {
        (1..=PRIOR_YEARS as i32)
            .filter_map(|offset| self.years.get(&tax_year.checked_sub(offset)?).cloned())
            .collect()
    }
}

/// Applies the year pipeline across future and lookback years.
#[derive(Debug, Clone)]
pub struct MultiYearProjector<'p, 'a> {
    pipeline: &'p YearPipeline<'a>,
    minimum_growth_rate: Decimal,
    lookback: LookbackPolicy,
}

impl<'p, 'a> MultiYearProjector<'p, 'a> {
    pub fn new(
        pipeline: &'p YearPipeline<'a>,
        minimum_growth_rate: Decimal,
        lookback: LookbackPolicy,
    ) -> Self {
        Self {
            pipeline,
            minimum_growth_rate,
            lookback,
        }
    }

    /// Requested growth (percent) as a fraction, floored at the minimum.
    pub fn effective_growth_rate(
        &self,
        growth_percent: Decimal,
    ) -> Decimal {
        floored_growth_rate(growth_percent, self.minimum_growth_rate)
    }

    /// Projects the three years after `current`, soonest first. Each
    /// projected year is recorded in `window` before the next is computed.
    pub fn project_future(
        &self,
        input: &AssessmentInput,
        current: &YearInputs,
        window: &mut PriorWindow,
    ) -> FutureProjection {
        let growth = self.effective_growth_rate(input.growth_rate);
        let mut factor = Decimal::ONE;
        let mut years = Vec::with_capacity(PROJECTION_YEARS as usize);

        for offset in 1..=PROJECTION_YEARS {
            factor *= Decimal::ONE + growth;
            let inputs = self.projected_inputs(current, &input.planned_initiatives, offset, factor);

            let year = self
                .pipeline
                .compute(&inputs, &window.preceding(inputs.tax_year));
            window.record(&year);
            years.push(year);
        }

        let total_credits = years.iter().map(|year| year.total_credit).sum();

        FutureProjection {
            years,
            total_credits,
            growth_rate_applied: growth,
        }
    }

    /// Figures for projected year `offset`, compounded by `factor`.
    fn projected_inputs(
        &self,
        current: &YearInputs,
        initiatives: &[PlannedInitiative],
        offset: u32,
        factor: Decimal,
    ) -> YearInputs {
        let compound = |value: Decimal| round_half_up(value * factor);

        let mut inputs = YearInputs {
            tax_year: current.tax_year.saturating_add_unsigned(offset),
            kind: YearKind::Projected,
            gross_receipts: compound(current.gross_receipts),
            total_wages: compound(current.total_wages),
            rd_wage_percentage: current.rd_wage_percentage,
            supply_spend: compound(current.supply_spend),
            contract_research_spend: compound(current.contract_research_spend),
            qualifying_activity_years: current.qualifying_activity_years.saturating_add(offset),
        };

        for initiative in initiatives
            .iter()
            .filter(|initiative| initiative.start_year_offset.max(1) <= offset)
        {
            let spend = clamp_amount(initiative.annual_spend);
            match initiative.category {
                SpendCategory::Wages => inputs.total_wages += spend,
                SpendCategory::Supplies => inputs.supply_spend += spend,
                SpendCategory::ContractResearch => inputs.contract_research_spend += spend,
            }
        }

        inputs
    }

    /// Computes every open lookback year, most recent first.
    pub fn lookback(
        &self,
        input: &AssessmentInput,
        tax_year: i32,
        history: &History,
        window: &PriorWindow,
    ) -> LookbackSummary {
        let years: Vec<YearFinancials> = (1..=self.lookback.max_years)
            .filter_map(|offset| {
                let year = tax_year.checked_sub_unsigned(offset)?;
                let entry = self.lookback_candidate(input, tax_year, history, year)?;
                let inputs = YearInputs {
                    tax_year: year,
                    kind: YearKind::Lookback,
                    gross_receipts: entry.revenue,
                    total_wages: entry.w2_wages,
                    rd_wage_percentage: input.rd_wage_percentage,
                    supply_spend: entry.supply_spend,
                    contract_research_spend: entry.contract_research_spend,
                    qualifying_activity_years: input.qualifying_activity_years.saturating_sub(offset),
                };
                Some(self.pipeline.compute(&inputs, &window.preceding(year)))
            })
            .collect();

        let total = years.iter().map(|year| year.total_credit).sum();
        let can_lookback = !years.is_empty();

        LookbackSummary {
            years,
            total,
            can_lookback,
        }
    }

    /// Historical entry for `year` when it is open for a lookback claim.
    fn lookback_candidate<'h>(
        &self,
        input: &AssessmentInput,
        tax_year: i32,
        history: &'h History,
        year: i32,
    ) -> Option<&'h HistoricalYear> {
        let Some(entry) = history.get(year) else {
            debug!(year, "no historical data; lookback year skipped");
            return None;
        };

        if entry.revenue <= Decimal::ZERO || entry.w2_wages <= Decimal::ZERO {
            debug!(year, "zero revenue or wages; lookback year skipped");
            return None;
        }

        if self.lookback.is_claimed(
            year,
            tax_year,
            input.rd_credit_years_previously_claimed,
            &input.claimed_tax_years,
        ) {
            debug!(year, "already claimed; lookback year skipped");
            return None;
        }

        Some(entry)
    }
}
