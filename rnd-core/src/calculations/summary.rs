//! Summary composition: credit split, fees, return on fees and result totals.
//!
//! # Per-year figures
//!
//! The chosen credit (higher of ASC / Traditional) is split into a state
//! part and a federal part; the two always add back up to the chosen credit.
//!
//! | Figure | Formula |
//! |--------|---------|
//! | State credit | state method (below), capped at the chosen credit; 0 without a program |
//! | Federal credit | chosen credit − state credit |
//! | Total credit | chosen credit |
//! | Federal fee | pre-fee QRE × federal fee rate |
//! | State fee | fee baseline − federal fee |
//! | Net benefit | chosen credit − total fees |
//! | ROI | chosen credit / total fees, 0 when no fees |
//!
//! State credit methods:
//!
//! | Method | Credit |
//! |--------|--------|
//! | `flat_qre` | rate × total QRE |
//! | `excess_over_average` | rate × max(0, total QRE − average prior QRE) |
//! | `percent_of_federal` | rate × chosen credit |
//!
//! # Result totals
//!
//! `total_credit` and `total_value_n_years` sum the chosen credit of every
//! computed year (current, projected and lookback); `total_fees` sums the
//! same years, and `roi` is `total_credit / total_fees`.
//!
//! # Qualified small business
//!
//! A business with current gross receipts under $5M and no more than five
//! years of gross receipts may apply up to $500,000 of the federal credit
//! against payroll tax.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::common::{non_negative, round_half_up, safe_div};
use crate::calculations::credit_method::MethodComparison;
use crate::calculations::eligibility::EligibilityOutcome;
use crate::calculations::projector::YearInputs;
use crate::calculations::qre::{FeeRates, QreBreakdown};
use crate::models::{
    CalculationResult, FeeBreakdown, FutureProjection, LookbackSummary, QsbAssessment,
    StateCreditMethod, StateCreditRow, StateCreditSummary, YearFinancials,
};

/// Current-year gross receipts must be below this for QSB status.
pub const QSB_GROSS_RECEIPTS_LIMIT: Decimal = dec!(5000000);

/// Maximum number of years with gross receipts for QSB status.
pub const QSB_MAX_RECEIPT_YEARS: usize = 5;

/// Annual payroll-tax offset cap for a qualified small business.
pub const QSB_MAX_PAYROLL_OFFSET: Decimal = dec!(500000);

/// Every computed year of one assessment.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub current_year: YearFinancials,
    pub future: FutureProjection,
    pub lookback: LookbackSummary,
}

/// Composes per-year financials and the final result.
#[derive(Debug, Clone, Copy)]
pub struct SummaryComposer<'a> {
    program: Option<&'a StateCreditRow>,
}

impl<'a> SummaryComposer<'a> {
    /// `program` is the state's row when the state runs a credit program.
    pub fn new(program: Option<&'a StateCreditRow>) -> Self {
        Self { program }
    }

    /// Whether a state credit (and with it a state fee) applies.
    pub fn has_state_program(&self) -> bool {
        self.program.is_some()
    }

    /// Builds the full figures for one year.
    pub fn compose_year(
        &self,
        inputs: &YearInputs,
        qre: &QreBreakdown,
        comparison: &MethodComparison,
        fee_rates: &FeeRates,
    ) -> YearFinancials {
        let chosen_credit = comparison.chosen_credit();
        let state_credit = self.state_credit(qre, comparison, chosen_credit);
        let federal_credit = chosen_credit - state_credit;
        let total_credit = chosen_credit;

        let fees = self.fees(qre, fee_rates);
        let net_benefit = chosen_credit - fees.total;
        let roi = self.roi(chosen_credit, fees.total);

        YearFinancials {
            tax_year: inputs.tax_year,
            kind: inputs.kind,
            gross_receipts: inputs.gross_receipts,
            total_wages: inputs.total_wages,
            supply_spend: inputs.supply_spend,
            contract_research_spend: inputs.contract_research_spend,
            qualified_wages: qre.qualified_wages,
            contract_research_qre: qre.contract_research_qre,
            supply_qre: qre.supply_qre,
            service_fee_qre: qre.service_fee_qre,
            total_qre: qre.total_qre,
            asc_credit: comparison.asc_credit,
            traditional_credit: comparison.traditional_credit,
            asc_rate: comparison.asc_rate,
            traditional_base: comparison.traditional_base,
            average_prior_qre: comparison.average_prior_qre,
            traditional_available: comparison.traditional_available,
            best_method: comparison.best_method,
            chosen_credit,
            federal_credit,
            state_credit,
            total_credit,
            fees,
            net_benefit,
            roi,
        }
    }

    /// State share of the chosen credit under the program's method.
    fn state_credit(
        &self,
        qre: &QreBreakdown,
        comparison: &MethodComparison,
        chosen_credit: Decimal,
    ) -> Decimal {
        let Some(program) = self.program else {
            return Decimal::ZERO;
        };

        let base = match program.method {
            StateCreditMethod::FlatQre => qre.total_qre,
            StateCreditMethod::ExcessOverAverage => {
                non_negative(qre.total_qre - comparison.average_prior_qre)
            }
            StateCreditMethod::PercentOfFederal => chosen_credit,
        };
        round_half_up(base * non_negative(program.credit_rate)).min(non_negative(chosen_credit))
    }

    /// Splits the fee baseline into its federal and state parts.
    fn fees(
        &self,
        qre: &QreBreakdown,
        fee_rates: &FeeRates,
    ) -> FeeBreakdown {
        let federal_fee = round_half_up(qre.pre_fee_qre * non_negative(fee_rates.federal))
            .min(qre.fee_baseline);
        let state_fee = non_negative(qre.fee_baseline - federal_fee);

        FeeBreakdown {
            federal_fee,
            state_fee,
            total: qre.fee_baseline,
        }
    }

    /// Credit returned per dollar of fees, to two places.
    fn roi(
        &self,
        credit: Decimal,
        fees: Decimal,
    ) -> Decimal {
        round_half_up(safe_div(credit, fees))
    }

    /// State program facts reported alongside the result.
    pub fn state_summary(
        &self,
        state_code: &str,
    ) -> StateCreditSummary {
        match self.program {
            Some(program) => StateCreditSummary {
                state_code: program.state_code.clone(),
                program_available: true,
                credit_rate: program.credit_rate,
                method: Some(program.method),
            },
            None => StateCreditSummary {
                state_code: state_code.trim().to_ascii_uppercase(),
                ..StateCreditSummary::default()
            },
        }
    }

    /// Qualified small business payroll offset.
    ///
    /// `prior_receipt_years` counts historical years with positive revenue.
    pub fn qsb(
        &self,
        current_year: &YearFinancials,
        prior_receipt_years: usize,
        has_disqualifier: bool,
    ) -> QsbAssessment {
        let current_receipt_year = usize::from(current_year.gross_receipts > Decimal::ZERO);
        let receipt_years = prior_receipt_years + current_receipt_year;

        let eligible = !has_disqualifier
            && current_year.gross_receipts < QSB_GROSS_RECEIPTS_LIMIT
            && receipt_years <= QSB_MAX_RECEIPT_YEARS;

        if !eligible {
            return QsbAssessment::default();
        }

        QsbAssessment {
            eligible,
            max_payroll_offset: QSB_MAX_PAYROLL_OFFSET,
            applicable_offset: current_year.federal_credit.min(QSB_MAX_PAYROLL_OFFSET),
        }
    }

    /// Assembles the final result and its multi-year totals.
    pub fn compose(
        &self,
        tax_year: i32,
        eligibility: EligibilityOutcome,
        timeline: Timeline,
        state: StateCreditSummary,
        qsb: QsbAssessment,
    ) -> CalculationResult {
        let Timeline {
            current_year,
            future,
            lookback,
        } = timeline;

        let mut result = CalculationResult {
            tax_year,
            is_qualified: eligibility.is_qualified,
            has_disqualifier: eligibility.has_disqualifier,
            qualification_score: eligibility.qualification_score,
            disqualifiers: eligibility.disqualifiers,
            missing_requirements: eligibility.missing_requirements,
            total_credit: Decimal::ZERO,
            current_year,
            future,
            lookback,
            state,
            qsb,
            total_fees: Decimal::ZERO,
            roi: Decimal::ZERO,
            total_value_n_years: Decimal::ZERO,
        };

        let (total_value, total_fees) = result
            .all_years()
            .fold((Decimal::ZERO, Decimal::ZERO), |(value, fees), year| {
                (value + year.total_credit, fees + year.fees.total)
            });

        result.total_credit = total_value;
        result.total_value_n_years = total_value;
        result.total_fees = total_fees;
        result.roi = self.roi(total_value, total_fees);
        result
    }
}
