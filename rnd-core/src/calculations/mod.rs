//! R&D credit calculation stages.
//!
//! | Stage | Module |
//! |-------|--------|
//! | Eligibility gate | [`eligibility`] |
//! | QRE aggregation | [`qre`] |
//! | ASC vs. Traditional | [`credit_method`] |
//! | Future and lookback years | [`projector`] |
//! | Credit split, fees, ROI, totals | [`summary`] |
//! | Orchestration | [`engine`] |
//!
//! Money is `rust_decimal::Decimal` throughout and every published amount is
//! rounded half-up to the cent.

pub mod common;
pub mod credit_method;
pub mod eligibility;
pub mod engine;
pub mod projector;
pub mod qre;
pub mod summary;

pub use credit_method::{CreditMethodEngine, CreditMethodInputs, MethodComparison, PriorYear};
pub use eligibility::{DisqualifierSelection, EligibilityGate, EligibilityOutcome};
pub use engine::CreditEngine;
pub use projector::{History, MultiYearProjector, PriorWindow, YearInputs, YearPipeline};
pub use qre::{FeeRates, QreAggregator, QreBreakdown, QreInputs};
pub use summary::{SummaryComposer, Timeline};
