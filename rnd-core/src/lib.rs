//! R&D tax credit calculation engine.
//!
//! [`CreditEngine::calculate`] turns an [`AssessmentInput`] snapshot into a
//! [`CalculationResult`]: eligibility, current-year credit under the better of
//! ASC and Traditional, three projected years, up to three lookback years and
//! the fee / ROI summary. [`MemoizedEngine`] skips recomputation for an
//! unchanged snapshot, and the [`store`] module is the seam to an external
//! assessment store.

pub mod cache;
pub mod calculations;
pub mod config;
pub mod models;
pub mod store;

pub use cache::{ContentHash, HashError, MemoizedEngine};
pub use calculations::CreditEngine;
pub use config::{ClaimMapping, EngineConfig, EngineConfigError, LookbackPolicy};
pub use models::*;
pub use store::{AssessmentKey, AssessmentRecord, AssessmentStore, StoreError};
