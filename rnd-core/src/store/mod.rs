//! Seam through which assessments and their results reach an external store.
//!
//! The engine never persists anything itself. Callers pick a backend by name
//! through a [`StoreRegistry`]; only the in-memory backend ships here.

pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use memory::{MemoryStore, MemoryStoreFactory};
pub use repository::{AssessmentKey, AssessmentRecord, AssessmentStore, StoreError};
