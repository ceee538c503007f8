//! Reference data, snapshot loading and process setup for the R&D credit
//! engine.
//!
//! | Module         | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | [`loader`]     | State credit table from CSV                         |
//! | [`builtin`]    | State credit table embedded in the binary           |
//! | [`assessment`] | Assessment snapshots from JSON                      |
//! | [`config`]     | Engine configuration from TOML                      |
//! | [`logging`]    | `tracing` subscriber for the `rnd-credit` tool      |

pub mod assessment;
pub mod builtin;
pub mod config;
pub mod loader;
pub mod logging;

pub use assessment::{AssessmentLoadError, AssessmentLoader};
pub use builtin::{BUILTIN_VERSION, builtin_state_table};
pub use config::{ConfigLoadError, ConfigLoader};
pub use loader::{StateCreditLoader, StateCreditLoaderError, StateCreditRecord};
pub use logging::init_logging;
