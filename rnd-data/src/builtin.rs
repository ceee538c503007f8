//! State credit table shipped with the crate.

use std::sync::{Arc, OnceLock};

use rnd_core::StateCreditTable;

use crate::loader::{StateCreditLoader, StateCreditLoaderError};

/// Version tag of the embedded table.
pub const BUILTIN_VERSION: &str = "2025.1";

const BUILTIN_CSV: &str = include_str!("../data/state_credits.csv");

static BUILTIN: OnceLock<Arc<StateCreditTable>> = OnceLock::new();

/// The embedded state credit table, parsed on first use and shared after.
pub fn builtin_state_table() -> Result<Arc<StateCreditTable>, StateCreditLoaderError> {
    if let Some(table) = BUILTIN.get() {
        return Ok(Arc::clone(table));
    }

    let table = Arc::new(StateCreditLoader::load(BUILTIN_VERSION, BUILTIN_CSV.as_bytes())?);
    Ok(Arc::clone(BUILTIN.get_or_init(|| table)))
}
