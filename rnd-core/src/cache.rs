//! Content-hash memoization of engine results.
//!
//! A snapshot is identified by the Blake3 hash of its JSON encoding. Every
//! collection in [`AssessmentInput`] is ordered (`Vec` or `BTreeSet`), so equal
//! snapshots always encode to the same bytes.
//!
//! [`MemoizedEngine`] remembers the most recent snapshot only. Callers that
//! change reference data or configuration must build a new engine or call
//! [`MemoizedEngine::invalidate`].

use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::engine::CreditEngine;
use crate::models::{AssessmentInput, CalculationResult};

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A 32-byte Blake3 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hashes raw bytes.
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hashes the JSON encoding of `value`.
    ///
    /// # Errors
    /// Returns [`HashError::Encode`] if `value` cannot be serialized.
    pub fn of<T>(value: &T) -> Result<Self, HashError>
    where
        T: Serialize,
    {
        let json = serde_json::to_vec(value)?;
        Ok(Self::compute(&json))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// [`CreditEngine`] wrapper that skips recomputation for an unchanged snapshot.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rnd_core::{AssessmentInput, CreditEngine, EngineConfig, MemoizedEngine, StateCreditTable};
///
/// let engine = CreditEngine::new(EngineConfig::default(), Arc::new(StateCreditTable::default()))
///     .unwrap();
/// let memo = MemoizedEngine::new(engine);
/// let input = AssessmentInput::default();
///
/// let first = memo.calculate(&input);
/// let second = memo.calculate(&input.clone());
///
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct MemoizedEngine {
    engine: CreditEngine,
    last: Mutex<Option<(ContentHash, Arc<CalculationResult>)>>,
}

impl MemoizedEngine {
    pub fn new(engine: CreditEngine) -> Self {
        Self {
            engine,
            last: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &CreditEngine {
        &self.engine
    }

    /// Returns the cached result when `input` hashes to the last snapshot,
    /// otherwise computes and caches a fresh one.
    pub fn calculate(
        &self,
        input: &AssessmentInput,
    ) -> Arc<CalculationResult> {
        let hash = match ContentHash::of(input) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(error = %err, "snapshot could not be hashed; computing uncached");
                return Arc::new(self.engine.calculate(input));
            }
        };

        if let Some(cached) = self.cached(&hash) {
            debug!(hash = %hash.short(), "snapshot unchanged; cached result reused");
            return cached;
        }

        let result = Arc::new(self.engine.calculate(input));
        *self.lock() = Some((hash, Arc::clone(&result)));
        debug!(hash = %hash.short(), "result cached");
        result
    }

    /// Hash of the snapshot currently cached, if any.
    pub fn cached_hash(&self) -> Option<ContentHash> {
        self.lock().as_ref().map(|(hash, _)| *hash)
    }

    /// Drops the cached result so the next call recomputes.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    fn cached(
        &self,
        hash: &ContentHash,
    ) -> Option<Arc<CalculationResult>> {
        match self.lock().as_ref() {
            Some((cached_hash, result)) if cached_hash == hash => Some(Arc::clone(result)),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(ContentHash, Arc<CalculationResult>)>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
