use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::factory::{StoreConfig, StoreFactory};
use super::repository::{AssessmentKey, AssessmentRecord, AssessmentStore, StoreError};
use crate::models::{AssessmentInput, CalculationResult};

/// Process-local store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<AssessmentKey, AssessmentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn create(
        &self,
        key: AssessmentKey,
        input: AssessmentInput,
        result: CalculationResult,
    ) -> Result<AssessmentRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let now = Utc::now();
        let record = AssessmentRecord {
            key: key.clone(),
            input,
            result,
            created_at: now,
            updated_at: now,
        };
        records.insert(key, record.clone());

        debug!(key = %record.key, "assessment created");
        Ok(record)
    }

    async fn update(
        &self,
        key: &AssessmentKey,
        input: AssessmentInput,
        result: CalculationResult,
    ) -> Result<AssessmentRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        record.input = input;
        record.result = result;
        record.updated_at = Utc::now();

        debug!(key = %key, "assessment updated");
        Ok(record.clone())
    }

    async fn get(
        &self,
        key: &AssessmentKey,
    ) -> Result<AssessmentRecord, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        records
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<AssessmentRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .values()
            .filter(|record| record.key.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

/// Factory for the `"memory"` backend.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Box<dyn AssessmentStore>, StoreError> {
        Ok(Box::new(MemoryStore::new()))
    }
}
