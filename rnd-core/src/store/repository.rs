use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AssessmentInput, CalculationResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Assessment not found: {0}")]
    NotFound(AssessmentKey),

    #[error("Assessment already exists: {0}")]
    AlreadyExists(AssessmentKey),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Identifies one client's assessment within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentKey {
    pub tenant_id: String,
    pub client_id: String,
}

impl AssessmentKey {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
        }
    }
}

impl fmt::Display for AssessmentKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.client_id)
    }
}

/// A stored snapshot together with the result computed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub key: AssessmentKey,
    pub input: AssessmentInput,
    pub result: CalculationResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Stores a new assessment; fails if the key is already present.
    async fn create(
        &self,
        key: AssessmentKey,
        input: AssessmentInput,
        result: CalculationResult,
    ) -> Result<AssessmentRecord, StoreError>;

    /// Replaces the snapshot and result of an existing assessment.
    async fn update(
        &self,
        key: &AssessmentKey,
        input: AssessmentInput,
        result: CalculationResult,
    ) -> Result<AssessmentRecord, StoreError>;

    async fn get(
        &self,
        key: &AssessmentKey,
    ) -> Result<AssessmentRecord, StoreError>;

    /// Every assessment of a tenant, ordered by client id.
    async fn list_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<AssessmentRecord>, StoreError>;

    /// Updates the assessment when it exists, creates it when the lookup
    /// reports `NotFound`. Any other lookup error is returned as is.
    async fn save(
        &self,
        key: AssessmentKey,
        input: AssessmentInput,
        result: CalculationResult,
    ) -> Result<AssessmentRecord, StoreError> {
        match self.get(&key).await {
            Ok(_) => self.update(&key, input, result).await,
            Err(StoreError::NotFound(_)) => self.create(key, input, result).await,
            Err(err) => Err(err),
        }
    }
}
