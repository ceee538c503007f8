use std::io::Read;

use rnd_core::AssessmentInput;
use thiserror::Error;

/// Errors that can occur when loading an assessment snapshot.
#[derive(Debug, Error)]
pub enum AssessmentLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for AssessmentLoadError {
    fn from(err: serde_json::Error) -> Self {
        AssessmentLoadError::JsonParse(err.to_string())
    }
}

/// Loader for assessment snapshots stored as JSON.
///
/// Every field is optional: missing or `null` numbers load as zero and
/// missing or `null` lists as empty, so a half-completed questionnaire still
/// loads.
pub struct AssessmentLoader;

impl AssessmentLoader {
    /// Parse one assessment from a JSON reader.
    pub fn parse<R: Read>(reader: R) -> Result<AssessmentInput, AssessmentLoadError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse one assessment from a JSON string.
    pub fn parse_str(json: &str) -> Result<AssessmentInput, AssessmentLoadError> {
        Ok(serde_json::from_str(json)?)
    }
}
