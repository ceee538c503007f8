use std::fs;
use std::path::Path;

use rnd_core::{EngineConfig, EngineConfigError};
use thiserror::Error;

/// Errors that can occur when loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Cannot read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] EngineConfigError),
}

impl From<toml::de::Error> for ConfigLoadError {
    fn from(err: toml::de::Error) -> Self {
        ConfigLoadError::TomlParse(err.to_string())
    }
}

/// Loader for [`EngineConfig`] stored as TOML.
///
/// ```toml
/// default_tax_year = 2025
/// minimum_growth_rate = "0.05"
///
/// [lookback]
/// claim_mapping = "either"
/// max_years = 3
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn parse(toml: &str) -> Result<EngineConfig, ConfigLoadError> {
        let config: EngineConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<EngineConfig, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::parse(&contents)
    }
}
