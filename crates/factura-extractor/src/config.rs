//! Configuration for the Extractor

use crate::error::ExtractorError;
use crate::scanner::is_tax_id;
use factura_domain::TaxId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tax ID of the organization running the extractor
pub const DEFAULT_HOME_TAX_ID: &str = "FHM190118EN7";

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Completions requested per invoice before giving up on malformed JSON
    pub max_attempts: u32,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Own tax ID; when found in an invoice it becomes the receiver.
    /// Empty disables the rule.
    pub home_tax_id: String,

    /// The two currency codes the model must standardize to
    pub currencies: Vec<String>,
}

impl ExtractorConfig {
    /// The home tax ID, if one is configured
    pub fn home_tax_id(&self) -> Option<TaxId> {
        let value = self.home_tax_id.trim();
        (!value.is_empty()).then(|| TaxId::new(value))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if let Some(home) = self.home_tax_id() {
            if !is_tax_id(home.as_str()) {
                return Err(format!("home_tax_id '{}' is not a valid tax ID", home));
            }
        }
        if self.currencies.len() != 2 {
            return Err(format!(
                "exactly two currencies are required, got {}",
                self.currencies.len()
            ));
        }
        if self.currencies.iter().any(|code| code.trim().is_empty()) {
            return Err("currency codes cannot be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtractorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_text_length: 50_000,
            home_tax_id: DEFAULT_HOME_TAX_ID.to_string(),
            currencies: vec!["USD".to_string(), "MXN".to_string()],
        }
    }
}
