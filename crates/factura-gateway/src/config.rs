//! Configuration file parsing for the Gateway.
//!
//! Loads bind settings, reply handling, and the nested completion and
//! extractor sections from TOML. The API key is never read from the file.

use factura_extractor::ExtractorConfig;
use factura_llm::ChatConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Gateway configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A setting has an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Gateway configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// How long an upload waits for its extraction reply
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,

    /// Requests the bus holds before senders wait
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Callback URL for replies; unset resolves replies in process
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Completion endpoint settings
    #[serde(default)]
    pub llm: ChatConfig,

    /// Extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

/// Default reply timeout: 5 minutes
fn default_reply_timeout() -> u64 {
    300
}

fn default_bus_capacity() -> usize {
    64
}

/// Default upload limit: 20 MiB
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything except the API key, which arrives later
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "reply_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bus_capacity must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "webhook_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        self.extractor.validate().map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Reply timeout as a Duration
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            reply_timeout_secs: default_reply_timeout(),
            bus_capacity: default_bus_capacity(),
            max_upload_bytes: default_max_upload_bytes(),
            webhook_url: None,
            llm: ChatConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.reply_timeout(), Duration::from_secs(300));
        assert!(config.webhook_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            reply_timeout_secs = 60
            webhook_url = "http://127.0.0.1:9000/api/webhook"

            [llm]
            model = "asi1-extended"
            timeout_secs = 45

            [extractor]
            max_attempts = 2
            home_tax_id = "XYZ010101AB1"
        "#;

        let config = GatewayConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.reply_timeout_secs, 60);
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("http://127.0.0.1:9000/api/webhook")
        );
        assert_eq!(config.llm.model, "asi1-extended");
        assert_eq!(config.llm.timeout_secs, 45);
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.extractor.max_attempts, 2);
        assert_eq!(config.extractor.currencies, vec!["USD", "MXN"]);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = GatewayConfig::from_toml("").unwrap();
        assert_eq!(config.bind_port, 8000);
        assert_eq!(config.bus_capacity, 64);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(GatewayConfig::from_toml("reply_timeout_secs = 0").is_err());
        assert!(GatewayConfig::from_toml("webhook_url = \"ftp://x\"").is_err());
        assert!(GatewayConfig::from_toml("[extractor]\nhome_tax_id = \"bad\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "bind_port = 8123\n").unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.bind_port, 8123);

        assert!(matches!(
            GatewayConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::FileRead(_))
        ));
    }
}
