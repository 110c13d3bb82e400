//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use factura_extractor::ExtractorConfig;
use factura_llm::ChatConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Completion endpoint settings; the API key is never stored here
    #[serde(default)]
    pub llm: ChatConfig,

    /// Extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".factura").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.extractor.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Render as TOML. The API key is not serialized; a comment notes
    /// whether one is set.
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        let key_note = if self.llm.api_key.is_empty() {
            "# api_key: <not set>"
        } else {
            "# api_key: <redacted>"
        };

        Ok(format!("{}\n{}", key_note, body))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.llm.model, "asi1-mini");
        assert_eq!(config.extractor.max_attempts, 3);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factura.toml");
        fs::write(
            &path,
            "[settings]\nformat = \"json\"\ncolor = false\n\n[llm]\ntimeout_secs = 60\n\n[extractor]\nmax_attempts = 5\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(!config.settings.color);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.extractor.max_attempts, 5);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/nonexistent/factura.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_extractor_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factura.toml");
        fs::write(&path, "[extractor]\ncurrencies = [\"USD\", \"MXN\", \"EUR\"]\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(CliError::Config(_))));
    }

    #[test]
    fn test_to_toml_redacts_api_key() {
        let mut config = Config::default();
        config.llm.api_key = "sk-secret".to_string();

        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.starts_with("# api_key: <redacted>"));
        assert!(rendered.contains("[extractor]"));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.extractor, config.extractor);
        assert_eq!(parsed.llm.endpoint, config.llm.endpoint);
    }
}
