//! Error types for the Extractor

use factura_domain::FieldName;
use factura_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only `MalformedJson` is the outcome of a retry loop; every other variant
/// is surfaced the first time it happens.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Input text is empty or whitespace-only
    #[error("Invoice text is empty")]
    EmptyInput,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// The completion call failed
    #[error("Completion error: {0}")]
    Completion(#[from] LlmError),

    /// No JSON object could be located in any completion
    #[error("Malformed JSON after {attempts} attempt(s): {reason}")]
    MalformedJson {
        /// Completions requested before giving up
        attempts: u32,
        /// Parse failure of the last completion
        reason: String,
        /// Raw text of the last completion
        last_response: String,
    },

    /// A field value has a type that cannot be coerced
    #[error("Cannot coerce field {field}: {value}")]
    Coercion {
        /// Offending field
        field: FieldName,
        /// The value as it appeared in the completion
        value: String,
    },

    /// A requested field is absent from the completion
    #[error("Missing field in completion: {0}")]
    MissingField(FieldName),

    /// PDF bytes could not be read
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ExtractorError {
    fn from(e: toml::de::Error) -> Self {
        ExtractorError::Config(format!("Failed to parse TOML: {}", e))
    }
}

/// Failure to locate a JSON object in a completion
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ParseError(pub String);

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError(format!("JSON parse error: {}", e))
    }
}
