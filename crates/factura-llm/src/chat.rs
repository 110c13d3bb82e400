//! Chat-completion provider
//!
//! Talks to an OpenAI-style `/chat/completions` endpoint (ASI1 by default).
//!
//! # Features
//!
//! - Async HTTP communication, one request per prompt
//! - Bearer-token authorization
//! - Timeout handling (30 seconds by default)
//! - Envelope validation: a missing or blank completion is an error
//!
//! There is no retry here. The extractor owns the retry policy.
//!
//! # Examples
//!
//! ```no_run
//! use factura_llm::{ChatCompletionProvider, ChatConfig};
//!
//! let config = ChatConfig::with_api_key("sk-...");
//! let provider = ChatCompletionProvider::new(config).unwrap();
//! ```

use crate::LlmError;
use factura_domain::CompletionProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default chat-completion endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.asi1.ai/v1/chat/completions";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "asi1-mini";

/// Default timeout for completion requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on output tokens
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Settings for the chat-completion endpoint
///
/// The API key is never serialized; it is supplied from the environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Full URL of the chat-completion endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token
    #[serde(skip)]
    pub api_key: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ChatConfig {
    /// Default settings with the given API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("api_key must not be empty".to_string());
        }
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Chat-completion API provider
pub struct ChatCompletionProvider {
    config: ChatConfig,
    client: reqwest::Client,
}

/// Request body for the chat-completion API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    stream: bool,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response envelope from the chat-completion API
///
/// Every level is optional so that a malformed envelope is reported as
/// `InvalidResponse` rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// Pull the first completion's text out of the envelope
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if there are no choices, the first choice
    /// has no message content, or the content is blank.
    pub fn into_content(self) -> Result<String, LlmError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse("API returned no completion choices".to_string())
        })?;

        let content = choice
            .message
            .and_then(|message| message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponse("Completion has no message content".to_string())
            })?;

        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse(
                "API returned empty completion content".to_string(),
            ));
        }

        Ok(content)
    }
}

impl ChatCompletionProvider {
    /// Create a new chat-completion provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ChatConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the provider configuration
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Send one prompt and return the completion text
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The request exceeds the timeout (`Timeout`)
    /// - The network call fails or the server answers non-2xx (`Transport`)
    /// - The envelope has no usable completion (`InvalidResponse`)
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stream: false,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            "Sending completion request to {} (model {}, prompt {} chars)",
            self.config.endpoint,
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error_text = error_text.trim();
            return Err(LlmError::Transport(if error_text.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, error_text)
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let envelope: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        envelope.into_content()
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::Transport(format!("Request failed: {}", e))
        }
    }
}

impl CompletionProvider for ChatCompletionProvider {
    type Error = LlmError;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        ChatCompletionProvider::complete(self, prompt).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
