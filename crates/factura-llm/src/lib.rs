//! Factura LLM Provider Layer
//!
//! Implementations of the `CompletionProvider` trait from `factura-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scripted mock for testing
//! - `ChatCompletionProvider`: OpenAI-style `/chat/completions` endpoint
//!
//! # Examples
//!
//! ```
//! use factura_llm::MockProvider;
//! use factura_domain::CompletionProvider;
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let provider = MockProvider::new("{\"pdf_total\": 0}");
//! let result = provider.complete("test prompt").await.unwrap();
//! assert_eq!(result, "{\"pdf_total\": 0}");
//! # });
//! ```

#![warn(missing_docs)]

pub mod chat;

use factura_domain::CompletionProvider;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use chat::{ChatCompletionProvider, ChatConfig};

/// Errors that can occur during completion calls
///
/// None of these are retried by the provider; the caller decides.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// The call exceeded the configured timeout
    #[error("Completion request timed out after {0}s")]
    Timeout(u64),

    /// Network or HTTP failure, with the server-provided body when present
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response envelope had no usable completion
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Mock completion provider for deterministic testing
///
/// Returns scripted responses in order, then falls back to a default
/// response. No network calls are made. Clones share the script and the
/// call counter.
///
/// # Examples
///
/// ```
/// use factura_llm::{LlmError, MockProvider};
///
/// let provider = MockProvider::new("default");
/// provider.push_response("first");
/// provider.push_error(LlmError::Transport("HTTP 503".to_string()));
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    call_count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Queue a response for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_script().push_back(Ok(response.into()));
    }

    /// Queue an error for the next unscripted call
    pub fn push_error(&self, error: LlmError) {
        self.lock_script().push_back(Err(error));
    }

    /// Sleep this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        // A poisoned script is still a valid queue
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let next = self.lock_script().pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        next.unwrap_or_else(|| Ok(self.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
