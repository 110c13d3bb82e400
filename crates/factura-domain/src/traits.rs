//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::future::Future;

/// Trait for chat-completion providers
///
/// Implemented by the infrastructure layer (factura-llm). One call sends one
/// prompt and resolves to the text of a single completion. Implementations
/// must not retry internally; retry policy belongs to the caller.
pub trait CompletionProvider {
    /// Error type for completion operations
    type Error;

    /// Send a prompt and return the completion text
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Model identifier, for logging and diagnostics
    fn model_name(&self) -> &str;
}
