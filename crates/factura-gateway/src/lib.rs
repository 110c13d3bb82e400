//! Factura Gateway
//!
//! HTTP front door for invoice extraction. Requests are published on an
//! in-process bus, an invoice agent runs the extractor, and each reply is
//! matched back to its caller by correlation id, either directly or through
//! the `/api/webhook` callback.

#![warn(missing_docs)]

pub mod agent;
pub mod bus;
pub mod config;
pub mod handlers;
pub mod pending;

use agent::{InvoiceAgent, ReplySink};
use axum::Router;
use config::GatewayConfig;
use factura_domain::CompletionProvider;
use factura_extractor::{Extractor, ExtractorError};
use factura_llm::{ChatCompletionProvider, LlmError};
use handlers::{create_router, AppState};
use pending::PendingReplies;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Completion provider could not be built
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Extractor could not be built
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Webhook client could not be built
    #[error("Webhook client error: {0}")]
    Webhook(#[from] reqwest::Error),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire the bus, pending registry, and invoice agent around an extractor
///
/// Must be called inside a tokio runtime: the agent is spawned here.
/// Webhook deliveries time out after the reply timeout.
pub fn build_app<P>(
    extractor: Extractor<P>,
    config: &GatewayConfig,
) -> Result<Router, GatewayError>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync + 'static,
{
    let pending = Arc::new(PendingReplies::new());
    let (bus, requests) = bus::channel(config.bus_capacity);

    let sink = match &config.webhook_url {
        Some(url) => ReplySink::webhook(url.clone(), config.reply_timeout())?,
        None => ReplySink::Direct(Arc::clone(&pending)),
    };
    InvoiceAgent::new(Arc::new(extractor), sink).spawn(requests);

    let state = AppState {
        bus,
        pending,
        reply_timeout: config.reply_timeout(),
    };

    Ok(create_router(state, config.max_upload_bytes))
}

/// Start the Gateway HTTP server
///
/// Builds the chat-completion provider and extractor from configuration,
/// starts the invoice agent, and serves until the process stops.
pub async fn start_server(config: GatewayConfig) -> Result<(), GatewayError> {
    config.validate()?;

    info!("Starting Factura Gateway");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {} at {}", config.llm.model, config.llm.endpoint);
    info!("Reply timeout: {} seconds", config.reply_timeout_secs);
    match &config.webhook_url {
        Some(url) => info!("Replies via webhook: {}", url),
        None => info!("Replies delivered in process"),
    }

    let provider = ChatCompletionProvider::new(config.llm.clone())?;
    let extractor = Extractor::new(provider, config.extractor.clone())?;
    let app = build_app(extractor, &config)?;

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Gateway listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_server_requires_api_key() {
        let result = start_server(GatewayConfig::default()).await;
        assert!(matches!(result, Err(GatewayError::Provider(LlmError::Config(_)))));
    }
}
