//! Messages exchanged between the HTTP surface and the invoice agent.
//!
//! The bus is a bounded channel. Every request carries a correlation id and
//! every reply echoes it, so replies can arrive in any order and through any
//! route (in process or by webhook).

use factura_domain::{ErrorFlags, ExtractedFields, InvoiceExtraction};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One invoice to extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    /// Ties the eventual reply to the waiting caller
    pub correlation_id: Uuid,
    /// Where the text came from (file name or caller-supplied path)
    pub path: String,
    /// Invoice text
    pub content: String,
}

impl InvoiceRequest {
    /// Create a request with a fresh correlation id
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Outcome of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    /// Fields and flags are present
    Success,
    /// `message` says what went wrong
    Error,
}

/// Reply to an `InvoiceRequest`, also the webhook payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceReply {
    /// Correlation id of the request
    pub correlation_id: Uuid,
    /// Outcome
    pub status: ReplyStatus,
    /// Extracted fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resultado: Option<ExtractedFields>,
    /// Per-field flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errores: Option<ErrorFlags>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InvoiceReply {
    /// Successful extraction
    pub fn success(correlation_id: Uuid, extraction: InvoiceExtraction) -> Self {
        Self {
            correlation_id,
            status: ReplyStatus::Success,
            resultado: Some(extraction.fields),
            errores: Some(extraction.errors),
            message: None,
        }
    }

    /// Failed extraction
    pub fn failure(correlation_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            correlation_id,
            status: ReplyStatus::Error,
            resultado: None,
            errores: None,
            message: Some(message.into()),
        }
    }
}

/// Sending half of the bus
pub type BusSender = mpsc::Sender<InvoiceRequest>;

/// Receiving half of the bus
pub type BusReceiver = mpsc::Receiver<InvoiceRequest>;

/// Create a bus holding at most `capacity` undelivered requests
pub fn channel(capacity: usize) -> (BusSender, BusReceiver) {
    mpsc::channel(capacity)
}
