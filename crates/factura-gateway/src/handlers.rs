//! HTTP request handlers for the Gateway service.
//!
//! Uploads and text submissions are published on the bus and held open until
//! the matching reply arrives. Replies arrive in process or on `/api/webhook`.

use crate::bus::{BusSender, InvoiceReply, InvoiceRequest, ReplyStatus};
use crate::pending::{PendingError, PendingReplies};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use factura_domain::{ErrorFlags, ExtractedFields};
use factura_extractor::{pdf, ExtractorError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Publishes extraction requests
    pub bus: BusSender,
    /// Requests waiting for their reply
    pub pending: Arc<PendingReplies>,
    /// How long a request waits for its reply
    pub reply_timeout: Duration,
}

/// Body of `/extract-text`
#[derive(Debug, Deserialize)]
pub struct ExtractTextRequest {
    /// Label for logs and replies
    #[serde(default = "default_path")]
    pub path: String,
    /// Invoice text
    pub content: String,
}

fn default_path() -> String {
    "inline".to_string()
}

/// Response of the upload, text, and webhook routes
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    /// "received" or "error"
    pub status: String,
    /// Human-readable note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extracted fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resultado: Option<ExtractedFields>,
    /// Per-field flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errores: Option<ErrorFlags>,
}

impl ApiResponse {
    fn received(
        message: Option<String>,
        resultado: Option<ExtractedFields>,
        errores: Option<ErrorFlags>,
    ) -> Self {
        Self {
            status: "received".to_string(),
            message,
            resultado,
            errores,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            resultado: None,
            errores: None,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "healthy" while the server answers
    pub status: String,
    /// Requests waiting for a reply
    pub pending_requests: usize,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed request
    BadRequest(String),
    /// Unknown correlation id
    NotFound(String),
    /// The waiting request is gone
    Gone(String),
    /// No reply in time
    Timeout(String),
    /// The agent is not consuming the bus
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<PendingError> for AppError {
    fn from(e: PendingError) -> Self {
        match e {
            PendingError::NotFound(_) => AppError::NotFound(e.to_string()),
            PendingError::Closed(_) => AppError::Gone(e.to_string()),
            PendingError::TimedOut(_, _) => AppError::Timeout(e.to_string()),
        }
    }
}

/// Publish a request and wait for its reply
async fn round_trip(state: &AppState, request: InvoiceRequest) -> Result<Json<ApiResponse>, AppError> {
    let handle = state.pending.register(request.correlation_id);

    state
        .bus
        .send(request)
        .await
        .map_err(|_| AppError::Unavailable("Invoice agent is not running".to_string()))?;

    let reply = handle.wait(state.reply_timeout).await?;

    Ok(Json(match reply.status {
        ReplyStatus::Success => ApiResponse::received(None, reply.resultado, reply.errores),
        ReplyStatus::Error => ApiResponse::error(
            reply.message.unwrap_or_else(|| "Extraction failed".to_string()),
        ),
    }))
}

/// POST /upload-pdf - Extract an uploaded PDF invoice
async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    info!("Received {} ({} bytes)", file_name, bytes.len());

    let text = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
        .await
        .map_err(|e| ExtractorError::Pdf(format!("Task join error: {}", e)))
        .and_then(|result| result)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if text.trim().is_empty() {
        warn!("No text found in {}", file_name);
        return Ok(Json(ApiResponse::error(
            "No text could be extracted from the PDF",
        )));
    }

    round_trip(&state, InvoiceRequest::new(file_name, text)).await
}

/// POST /extract-text - Extract invoice text supplied as JSON
async fn extract_text(
    State(state): State<AppState>,
    Json(body): Json<ExtractTextRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    round_trip(&state, InvoiceRequest::new(body.path, body.content)).await
}

/// POST /api/webhook - Receive an extraction reply
async fn webhook(State(state): State<AppState>, body: Bytes) -> Result<Json<ApiResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Empty request body".to_string()));
    }

    let reply: InvoiceReply = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {}", e)))?;

    let resultado = reply.resultado.clone();
    let errores = reply.errores;

    state.pending.resolve(reply).map_err(|e| {
        warn!("Webhook reply not delivered: {}", e);
        AppError::from(e)
    })?;

    Ok(Json(ApiResponse::received(
        Some("Webhook processed successfully".to_string()),
        resultado,
        errores,
    )))
}

/// GET /health - Liveness and queue depth
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        pending_requests: state.pending.len(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState, max_upload_bytes: usize) -> AxumRouter {
    AxumRouter::new()
        .route("/upload-pdf", post(upload_pdf))
        .route("/extract-text", post(extract_text))
        .route("/api/webhook", post(webhook))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{channel, BusReceiver};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    /// State whose bus accepts requests but nothing answers them
    fn create_test_state() -> (AppState, BusReceiver) {
        let (bus, rx) = channel(4);
        let state = AppState {
            bus,
            pending: Arc::new(PendingReplies::new()),
            reply_timeout: Duration::from_millis(50),
        };
        (state, rx)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _rx) = create_test_state();
        let app = create_router(state, 1024);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let (state, _rx) = create_test_state();
        let pending = Arc::clone(&state.pending);
        let app = create_router(state, 1024);

        let request = Request::builder()
            .method("POST")
            .uri("/extract-text")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"path": "a.txt", "content": "FACTURA"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_closed_bus_is_unavailable() {
        let (bus, rx) = channel(1);
        drop(rx);
        let state = AppState {
            bus,
            pending: Arc::new(PendingReplies::new()),
            reply_timeout: Duration::from_secs(1),
        };
        let app = create_router(state, 1024);

        let request = Request::builder()
            .method("POST")
            .uri("/extract-text")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content": "FACTURA"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (state, _rx) = create_test_state();
        let app = create_router(state, 1024);

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/upload-pdf")
            .header("origin", "http://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
