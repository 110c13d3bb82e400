//! The invoice agent: consumes bus requests and delivers replies.

use crate::bus::{BusReceiver, InvoiceReply, InvoiceRequest};
use crate::pending::PendingReplies;
use factura_domain::CompletionProvider;
use factura_extractor::Extractor;
use factura_llm::LlmError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Where the agent sends its replies
#[derive(Clone)]
pub enum ReplySink {
    /// Resolve waiters in this process
    Direct(Arc<PendingReplies>),
    /// POST each reply as JSON to a callback URL
    Webhook {
        /// HTTP client
        client: reqwest::Client,
        /// Callback URL
        url: String,
    },
}

impl ReplySink {
    /// Webhook sink whose POSTs give up after `timeout`
    pub fn webhook(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ReplySink::Webhook {
            client,
            url: url.into(),
        })
    }

    /// Deliver one reply. Failures are logged; the waiter then times out.
    pub async fn deliver(&self, reply: InvoiceReply) {
        let id = reply.correlation_id;
        match self {
            ReplySink::Direct(pending) => {
                if let Err(e) = pending.resolve(reply) {
                    warn!("Ignoring reply: {}", e);
                }
            }
            ReplySink::Webhook { client, url } => {
                match client.post(url).json(&reply).send().await {
                    Ok(response) if response.status().is_success() => {}
                    Ok(response) => {
                        warn!("Webhook {} rejected reply {}: HTTP {}", url, id, response.status());
                    }
                    Err(e) => {
                        error!("Failed to deliver reply {} to {}: {}", id, url, e);
                    }
                }
            }
        }
    }
}

/// Runs extractions for requests arriving on the bus
pub struct InvoiceAgent<P> {
    extractor: Arc<Extractor<P>>,
    sink: ReplySink,
}

impl<P> InvoiceAgent<P>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create an agent
    pub fn new(extractor: Arc<Extractor<P>>, sink: ReplySink) -> Self {
        Self { extractor, sink }
    }

    /// Process requests until every sender is dropped
    ///
    /// Each request runs in its own task, so a slow completion does not hold
    /// up the requests behind it.
    pub async fn run(self, mut requests: BusReceiver) {
        info!("Invoice agent started");

        while let Some(request) = requests.recv().await {
            let extractor = Arc::clone(&self.extractor);
            let sink = self.sink.clone();
            tokio::spawn(async move {
                let reply = handle_request(&extractor, request).await;
                sink.deliver(reply).await;
            });
        }

        info!("Invoice agent stopped: bus closed");
    }

    /// Run the agent on a background task
    pub fn spawn(self, requests: BusReceiver) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(requests))
    }
}

/// Extract one request into its reply; failures become error replies
pub async fn handle_request<P>(extractor: &Extractor<P>, request: InvoiceRequest) -> InvoiceReply
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    let InvoiceRequest {
        correlation_id,
        path,
        content,
    } = request;

    info!("Extracting {} ({})", path, correlation_id);

    match extractor.extract(&content).await {
        Ok(extraction) => InvoiceReply::success(correlation_id, extraction),
        Err(e) => {
            warn!("Extraction of {} failed: {}", path, e);
            InvoiceReply::failure(correlation_id, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{channel, ReplyStatus};
    use factura_extractor::ExtractorConfig;
    use factura_llm::MockProvider;
    use tokio::net::TcpListener;

    const ANSWER: &str = r#"{"pdf_billed_company_name": "Acme", "pdf_billing_company_name": "0",
        "pdf_provider_bill_uuid": "0", "pdf_currency_code": "USD", "pdf_sub_total": 10,
        "pdf_traslado": 0, "pdf_retencion": 0, "pdf_total": 10}"#;

    fn extractor(response: &str) -> Arc<Extractor<MockProvider>> {
        Arc::new(Extractor::new(MockProvider::new(response), ExtractorConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_handle_request_success() {
        let request = InvoiceRequest::new("a.pdf", "Invoice ABC123456XY1");
        let id = request.correlation_id;

        let reply = handle_request(&extractor(ANSWER), request).await;
        assert_eq!(reply.correlation_id, id);
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.resultado.unwrap().issuer_name, "Acme");
        assert!(reply.errores.unwrap().receiver_name);
    }

    #[tokio::test]
    async fn test_handle_request_failure_becomes_error_reply() {
        let request = InvoiceRequest::new("blank.pdf", "   ");
        let reply = handle_request(&extractor(ANSWER), request).await;

        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.message.as_deref(), Some("Invoice text is empty"));
        assert!(reply.resultado.is_none());
    }

    #[tokio::test]
    async fn test_agent_resolves_pending_requests() {
        let pending = Arc::new(PendingReplies::new());
        let (tx, rx) = channel(8);
        InvoiceAgent::new(extractor(ANSWER), ReplySink::Direct(Arc::clone(&pending))).spawn(rx);

        let request = InvoiceRequest::new("a.pdf", "text");
        let handle = pending.register(request.correlation_id);
        tx.send(request).await.unwrap();

        let reply = handle.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Success);
    }

    #[tokio::test]
    async fn test_direct_sink_ignores_unknown_reply() {
        let pending = Arc::new(PendingReplies::new());
        let sink = ReplySink::Direct(Arc::clone(&pending));

        sink.deliver(InvoiceReply::failure(uuid::Uuid::new_v4(), "late"))
            .await;
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_sink_gives_up_on_stalled_callback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stalled = axum::Router::new().route(
            "/api/webhook",
            axum::routing::post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, stalled).await.unwrap();
        });

        let sink = ReplySink::webhook(
            format!("http://{}/api/webhook", addr),
            Duration::from_millis(200),
        )
        .unwrap();

        let delivered = tokio::time::timeout(
            Duration::from_secs(5),
            sink.deliver(InvoiceReply::failure(uuid::Uuid::new_v4(), "slow")),
        )
        .await;
        assert!(delivered.is_ok(), "delivery should stop at the client timeout");
    }
}
