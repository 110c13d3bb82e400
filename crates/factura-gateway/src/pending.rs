//! Registry of requests waiting for their extraction reply.
//!
//! Each registered correlation id owns a oneshot channel. A reply resolves
//! exactly one waiter; a second reply for the same id finds nothing.

use crate::bus::InvoiceReply;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Pending-reply error
#[derive(Debug, Error, PartialEq)]
pub enum PendingError {
    /// No request is waiting on this id
    #[error("No pending request for correlation id {0}")]
    NotFound(Uuid),

    /// The waiting request gave up before the reply arrived
    #[error("Request {0} is no longer waiting")]
    Closed(Uuid),

    /// No reply arrived in time
    #[error("No reply for request {0} within {1}s")]
    TimedOut(Uuid, u64),
}

/// Correlation id to reply channel
#[derive(Default)]
pub struct PendingReplies {
    waiters: Mutex<HashMap<Uuid, oneshot::Sender<InvoiceReply>>>,
}

impl PendingReplies {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for the reply to `correlation_id`
    ///
    /// The entry is removed when the returned handle is dropped, so callers
    /// that time out or disconnect leave nothing behind.
    pub fn register(self: &Arc<Self>, correlation_id: Uuid) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(correlation_id, tx);
        debug!("Registered pending request {}", correlation_id);

        PendingReply {
            correlation_id,
            receiver: rx,
            registry: Arc::clone(self),
        }
    }

    /// Hand a reply to its waiter
    pub fn resolve(&self, reply: InvoiceReply) -> Result<(), PendingError> {
        let id = reply.correlation_id;
        let sender = self.lock().remove(&id).ok_or(PendingError::NotFound(id))?;
        sender.send(reply).map_err(|_| PendingError::Closed(id))
    }

    /// Number of requests currently waiting
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no request is waiting
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, correlation_id: &Uuid) {
        self.lock().remove(correlation_id);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, oneshot::Sender<InvoiceReply>>> {
        // Entries stay consistent even if a holder panicked
        self.waiters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle on one registered request
pub struct PendingReply {
    correlation_id: Uuid,
    receiver: oneshot::Receiver<InvoiceReply>,
    registry: Arc<PendingReplies>,
}

impl PendingReply {
    /// Correlation id this handle waits on
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Wait for the reply, at most `timeout`
    pub async fn wait(mut self, timeout: Duration) -> Result<InvoiceReply, PendingError> {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(PendingError::Closed(self.correlation_id)),
            Err(_) => Err(PendingError::TimedOut(self.correlation_id, timeout.as_secs())),
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.registry.remove(&self.correlation_id);
    }
}
