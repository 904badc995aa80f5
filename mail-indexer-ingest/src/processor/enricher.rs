//! Per-message fetch, normalize and enqueue step.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::errors::EnqueueError;
use crate::loader::FlusherHandle;
use crate::processor::codec::normalize;
use mail_indexer_repository::MessageSource;
use mail_indexer_shared::MessageRef;

/// What happened to one message reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The document was admitted to the flusher queue.
    Enqueued,
    /// The message lacked a required header or had an unparsable date.
    Rejected,
    /// The flusher queue was full; the document was dropped.
    QueueFull,
    /// The flusher had already stopped accepting documents.
    QueueClosed,
    /// The message could not be fetched.
    FetchFailed,
}

/// Fetches messages and hands their documents to the flusher.
///
/// Errors never leave [`MessageEnricher::enrich`]; each is logged and turned
/// into an [`EnrichOutcome`].
pub struct MessageEnricher {
    source: Arc<dyn MessageSource>,
    flusher: FlusherHandle,
}

impl MessageEnricher {
    pub fn new(source: Arc<dyn MessageSource>, flusher: FlusherHandle) -> Self {
        Self { source, flusher }
    }

    /// Process a single message reference.
    pub async fn enrich(&self, message: MessageRef) -> EnrichOutcome {
        let raw = match self.source.get_message(&message).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Unable to retrieve message");
                return EnrichOutcome::FetchFailed;
            }
        };

        let doc = match normalize(&raw.headers) {
            Ok(doc) => doc,
            Err(rejected) => {
                warn!(
                    message_id = %message.id,
                    problems = %rejected,
                    partial = ?rejected.partial,
                    "Skipping message that failed normalization"
                );
                return EnrichOutcome::Rejected;
            }
        };

        match self.flusher.enqueue(doc) {
            Ok(()) => {
                debug!(message_id = %message.id, "Enqueued document");
                EnrichOutcome::Enqueued
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Unable to add document to batch");
                match e {
                    EnqueueError::QueueFull => EnrichOutcome::QueueFull,
                    EnqueueError::QueueClosed => EnrichOutcome::QueueClosed,
                }
            }
        }
    }
}
