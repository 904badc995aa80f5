//! Batching flusher.
//!
//! Producers hand documents over through a bounded queue with
//! [`FlusherHandle::enqueue`], which never waits: a full queue rejects the
//! document. A single consumer, [`BatchFlusher::run`], owns the pending batch
//! and writes it to the index every `batch_size` documents. On the drain
//! signal it empties the queue and flushes whatever is left.
//!
//! A flush is attempted once. Documents from a failed or partially failed
//! flush are dropped and counted in [`FlushReport::documents_lost`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, instrument};

use crate::errors::{EnqueueError, FlushError, IngestError};
use crate::lifecycle::{Lifecycle, ShutdownSignal};
use mail_indexer_repository::DocumentIndex;
use mail_indexer_shared::{DocumentId, MailDocument};

/// Configuration for the batch flusher.
#[derive(Debug, Clone)]
pub struct FlusherConfig {
    /// Number of documents that triggers a flush.
    pub batch_size: usize,
    /// Capacity of the input queue.
    pub queue_capacity: usize,
    /// Time limit for one bulk call.
    pub flush_timeout: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            queue_capacity: 100,
            flush_timeout: Duration::from_secs(2),
        }
    }
}

/// Counters reported when the flusher stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Documents the index confirmed.
    pub total_flushed: usize,
    /// Bulk calls issued.
    pub flush_calls: usize,
    /// Bulk calls that failed fully or partially.
    pub failed_flushes: usize,
    /// Documents that were submitted but not confirmed.
    pub documents_lost: usize,
}

/// Producer side of the flusher queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FlusherHandle {
    sender: mpsc::Sender<MailDocument>,
}

impl FlusherHandle {
    /// Offer a document without waiting.
    pub fn enqueue(&self, doc: MailDocument) -> Result<(), EnqueueError> {
        match self.sender.try_send(doc) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EnqueueError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(EnqueueError::QueueClosed),
        }
    }
}

/// Single consumer that batches documents and flushes them to the index.
pub struct BatchFlusher {
    client: Arc<dyn DocumentIndex>,
    config: FlusherConfig,
    pub(crate) receiver: mpsc::Receiver<MailDocument>,
    pending: Vec<MailDocument>,
    report: FlushReport,
    lifecycle: Lifecycle,
}

impl BatchFlusher {
    /// Create a flusher and the handle producers enqueue through.
    pub fn with_config(client: Arc<dyn DocumentIndex>, config: FlusherConfig) -> (Self, FlusherHandle) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let batch_size = config.batch_size;

        let flusher = Self {
            client,
            config,
            receiver,
            pending: Vec::with_capacity(batch_size),
            report: FlushReport::default(),
            lifecycle: Lifecycle::new("flusher"),
        };

        (flusher, FlusherHandle { sender })
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Consume the queue until `drain` fires or every handle is dropped, then
    /// drain the queue and flush once more.
    #[instrument(skip(self, drain), fields(batch_size = self.config.batch_size))]
    pub async fn run(mut self, mut drain: ShutdownSignal) -> Result<FlushReport, IngestError> {
        self.lifecycle.start()?;
        info!("Flusher started");

        loop {
            tokio::select! {
                biased;
                _ = drain.triggered() => {
                    info!("Flusher received drain signal");
                    break;
                }
                doc = self.receiver.recv() => match doc {
                    Some(doc) => self.accept(doc).await,
                    None => {
                        info!("All producers have stopped");
                        break;
                    }
                }
            }
        }

        self.lifecycle.begin_drain()?;
        self.drain().await;
        self.lifecycle.stop()?;

        info!(
            total_flushed = self.report.total_flushed,
            documents_lost = self.report.documents_lost,
            "Flusher stopped"
        );
        Ok(self.report)
    }

    /// Add a document to the pending batch, flushing when the batch is full.
    async fn accept(&mut self, doc: MailDocument) {
        self.pending.push(doc);

        if self.pending.len() % 10 == 0 {
            debug!(pending = self.pending.len(), "Batch contains documents");
        }

        if self.pending.len() >= self.config.batch_size {
            if let Err(e) = self.flush().await {
                error!(error = %e, "Failed to flush batch to index");
            }
        }
    }

    /// Stop admitting documents, move everything queued into the batch and
    /// flush one final time.
    async fn drain(&mut self) {
        self.receiver.close();

        while let Ok(doc) = self.receiver.try_recv() {
            self.accept(doc).await;
        }

        if let Err(e) = self.flush().await {
            error!(error = %e, "Error flushing for the final time");
        }
    }

    /// Write the pending batch with one bulk call.
    ///
    /// The batch is cleared whatever the outcome.
    async fn flush(&mut self) -> Result<usize, FlushError> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let documents: Vec<(DocumentId, MailDocument)> =
            self.pending.drain(..).map(|doc| (doc.id(), doc)).collect();
        let submitted = documents.len();
        self.report.flush_calls += 1;

        debug!(count = submitted, "Flushing documents to index");

        let result = tokio::time::timeout(
            self.config.flush_timeout,
            self.client.bulk_upsert(&documents),
        )
        .await;

        let summary = match result {
            Ok(Ok(summary)) => summary,
            Ok(Err(source)) => {
                return Err(self.record_failure(FlushError::IndexError { submitted, source }));
            }
            Err(_) => {
                return Err(self.record_failure(FlushError::Timeout {
                    submitted,
                    timeout: self.config.flush_timeout,
                }));
            }
        };

        let succeeded = summary.succeeded.min(submitted);
        self.report.total_flushed += succeeded;

        if succeeded < submitted {
            if let Some(reason) = summary.first_failure_reason() {
                error!(reason = %reason, "Error inserting into index");
            }
            return Err(self.record_failure(FlushError::PartialFailure {
                submitted,
                succeeded,
            }));
        }

        info!(total_flushed = self.report.total_flushed, "Total flushed");
        Ok(succeeded)
    }

    fn record_failure(&mut self, error: FlushError) -> FlushError {
        self.report.failed_flushes += 1;
        self.report.documents_lost += error.documents_lost();
        error
    }
}
