//! Paginated message enumerator.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

use crate::errors::IngestError;
use crate::lifecycle::{Lifecycle, ShutdownSignal};
use crate::loader::FlusherHandle;
use crate::processor::{EnrichOutcome, MessageEnricher};
use mail_indexer_repository::MessageSource;
use mail_indexer_shared::MessageRef;

/// Configuration for the enumerator.
#[derive(Debug, Clone)]
pub struct EnumeratorConfig {
    /// Maximum number of messages fetched at the same time within a page.
    pub max_concurrent_fetches: usize,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
        }
    }
}

/// Why enumeration ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationOutcome {
    /// The last page has been processed.
    Exhausted,
    /// The stop signal was seen before the next page.
    Stopped,
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    pub pages: usize,
    pub messages_seen: usize,
    pub enqueued: usize,
    pub rejected: usize,
    pub queue_full: usize,
    pub queue_closed: usize,
    pub fetch_failed: usize,
}

impl EnumerationStats {
    fn record(&mut self, outcome: EnrichOutcome) {
        match outcome {
            EnrichOutcome::Enqueued => self.enqueued += 1,
            EnrichOutcome::Rejected => self.rejected += 1,
            EnrichOutcome::QueueFull => self.queue_full += 1,
            EnrichOutcome::QueueClosed => self.queue_closed += 1,
            EnrichOutcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

/// Result of a completed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationSummary {
    pub outcome: EnumerationOutcome,
    pub stats: EnumerationStats,
    /// Cursor of the first page not processed, for resuming a stopped run.
    pub resume_cursor: Option<String>,
}

/// Lists pages of messages and enriches every message on each page.
///
/// A page is finished, every fetch included, before the next one is listed.
pub struct MessageEnumerator {
    source: Arc<dyn MessageSource>,
    enricher: Arc<MessageEnricher>,
    config: EnumeratorConfig,
    lifecycle: Lifecycle,
}

impl MessageEnumerator {
    /// Create an enumerator with default configuration.
    pub fn new(source: Arc<dyn MessageSource>, flusher: FlusherHandle) -> Self {
        Self::with_config(source, flusher, EnumeratorConfig::default())
    }

    /// Create an enumerator with custom configuration.
    pub fn with_config(
        source: Arc<dyn MessageSource>,
        flusher: FlusherHandle,
        config: EnumeratorConfig,
    ) -> Self {
        let enricher = Arc::new(MessageEnricher::new(source.clone(), flusher));
        Self {
            source,
            enricher,
            config,
            lifecycle: Lifecycle::new("enumerator"),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Enumerate from `start_cursor` (`None` or empty for the beginning)
    /// until the source is exhausted or `stop` is triggered.
    ///
    /// # Returns
    ///
    /// * `Ok(EnumerationSummary)` - Enumeration ended normally
    /// * `Err(IngestError::ListingError)` - A page could not be listed
    #[instrument(skip(self, stop))]
    pub async fn run(
        &self,
        start_cursor: Option<String>,
        stop: ShutdownSignal,
    ) -> Result<EnumerationSummary, IngestError> {
        self.lifecycle.start()?;
        let result = self.enumerate(start_cursor, &stop).await;
        self.lifecycle.stop()?;
        result
    }

    async fn enumerate(
        &self,
        start_cursor: Option<String>,
        stop: &ShutdownSignal,
    ) -> Result<EnumerationSummary, IngestError> {
        let mut cursor = start_cursor.filter(|c| !c.is_empty());
        let mut stats = EnumerationStats::default();

        loop {
            if stop.is_triggered() {
                info!(resume_cursor = ?cursor, "Enumerator received stop signal");
                return Ok(EnumerationSummary {
                    outcome: EnumerationOutcome::Stopped,
                    stats,
                    resume_cursor: cursor,
                });
            }

            let page = self
                .source
                .list_messages(cursor.as_deref())
                .await
                .map_err(|e| IngestError::listing(cursor.clone(), e))?;

            let count = page.refs.len();
            stats.pages += 1;
            stats.messages_seen += count;

            self.process_page(page.refs, &mut stats).await;

            info!(
                page = stats.pages,
                count = count,
                enqueued = stats.enqueued,
                next_cursor = ?page.next_cursor,
                "Processed page"
            );

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    info!(pages = stats.pages, messages = stats.messages_seen, "Source exhausted");
                    return Ok(EnumerationSummary {
                        outcome: EnumerationOutcome::Exhausted,
                        stats,
                        resume_cursor: None,
                    });
                }
            }
        }
    }

    /// Enrich every message on the page with at most
    /// `max_concurrent_fetches` tasks in flight, returning once all are done.
    async fn process_page(&self, refs: Vec<MessageRef>, stats: &mut EnumerationStats) {
        let limit = self.config.max_concurrent_fetches.max(1);

        let mut tasks = stream::iter(refs)
            .map(|message| {
                let enricher = self.enricher.clone();
                tokio::spawn(async move { enricher.enrich(message).await })
            })
            .buffer_unordered(limit);

        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(outcome) => stats.record(outcome),
                Err(e) => {
                    error!(error = %e, "Message task failed");
                    stats.fetch_failed += 1;
                }
            }
        }
    }
}
