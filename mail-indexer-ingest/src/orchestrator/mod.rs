//! Orchestrator module for the mail indexer ingest.
//!
//! Coordinates the enumerator and flusher components and owns the
//! stop-then-drain shutdown sequence.

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, instrument, warn};

use crate::consumer::{EnumerationOutcome, EnumerationStats, EnumeratorConfig, MessageEnumerator};
use crate::errors::IngestError;
use crate::lifecycle::{shutdown_channel, Lifecycle};
use crate::loader::{BatchFlusher, FlushReport, FlusherConfig};
use mail_indexer_repository::{DocumentIndex, MessageSource};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub enumerator: EnumeratorConfig,
    pub flusher: FlusherConfig,
}

/// Final report of an ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub outcome: EnumerationOutcome,
    pub stats: EnumerationStats,
    pub flush: FlushReport,
    /// Cursor to pass as the start cursor of the next run, when stopped early.
    pub resume_cursor: Option<String>,
}

/// Orchestrator that coordinates the ingest components.
///
/// The orchestrator:
/// - Makes sure the index exists before any document is produced
/// - Runs the enumerator and the flusher as separate tasks
/// - Stops the enumerator on shutdown, then drains the flusher
/// - Reports a listing failure only after the drain has finished
pub struct Orchestrator {
    source: Arc<dyn MessageSource>,
    index: Arc<dyn DocumentIndex>,
    config: OrchestratorConfig,
    lifecycle: Lifecycle,
}

impl Orchestrator {
    /// Create a new orchestrator with default configuration.
    pub fn new(source: Arc<dyn MessageSource>, index: Arc<dyn DocumentIndex>) -> Self {
        Self::with_config(source, index, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        source: Arc<dyn MessageSource>,
        index: Arc<dyn DocumentIndex>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            source,
            index,
            config,
            lifecycle: Lifecycle::new("orchestrator"),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Run until the source is exhausted or the process receives an
    /// interrupt or terminate signal.
    pub async fn run(&self, start_cursor: Option<String>) -> Result<IngestReport, IngestError> {
        self.run_until(start_cursor, shutdown_signal()).await
    }

    /// Run until the source is exhausted or `shutdown` completes.
    ///
    /// An orchestrator runs once. A second call fails with
    /// [`IngestError::InvalidTransition`].
    ///
    /// # Returns
    ///
    /// * `Ok(IngestReport)` - The source was exhausted or the run was stopped
    /// * `Err(IngestError)` - Index setup or listing failed
    #[instrument(skip(self, shutdown))]
    pub async fn run_until<F>(
        &self,
        start_cursor: Option<String>,
        shutdown: F,
    ) -> Result<IngestReport, IngestError>
    where
        F: Future<Output = ()> + Send,
    {
        self.lifecycle.start()?;
        info!("Starting mail indexer orchestrator");

        let result = self.execute(start_cursor, shutdown).await;
        self.lifecycle.stop()?;

        match &result {
            Ok(report) => info!(
                outcome = ?report.outcome,
                total_flushed = report.flush.total_flushed,
                "Orchestrator shutdown complete"
            ),
            Err(e) => error!(error = %e, "Orchestrator stopped with error"),
        }
        result
    }

    async fn execute<F>(
        &self,
        start_cursor: Option<String>,
        shutdown: F,
    ) -> Result<IngestReport, IngestError>
    where
        F: Future<Output = ()> + Send,
    {
        self.index.ensure_index_exists().await?;

        let (flusher, handle) =
            BatchFlusher::with_config(self.index.clone(), self.config.flusher.clone());
        let (drain_trigger, drain_signal) = shutdown_channel();
        let flusher_task = tokio::spawn(flusher.run(drain_signal));

        let enumerator = MessageEnumerator::with_config(
            self.source.clone(),
            handle,
            self.config.enumerator.clone(),
        );
        let (stop_trigger, stop_signal) = shutdown_channel();
        let mut enumerator_task =
            tokio::spawn(async move { enumerator.run(start_cursor, stop_signal).await });

        tokio::pin!(shutdown);
        let joined = tokio::select! {
            joined = &mut enumerator_task => joined,
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping enumeration");
                stop_trigger.trigger();
                enumerator_task.await
            }
        };

        self.lifecycle.begin_drain()?;
        drain_trigger.trigger();
        let flush = flusher_task.await.map_err(IngestError::task)??;

        let summary = joined.map_err(IngestError::task)??;
        if summary.outcome == EnumerationOutcome::Stopped {
            warn!(
                resume_cursor = ?summary.resume_cursor,
                "Enumeration stopped before the source was exhausted"
            );
        }

        Ok(IngestReport {
            outcome: summary.outcome,
            stats: summary.stats,
            flush,
            resume_cursor: summary.resume_cursor,
        })
    }
}

/// Completes on Ctrl-C, or on SIGTERM on unix.
///
/// If a handler cannot be installed its branch never completes.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for interrupt signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for terminate signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received interrupt signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
