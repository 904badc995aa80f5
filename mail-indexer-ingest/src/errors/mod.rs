//! Error types for the mail indexer ingest.

use std::time::Duration;

use mail_indexer_repository::{SearchIndexError, SourceError};
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors that end an ingest run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Listing a page of messages failed. Enumeration cannot continue.
    #[error("Listing error at cursor {cursor:?}: {source}")]
    ListingError {
        cursor: Option<String>,
        #[source]
        source: SourceError,
    },

    /// Error from the search index during startup.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// A component was asked to move to a state it cannot reach.
    #[error("Invalid lifecycle transition for {component}: {from} -> {to}")]
    InvalidTransition {
        component: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    },

    /// A spawned component task panicked or was aborted.
    #[error("Task error: {0}")]
    TaskError(String),
}

impl IngestError {
    /// Create a listing error.
    pub fn listing(cursor: Option<String>, source: SourceError) -> Self {
        Self::ListingError { cursor, source }
    }

    /// Create a task error.
    pub fn task(msg: impl ToString) -> Self {
        Self::TaskError(msg.to_string())
    }
}

/// Reasons a message cannot be turned into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A required header is missing.
    #[error("header [{0}] not found")]
    HeaderNotFound(String),

    /// The date header matched none of the known formats.
    #[error("unable to parse date [{0}]")]
    DateParseError(String),
}

/// Reasons a document was not admitted to the flusher queue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is at capacity. The document is dropped.
    #[error("flusher queue is full")]
    QueueFull,

    /// The flusher is draining or has stopped.
    #[error("flusher queue is closed")]
    QueueClosed,
}

/// Errors from a single flush attempt. The batch is not retried.
#[derive(Error, Debug)]
pub enum FlushError {
    /// The index confirmed fewer documents than were submitted.
    #[error("partial flush failure: {succeeded} of {submitted} documents indexed")]
    PartialFailure { submitted: usize, succeeded: usize },

    /// The bulk call did not finish within the flush timeout.
    #[error("flush of {submitted} documents timed out after {timeout:?}")]
    Timeout { submitted: usize, timeout: Duration },

    /// The bulk call failed as a whole.
    #[error("flush of {submitted} documents failed: {source}")]
    IndexError {
        submitted: usize,
        #[source]
        source: SearchIndexError,
    },
}

impl FlushError {
    /// Number of documents from the batch that did not reach the index.
    pub fn documents_lost(&self) -> usize {
        match self {
            Self::PartialFailure {
                submitted,
                succeeded,
            } => submitted.saturating_sub(*succeeded),
            Self::Timeout { submitted, .. } | Self::IndexError { submitted, .. } => *submitted,
        }
    }
}
