//! # Mail Indexer
//!
//! Main library for the mail indexer.
//!
//! This crate provides the configuration and dependency wiring for running
//! the ingest from a Gmail mailbox into an OpenSearch index.

pub mod config;

pub use config::{Dependencies, IndexerSettings, LogFormat};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] mail_indexer_ingest::IngestError),

    /// Search index error.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] mail_indexer_repository::SearchIndexError),

    /// Message source error.
    #[error("Message source error: {0}")]
    SourceError(#[from] mail_indexer_repository::SourceError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
