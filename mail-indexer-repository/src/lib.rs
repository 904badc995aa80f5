//! # Mail Indexer Repository
//!
//! This crate provides the traits the ingest core talks to and their concrete
//! implementations: a Gmail REST client as the message source and an
//! OpenSearch client as the document index.

pub mod errors;
pub mod gmail;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::{SearchIndexError, SourceError};
pub use gmail::{GmailClient, GmailConfig};
pub use interfaces::{DocumentIndex, MessageSource};
pub use opensearch::{IndexConfig, OpenSearchClient};
pub use types::{BulkItemFailure, BulkUpsertSummary};
