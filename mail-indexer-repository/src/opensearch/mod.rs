//! OpenSearch implementation of the document index.
//!
//! This module provides a concrete implementation of `DocumentIndex`
//! using OpenSearch (or a compatible Elasticsearch) as the backend.

mod bulk;
mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::{IndexConfig, DEFAULT_INDEX_NAME};
