//! Interface definitions for the collaborators of the ingest core.
//!
//! The ingest crate depends only on these traits, which keeps the Gmail and
//! OpenSearch clients swappable and lets tests substitute in-memory mocks.

mod document_index;
mod message_source;

pub use document_index::DocumentIndex;
pub use message_source::MessageSource;
