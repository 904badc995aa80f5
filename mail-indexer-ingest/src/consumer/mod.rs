//! Consumer module for the mail indexer ingest.
//!
//! Walks the message listing page by page and fans each page out to the
//! processor.

mod enumerator;

pub use enumerator::{
    EnumerationOutcome, EnumerationStats, EnumerationSummary, EnumeratorConfig, MessageEnumerator,
};
