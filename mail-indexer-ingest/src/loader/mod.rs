//! Loader module for the mail indexer ingest.
//!
//! Batches documents and writes them to the search index.

mod batch_flusher;

pub use batch_flusher::{BatchFlusher, FlushReport, FlusherConfig, FlusherHandle};
