//! Processor module for the mail indexer ingest.
//!
//! Turns fetched messages into documents: `codec` holds the pure header
//! normalization, `enricher` runs the fetch-normalize-enqueue step per message.

pub mod codec;
mod enricher;

pub use codec::{normalize, RejectedMessage};
pub use enricher::{EnrichOutcome, MessageEnricher};
