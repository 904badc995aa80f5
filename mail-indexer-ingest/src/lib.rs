//! # Mail Indexer Ingest
//!
//! This crate provides the ingest core that pulls messages from the message
//! source and writes them into the search index.
//!
//! ## Architecture
//!
//! 1. **Consumer**: Walks pages of message references and fans out fetches
//! 2. **Processor**: Fetches each message and normalizes its headers into a document
//! 3. **Loader**: Batches documents behind a bounded queue and bulk-writes them
//! 4. **Orchestrator**: Starts the components and drives the drain-and-stop sequence
//!
//! The `lifecycle` module holds the shared state machine and shutdown signal
//! the components are coordinated with.

pub mod consumer;
pub mod errors;
pub mod lifecycle;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use errors::{CodecError, EnqueueError, FlushError, IngestError};
pub use orchestrator::{IngestReport, Orchestrator, OrchestratorConfig};
