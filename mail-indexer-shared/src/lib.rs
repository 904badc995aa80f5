//! # Mail Indexer Shared
//!
//! Shared types used across the mail indexer crates: the records listed and
//! fetched from the message store, and the flat documents written to the
//! search index.

pub mod document;
pub mod message;

pub use document::{DocumentId, MailDocument};
pub use message::{MailHeader, MessagePage, MessageRef, RawMessage};
