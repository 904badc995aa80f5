//! Gmail REST implementation of the message source.
//!
//! The client is handed an OAuth access token that was obtained out of band;
//! acquiring and refreshing that token is not handled here.

mod client;
mod payload;

pub use client::{GmailClient, GmailConfig, DEFAULT_GMAIL_API_URL, DEFAULT_GMAIL_USER};
