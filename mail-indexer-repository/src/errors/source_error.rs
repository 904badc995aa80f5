//! Message source error types.

use thiserror::Error;

/// Errors that can occur while listing or fetching messages.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The access token was missing or rejected.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The source answered with a non-success status.
    #[error("Request failed with status {status}: {body}")]
    StatusError { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SourceError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create an authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::AuthenticationError(msg.into())
    }

    /// Create a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::StatusError {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
