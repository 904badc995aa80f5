//! Message source trait definition.

use async_trait::async_trait;

use crate::errors::SourceError;
use mail_indexer_shared::{MessagePage, MessageRef, RawMessage};

/// An authenticated, paginated message store.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// List one page of message references.
    ///
    /// `cursor` is the continuation returned with the previous page; `None`
    /// starts from the beginning.
    async fn list_messages(&self, cursor: Option<&str>) -> Result<MessagePage, SourceError>;

    /// Fetch a message with its full header list.
    async fn get_message(&self, message: &MessageRef) -> Result<RawMessage, SourceError>;
}
