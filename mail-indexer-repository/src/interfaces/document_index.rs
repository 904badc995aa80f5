//! Document index trait definition.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::BulkUpsertSummary;
use mail_indexer_shared::{DocumentId, MailDocument};

/// Abstracts the search index the documents are written to.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Create or overwrite each document under its ID in a single call.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkUpsertSummary)` - The call reached the index; individual items may still have failed
    /// * `Err(SearchIndexError)` - The call failed as a whole
    async fn bulk_upsert(
        &self,
        documents: &[(DocumentId, MailDocument)],
    ) -> Result<BulkUpsertSummary, SearchIndexError>;

    /// Create the index with its mappings if it does not exist yet.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Check whether the index service is reachable and usable.
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
