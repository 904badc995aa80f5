//! Dependency initialization and wiring for the mail indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::IndexerSettings;
use crate::IndexingError;
use mail_indexer_ingest::Orchestrator;
use mail_indexer_repository::{DocumentIndex, GmailClient, IndexConfig, OpenSearchClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Build the source and index clients and wire them into an orchestrator.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a client cannot be built or the cluster is
    ///   unreachable or unhealthy
    pub async fn new(settings: IndexerSettings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index_name = %settings.index_name,
            gmail_user = %settings.gmail.user,
            "Initializing dependencies"
        );

        let source = GmailClient::new(settings.gmail)?;

        // Initialize OpenSearch client
        let search_client = OpenSearchClient::new(
            &settings.opensearch_url,
            IndexConfig::new(settings.index_name.clone()),
        )
        .await
        .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client.health_check().await?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let orchestrator = Orchestrator::with_config(
            Arc::new(source),
            Arc::new(search_client),
            settings.orchestrator,
        );

        Ok(Self { orchestrator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_indexer_ingest::OrchestratorConfig;
    use mail_indexer_repository::{GmailConfig, SourceError};

    #[tokio::test]
    async fn test_rejected_token_fails_before_connecting() {
        let settings = IndexerSettings {
            // Nothing listens here; the token check must fail first
            opensearch_url: "http://127.0.0.1:1".to_string(),
            index_name: "gmail".to_string(),
            gmail: GmailConfig::new(""),
            orchestrator: OrchestratorConfig::default(),
        };

        let err = Dependencies::new(settings).await.err().unwrap();
        assert!(matches!(
            err,
            IndexingError::SourceError(SourceError::AuthenticationError(_))
        ));
    }
}
