//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `DocumentIndex`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use opensearch::http::request::JsonBody;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::DocumentIndex;
use crate::opensearch::bulk::{build_bulk_lines, parse_bulk_response};
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::BulkUpsertSummary;
use mail_indexer_shared::{DocumentId, MailDocument};

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// use mail_indexer_repository::{IndexConfig, OpenSearchClient};
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::default()).await?;
/// client.ensure_index_exists().await?;
/// let summary = client.bulk_upsert(&[(doc.id(), doc)]).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index documents are written to
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index_config.name, "Created OpenSearch client");

        Ok(Self {
            client,
            index_config,
        })
    }
}

#[async_trait]
impl DocumentIndex for OpenSearchClient {
    /// Write all documents with one `_bulk` request.
    ///
    /// Each document is sent as an `index` action keyed by its `DocumentId`,
    /// so re-ingesting a message overwrites the earlier copy.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_upsert(
        &self,
        documents: &[(DocumentId, MailDocument)],
    ) -> Result<BulkUpsertSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BulkUpsertSummary::default());
        }

        let body: Vec<JsonBody<Value>> = build_bulk_lines(&self.index_config.name, documents)?
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_operation(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = parse_bulk_response(documents, &response_body)?;
        if summary.is_partial() {
            warn!(
                submitted = summary.submitted,
                succeeded = summary.succeeded,
                reason = summary.first_failure_reason().unwrap_or("unknown"),
                "Bulk request partially failed"
            );
        }
        debug!(
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            "Bulk request completed"
        );
        Ok(summary)
    }

    /// Create the mail index with its mappings unless it already exists.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let name = self.index_config.name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %name, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another indexer may have created it between the two calls
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %name, "Created index");
        Ok(())
    }

    /// A cluster is considered healthy unless it reports `red`.
    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(is_healthy_status(&body))
    }
}

fn is_healthy_status(body: &Value) -> bool {
    matches!(
        body.get("status").and_then(|s| s.as_str()),
        Some("green") | Some("yellow")
    )
}
