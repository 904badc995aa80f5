//! Settings read from the environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use mail_indexer_ingest::consumer::EnumeratorConfig;
use mail_indexer_ingest::loader::FlusherConfig;
use mail_indexer_ingest::OrchestratorConfig;
use mail_indexer_repository::gmail::{DEFAULT_GMAIL_API_URL, DEFAULT_GMAIL_USER};
use mail_indexer_repository::opensearch::DEFAULT_INDEX_NAME;
use mail_indexer_repository::GmailConfig;

use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://127.0.0.1:9200";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`, defaulting to text when unset.
    pub fn from_env() -> Result<Self, IndexingError> {
        match env::var("LOG_FORMAT") {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Self::default()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(IndexingError::config(format!(
                "LOG_FORMAT must be text or json, got [{}]",
                other
            ))),
        }
    }
}

/// Everything needed to build the indexer's dependencies.
#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub opensearch_url: String,
    pub index_name: String,
    pub gmail: GmailConfig,
    pub orchestrator: OrchestratorConfig,
}

impl IndexerSettings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://127.0.0.1:9200)
    /// - `INDEX_NAME`: Destination index (default: gmail)
    /// - `GMAIL_ACCESS_TOKEN`: OAuth access token (required)
    /// - `GMAIL_USER`: Mailbox to read (default: me)
    /// - `GMAIL_API_URL`: Gmail API root (default: https://gmail.googleapis.com/gmail/v1)
    /// - `FLUSH_BATCH_SIZE`: Documents per bulk call (default: 20)
    /// - `FLUSH_QUEUE_CAPACITY`: Flusher queue capacity (default: 100)
    /// - `FLUSH_TIMEOUT_MS`: Time limit of one bulk call (default: 2000)
    /// - `MAX_CONCURRENT_FETCHES`: Fetches in flight per page (default: 16)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = get("GMAIL_ACCESS_TOKEN")
            .ok_or_else(|| IndexingError::config("GMAIL_ACCESS_TOKEN is required"))?;

        let mut gmail = GmailConfig::new(access_token);
        gmail.base_url = get("GMAIL_API_URL").unwrap_or_else(|| DEFAULT_GMAIL_API_URL.to_string());
        gmail.user = get("GMAIL_USER").unwrap_or_else(|| DEFAULT_GMAIL_USER.to_string());

        let defaults = FlusherConfig::default();
        let flusher = FlusherConfig {
            batch_size: positive(&get, "FLUSH_BATCH_SIZE", defaults.batch_size)?,
            queue_capacity: positive(&get, "FLUSH_QUEUE_CAPACITY", defaults.queue_capacity)?,
            flush_timeout: Duration::from_millis(positive(
                &get,
                "FLUSH_TIMEOUT_MS",
                defaults.flush_timeout.as_millis() as u64,
            )?),
        };

        let enumerator = EnumeratorConfig {
            max_concurrent_fetches: positive(
                &get,
                "MAX_CONCURRENT_FETCHES",
                EnumeratorConfig::default().max_concurrent_fetches,
            )?,
        };

        Ok(Self {
            opensearch_url: get("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index_name: get("INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            gmail,
            orchestrator: OrchestratorConfig {
                enumerator,
                flusher,
            },
        })
    }
}

/// Parse a numeric setting that must be greater than zero.
fn positive<T, G>(get: &G, key: &str, default: T) -> Result<T, IndexingError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    let value = match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            IndexingError::config(format!("{} has invalid value [{}]: {}", key, raw, e))
        })?,
        None => default,
    };

    if value <= T::default() {
        return Err(IndexingError::config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}
