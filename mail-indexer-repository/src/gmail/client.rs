//! Gmail API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, instrument};

use crate::errors::SourceError;
use crate::gmail::payload::{ListMessagesResponse, MessageResponse};
use crate::interfaces::MessageSource;
use mail_indexer_shared::{MessagePage, MessageRef, RawMessage};

/// Default Gmail API root.
pub const DEFAULT_GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Default mailbox, the owner of the access token.
pub const DEFAULT_GMAIL_USER: &str = "me";

/// Configuration for the Gmail client.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Mailbox to read.
    pub user: String,
    /// OAuth access token with a Gmail read scope.
    pub access_token: String,
    /// Page size requested from the listing endpoint. `None` uses the API default.
    pub page_size: Option<u32>,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
}

impl GmailConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_GMAIL_API_URL.to_string(),
            user: DEFAULT_GMAIL_USER.to_string(),
            access_token: access_token.into(),
            page_size: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Authenticated handle on a Gmail mailbox.
pub struct GmailClient {
    http: Client,
    config: GmailConfig,
}

impl GmailClient {
    /// Create a new Gmail client.
    ///
    /// # Returns
    ///
    /// * `Ok(GmailClient)` - A client ready to list and fetch messages
    /// * `Err(SourceError)` - If the token is empty or the HTTP client cannot be built
    pub fn new(config: GmailConfig) -> Result<Self, SourceError> {
        if config.access_token.trim().is_empty() {
            return Err(SourceError::authentication("Gmail access token is empty"));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceError::transport(e.to_string()))?;

        info!(base_url = %config.base_url, user = %config.user, "Created Gmail client");

        Ok(Self { http, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/users/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.user
        )
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| SourceError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::authentication(format!(
                "Gmail rejected the access token ({}): {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::status(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::parse(e.to_string()))
    }
}

#[async_trait]
impl MessageSource for GmailClient {
    #[instrument(skip(self))]
    async fn list_messages(&self, cursor: Option<&str>) -> Result<MessagePage, SourceError> {
        let mut request = self.http.get(self.messages_url());
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            request = request.query(&[("pageToken", cursor)]);
        }
        if let Some(page_size) = self.config.page_size {
            request = request.query(&[("maxResults", page_size)]);
        }

        let response: ListMessagesResponse = self.send(request).await?;
        let page = MessagePage::from(response);
        debug!(count = page.refs.len(), "Listed messages");
        Ok(page)
    }

    async fn get_message(&self, message: &MessageRef) -> Result<RawMessage, SourceError> {
        let request = self
            .http
            .get(format!("{}/{}", self.messages_url(), message.id))
            .query(&[("format", "metadata")]);

        let response: MessageResponse = self.send(request).await?;
        Ok(RawMessage::from(response))
    }
}
