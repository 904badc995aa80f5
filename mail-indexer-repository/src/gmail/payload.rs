//! Wire types for the Gmail `users.messages` endpoints.

use serde::Deserialize;

use mail_indexer_shared::{MailHeader, MessagePage, MessageRef, RawMessage};

/// Response of `GET users/{user}/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListMessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl From<ListMessagesResponse> for MessagePage {
    fn from(response: ListMessagesResponse) -> Self {
        MessagePage::new(response.messages, response.next_page_token)
    }
}

/// Response of `GET users/{user}/messages/{id}?format=metadata`.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    pub id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePart {
    #[serde(default)]
    pub headers: Vec<MailHeader>,
}

impl From<MessageResponse> for RawMessage {
    fn from(response: MessageResponse) -> Self {
        let headers = response.payload.map(|p| p.headers).unwrap_or_default();
        RawMessage::new(response.id, headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_with_next_page() {
        let body = json!({
            "messages": [
                {"id": "18c1", "threadId": "18c0"},
                {"id": "18c2", "threadId": "18c2"}
            ],
            "nextPageToken": "09876",
            "resultSizeEstimate": 201
        });

        let response: ListMessagesResponse = serde_json::from_value(body).unwrap();
        let page = MessagePage::from(response);

        assert_eq!(page.refs.len(), 2);
        assert_eq!(page.refs[0].id, "18c1");
        assert_eq!(page.refs[0].thread_id.as_deref(), Some("18c0"));
        assert_eq!(page.next_cursor.as_deref(), Some("09876"));
    }

    #[test]
    fn test_list_response_last_page() {
        let body = json!({"resultSizeEstimate": 0});
        let response: ListMessagesResponse = serde_json::from_value(body).unwrap();
        let page = MessagePage::from(response);

        assert!(page.refs.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_message_response_keeps_header_order() {
        let body = json!({
            "id": "18c1",
            "threadId": "18c0",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "Received", "value": "from mx.example.com"},
                    {"name": "From", "value": "alice@example.com"},
                    {"name": "Received", "value": "by relay.example.com"}
                ]
            }
        });

        let response: MessageResponse = serde_json::from_value(body).unwrap();
        let message = RawMessage::from(response);

        assert_eq!(message.id, "18c1");
        assert_eq!(message.headers.len(), 3);
        assert_eq!(message.headers[0].value, "from mx.example.com");
        assert_eq!(message.headers[2].value, "by relay.example.com");
    }

    #[test]
    fn test_message_response_without_payload() {
        let body = json!({"id": "18c1"});
        let response: MessageResponse = serde_json::from_value(body).unwrap();
        assert!(RawMessage::from(response).headers.is_empty());
    }
}
