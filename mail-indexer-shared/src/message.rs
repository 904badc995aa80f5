//! Records as they come out of the message store.

use serde::{Deserialize, Serialize};

/// Reference to a single message, as returned by page listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// The message identifier used to fetch the full record.
    pub id: String,
    /// The thread the message belongs to, when the source reports one.
    #[serde(default, rename = "threadId", skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl MessageRef {
    /// Create a reference with no thread information.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread_id: None,
        }
    }
}

/// One page of message references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    /// References on this page, in listing order.
    pub refs: Vec<MessageRef>,
    /// Cursor for the following page. `None` once the source is exhausted.
    pub next_cursor: Option<String>,
}

impl MessagePage {
    /// Build a page, treating an empty cursor as "no more pages".
    pub fn new(refs: Vec<MessageRef>, next_cursor: Option<String>) -> Self {
        Self {
            refs,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Whether this is the last page of the listing.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// A single `name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailHeader {
    pub name: String,
    pub value: String,
}

impl MailHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A fully fetched message. Header order is preserved and names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub headers: Vec<MailHeader>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, headers: Vec<MailHeader>) -> Self {
        Self {
            id: id.into(),
            headers,
        }
    }
}
