//! Mail document type for the search index.
//!
//! A [`MailDocument`] is the flat, normalized form of one message. Its
//! [`DocumentId`] is derived from the content so that re-ingesting the same
//! message overwrites the existing document instead of duplicating it.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Normalized message ready to be written to the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailDocument {
    pub from: String,
    pub to: String,
    /// When the message was sent, in the sender's offset.
    pub date: DateTime<FixedOffset>,
    pub subject: String,
    /// Hour of `date` in its own offset (0-23).
    pub hour_of_day: u32,
    /// Full English weekday name of `date`, e.g. "Monday".
    pub day_of_week: String,
    /// Whether any header reported an SPF, DKIM or DMARC pass.
    pub secure: bool,
}

impl MailDocument {
    /// Create a document, deriving the hour and weekday from `date`.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        date: DateTime<FixedOffset>,
        subject: impl Into<String>,
        secure: bool,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            hour_of_day: date.hour(),
            day_of_week: date.format("%A").to_string(),
            date,
            subject: subject.into(),
            secure,
        }
    }

    /// Deterministic identifier over from, to, date and subject.
    pub fn id(&self) -> DocumentId {
        DocumentId::compute(&self.from, &self.to, &self.date, &self.subject)
    }
}

/// Content-derived document identifier (lowercase hex MD5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Hash `from|to|date|subject`, with `date` in canonical RFC 3339 form.
    pub fn compute(from: &str, to: &str, date: &DateTime<FixedOffset>, subject: &str) -> Self {
        let key = format!(
            "{}|{}|{}|{}",
            from,
            to,
            date.to_rfc3339_opts(SecondsFormat::Secs, true),
            subject
        );
        Self(format!("{:x}", Md5::digest(key.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
