//! Request and response types for index operations.

use mail_indexer_shared::DocumentId;

/// One document the index refused during a bulk upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// The document that failed, when the index reported an ID that could be
    /// matched to the request.
    pub id: Option<DocumentId>,
    /// Reason reported by the index.
    pub reason: String,
}

/// Outcome of a bulk upsert call.
///
/// A call that reaches the index returns a summary even when some items fail;
/// callers compare `succeeded` with `submitted` to detect partial failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpsertSummary {
    /// Number of documents sent.
    pub submitted: usize,
    /// Number of documents the index confirmed.
    pub succeeded: usize,
    /// Individual failures, in request order.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkUpsertSummary {
    /// Summary for a batch where every document was accepted.
    pub fn all_succeeded(submitted: usize) -> Self {
        Self {
            submitted,
            succeeded: submitted,
            failures: Vec::new(),
        }
    }

    /// Whether fewer documents succeeded than were submitted.
    pub fn is_partial(&self) -> bool {
        self.succeeded < self.submitted
    }

    /// Reason of the first failed document, if any.
    pub fn first_failure_reason(&self) -> Option<&str> {
        self.failures.first().map(|f| f.reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn sample_id() -> DocumentId {
        let date = DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap();
        DocumentId::compute("a", "b", &date, "c")
    }

    #[test]
    fn test_all_succeeded_is_not_partial() {
        let summary = BulkUpsertSummary::all_succeeded(20);
        assert!(!summary.is_partial());
        assert_eq!(summary.first_failure_reason(), None);
    }

    #[test]
    fn test_partial_summary() {
        let summary = BulkUpsertSummary {
            submitted: 20,
            succeeded: 18,
            failures: vec![BulkItemFailure {
                id: Some(sample_id()),
                reason: "mapper_parsing_exception".to_string(),
            }],
        };
        assert!(summary.is_partial());
        assert_eq!(summary.first_failure_reason(), Some("mapper_parsing_exception"));
    }
}
