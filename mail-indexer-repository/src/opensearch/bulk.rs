//! Bulk request bodies and bulk response parsing.

use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use crate::types::{BulkItemFailure, BulkUpsertSummary};
use mail_indexer_shared::{DocumentId, MailDocument};

/// Build the NDJSON lines for a bulk request: one `index` action followed by
/// the document source, per document. `index` creates or overwrites by `_id`.
pub(crate) fn build_bulk_lines(
    index: &str,
    documents: &[(DocumentId, MailDocument)],
) -> Result<Vec<Value>, SearchIndexError> {
    let mut lines = Vec::with_capacity(documents.len() * 2);

    for (id, doc) in documents {
        lines.push(json!({"index": {"_index": index, "_id": id.as_str()}}));
        let source = serde_json::to_value(doc)
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
        lines.push(source);
    }

    Ok(lines)
}

/// Count confirmed items in a bulk response and collect the failures.
///
/// Items come back in request order, so an item without an `_id` is matched to
/// the document at the same position.
pub(crate) fn parse_bulk_response(
    documents: &[(DocumentId, MailDocument)],
    response: &Value,
) -> Result<BulkUpsertSummary, SearchIndexError> {
    let items = response
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no items array"))?;

    let mut summary = BulkUpsertSummary {
        submitted: documents.len(),
        succeeded: 0,
        failures: Vec::new(),
    };

    for (position, item) in items.iter().enumerate() {
        let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
            continue;
        };

        let status = result.get("status").and_then(|s| s.as_u64()).unwrap_or(0);
        let error = result.get("error");

        if error.is_none() && (200..300).contains(&status) {
            summary.succeeded += 1;
            continue;
        }

        let id = match result.get("_id").and_then(|i| i.as_str()) {
            Some(raw) => documents.iter().find(|(id, _)| id.as_str() == raw),
            None => documents.get(position),
        }
        .map(|(id, _)| id.clone());

        let reason = error
            .and_then(|e| e.get("reason").and_then(|r| r.as_str()))
            .map(str::to_string)
            .or_else(|| error.map(|e| e.to_string()))
            .unwrap_or_else(|| format!("status {}", status));

        summary.failures.push(BulkItemFailure { id, reason });
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn documents(n: usize) -> Vec<(DocumentId, MailDocument)> {
        (0..n)
            .map(|i| {
                let doc = MailDocument::new(
                    format!("sender{}@example.com", i),
                    "me@example.com",
                    DateTime::parse_from_rfc3339("2022-06-01T12:00:00+02:00").unwrap(),
                    format!("Subject {}", i),
                    false,
                );
                (doc.id(), doc)
            })
            .collect()
    }

    #[test]
    fn test_build_bulk_lines_pairs_actions_with_sources() {
        let docs = documents(2);
        let lines = build_bulk_lines("gmail", &docs).unwrap();
        assert_eq!(lines.len(), 4);

        for (i, (id, doc)) in docs.iter().enumerate() {
            let action = &lines[2 * i];
            let source = &lines[2 * i + 1];

            assert_eq!(action["index"]["_index"], "gmail");
            assert_eq!(action["index"]["_id"], id.as_str());
            assert_eq!(source["subject"], doc.subject.as_str());
            assert_eq!(source["from"], doc.from.as_str());
            assert_eq!(source["hourOfDay"], 12);
            assert!(source.get("index").is_none());
        }
    }

    #[test]
    fn test_parse_all_succeeded() {
        let docs = documents(2);
        let response = json!({
            "took": 3,
            "errors": false,
            "items": [
                {"index": {"_id": docs[0].0.as_str(), "status": 201, "result": "created"}},
                {"index": {"_id": docs[1].0.as_str(), "status": 200, "result": "updated"}}
            ]
        });

        let summary = parse_bulk_response(&docs, &response).unwrap();
        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn test_parse_item_errors() {
        let docs = documents(3);
        let response = json!({
            "errors": true,
            "items": [
                {"index": {"_id": docs[0].0.as_str(), "status": 201}},
                {"index": {
                    "_id": docs[1].0.as_str(),
                    "status": 400,
                    "error": {"type": "mapper_parsing_exception", "reason": "failed to parse field [date]"}
                }},
                {"index": {"_id": docs[2].0.as_str(), "status": 201}}
            ]
        });

        let summary = parse_bulk_response(&docs, &response).unwrap();
        assert_eq!(summary.succeeded, 2);
        assert!(summary.is_partial());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].id.as_ref(), Some(&docs[1].0));
        assert_eq!(summary.first_failure_reason(), Some("failed to parse field [date]"));
    }

    #[test]
    fn test_parse_keeps_failures_with_unknown_id() {
        let docs = documents(2);
        let response = json!({
            "errors": true,
            "items": [
                {"index": {"_id": docs[0].0.as_str(), "status": 201}},
                {"index": {
                    "_id": "not-a-submitted-id",
                    "status": 409,
                    "error": {"type": "version_conflict_engine_exception", "reason": "version conflict"}
                }}
            ]
        });

        let summary = parse_bulk_response(&docs, &response).unwrap();
        assert!(summary.is_partial());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].id, None);
        assert_eq!(summary.first_failure_reason(), Some("version conflict"));
    }

    #[test]
    fn test_parse_matches_position_without_id() {
        let docs = documents(2);
        let response = json!({
            "items": [
                {"index": {"status": 201}},
                {"index": {"status": 500}}
            ]
        });

        let summary = parse_bulk_response(&docs, &response).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failures[0].id.as_ref(), Some(&docs[1].0));
        assert_eq!(summary.first_failure_reason(), Some("status 500"));
    }

    #[test]
    fn test_parse_missing_items() {
        let docs = documents(1);
        let response = json!({"error": "boom"});
        assert!(parse_bulk_response(&docs, &response).is_err());
    }
}
