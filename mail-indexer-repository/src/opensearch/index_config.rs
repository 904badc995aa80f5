//! OpenSearch index configuration and mappings.
//!
//! This module defines the index name and the mappings for the mail index.

use serde_json::{json, Value};

/// Default name of the mail index.
pub const DEFAULT_INDEX_NAME: &str = "gmail";

/// Which index documents are written to.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The index name.
    pub name: String,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// Get the index settings and mappings for the mail index.
///
/// The configuration includes:
/// - **Keyword fields**: sender, recipient and weekday, for aggregations and exact filters
/// - **text** subject with a `raw` keyword sub-field
/// - **date**, **integer** and **boolean** fields for the time and security facets
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "from": {
                    "type": "keyword"
                },
                "to": {
                    "type": "keyword"
                },
                "date": {
                    "type": "date"
                },
                "subject": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword",
                            "ignore_above": 256
                        }
                    }
                },
                "hourOfDay": {
                    "type": "integer"
                },
                "dayOfWeek": {
                    "type": "keyword"
                },
                "secure": {
                    "type": "boolean"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["from"]["type"], "keyword");
        assert_eq!(properties["to"]["type"], "keyword");
        assert_eq!(properties["date"]["type"], "date");
        assert_eq!(properties["subject"]["type"], "text");
        assert_eq!(properties["subject"]["fields"]["raw"]["type"], "keyword");
        assert_eq!(properties["hourOfDay"]["type"], "integer");
        assert_eq!(properties["dayOfWeek"]["type"], "keyword");
        assert_eq!(properties["secure"]["type"], "boolean");
    }

    #[test]
    fn test_default_index_name() {
        assert_eq!(IndexConfig::default().name, "gmail");
    }
}
