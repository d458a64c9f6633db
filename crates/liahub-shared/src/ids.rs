//! Canonical id extraction.
//!
//! Different backend endpoints emit different id field names for the same
//! logical entity (`id`, `_id`, `postingId`, `userId`). Every ingestion
//! boundary resolves aliases here, so nothing downstream of the mappers ever
//! probes for an alternate id field.

use serde_json::Value;

/// Id field aliases, in priority order.
const ID_ALIASES: [&str; 4] = ["id", "_id", "postingId", "userId"];

/// Resolve the canonical id of a raw backend document.
///
/// Accepts a bare id (string or number) or a document carrying any of the
/// known alias fields. Returns `None` when no identifiable id exists.
pub fn canonical_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => ID_ALIASES
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(id_value),
        _ => None,
    }
}

fn id_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_each_alias() {
        assert_eq!(canonical_id(&json!({"id": "a"})), Some("a".into()));
        assert_eq!(canonical_id(&json!({"_id": "b"})), Some("b".into()));
        assert_eq!(canonical_id(&json!({"postingId": "c"})), Some("c".into()));
        assert_eq!(canonical_id(&json!({"userId": "d"})), Some("d".into()));
    }

    #[test]
    fn prefers_id_over_underscore_id() {
        let doc = json!({"_id": "mongo", "id": "api"});
        assert_eq!(canonical_id(&doc), Some("api".into()));
    }

    #[test]
    fn accepts_bare_ids_and_numbers() {
        assert_eq!(canonical_id(&json!("u42")), Some("u42".into()));
        assert_eq!(canonical_id(&json!(42)), Some("42".into()));
        assert_eq!(canonical_id(&json!({"id": 7})), Some("7".into()));
    }

    #[test]
    fn rejects_unidentifiable_documents() {
        assert_eq!(canonical_id(&Value::Null), None);
        assert_eq!(canonical_id(&json!("")), None);
        assert_eq!(canonical_id(&json!({"name": "no id here"})), None);
        assert_eq!(canonical_id(&json!({"id": null})), None);
    }
}
