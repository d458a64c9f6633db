//! Ingestion mappers converting raw backend documents into [`Preview`] and
//! [`ConnectionEntry`] records.
//!
//! These are the single normalization point for entity shapes: every slice
//! stores what comes out of here, so heterogeneous backend documents can
//! never leak inconsistent shapes into selectors. The mappers are total
//! (no panics, `None` instead of errors) and idempotent: mapping an
//! already-mapped document yields an equivalent result.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::ids::canonical_id;
use crate::types::{ConnectionEntry, Preview};

/// Map a raw user-like document into a [`Preview`].
///
/// Accepts a full user document, a wrapper holding the original document
/// under `raw` (the shape a serialized `Preview` itself has), or
/// null/undefined. Returns `None` when no id can be resolved.
pub fn map_user_preview(raw: &Value) -> Option<Preview> {
    let doc = unwrap_raw(raw);
    let id = canonical_id(doc)?;

    let name = string_field(doc, "name")
        .or_else(|| string_field(doc, "displayName"))
        .or_else(|| full_name(doc))
        .or_else(|| string_field(doc, "companyName"))
        .or_else(|| string_field(doc, "schoolName"))
        .or_else(|| string_field(doc, "email"))
        .unwrap_or_else(|| id.clone());

    let avatar_url = string_field(doc, "avatarUrl")
        .or_else(|| string_field(doc, "avatar"))
        .or_else(|| string_field(doc, "profileImage"))
        .or_else(|| string_field(doc, "logo"));

    let subtitle = string_field(doc, "subtitle")
        .or_else(|| string_field(doc, "role").map(|role| role_subtitle(&role)));

    Some(Preview {
        id,
        name,
        avatar_url,
        subtitle,
        raw: doc.clone(),
    })
}

/// Map a raw connection document into a [`ConnectionEntry`].
///
/// The peer is whichever of `requester` / `recipient` does not match
/// `current_user_id`; either side may be a populated object or a bare id.
/// Returns `None` when the document has no id or does not involve the
/// current user.
pub fn map_connection_payload(raw: &Value, current_user_id: &str) -> Option<ConnectionEntry> {
    let id = canonical_id(raw)?;

    let requester = raw.get("requester");
    let recipient = raw.get("recipient");
    let requester_id = requester.and_then(canonical_id);
    let recipient_id = recipient.and_then(canonical_id);

    let peer_side = if requester_id.as_deref() == Some(current_user_id) {
        recipient
    } else if recipient_id.as_deref() == Some(current_user_id) {
        requester
    } else {
        return None;
    }?;

    let peer = side_preview(peer_side)?;
    let created_at = timestamp_field(raw, "createdAt");

    Some(ConnectionEntry { id, peer, created_at })
}

/// Build a preview from one side of a connection, which may be a populated
/// user object or a bare id string.
fn side_preview(side: &Value) -> Option<Preview> {
    if side.is_object() {
        return map_user_preview(side);
    }
    let id = canonical_id(side)?;
    Some(Preview {
        name: id.clone(),
        id,
        avatar_url: None,
        subtitle: None,
        raw: side.clone(),
    })
}

/// Human subtitle for a backend role tag.
fn role_subtitle(role: &str) -> String {
    match role {
        "student" => "Student".to_string(),
        "teacher" => "Teacher".to_string(),
        "company" => "Company".to_string(),
        "school" => "School".to_string(),
        "education_manager" => "Education Manager".to_string(),
        "admin" => "Administrator".to_string(),
        other => title_case(other),
    }
}

fn title_case(tag: &str) -> String {
    tag.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A wrapper produced by an earlier mapping pass keeps the original document
/// under `raw`; unwrap it so repeated mapping converges on the same source.
fn unwrap_raw(raw: &Value) -> &Value {
    match raw.get("raw") {
        Some(inner) if inner.is_object() && canonical_id(inner).is_some() => inner,
        _ => raw,
    }
}

fn string_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn full_name(doc: &Value) -> Option<String> {
    let first = string_field(doc, "firstName");
    let last = string_field(doc, "lastName");
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{f} {l}")),
        (Some(f), None) => Some(f),
        (None, Some(l)) => Some(l),
        (None, None) => None,
    }
}

fn timestamp_field(doc: &Value, key: &str) -> Option<DateTime<Utc>> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student_doc() -> Value {
        json!({
            "_id": "u9",
            "firstName": "Ana",
            "lastName": "Lindqvist",
            "role": "student",
            "avatar": "https://cdn.example/a.png",
        })
    }

    #[test]
    fn maps_a_full_user_document() {
        let preview = map_user_preview(&student_doc()).unwrap();
        assert_eq!(preview.id, "u9");
        assert_eq!(preview.name, "Ana Lindqvist");
        assert_eq!(preview.subtitle.as_deref(), Some("Student"));
        assert_eq!(preview.avatar_url.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(preview.raw, student_doc());
    }

    #[test]
    fn mapping_is_idempotent() {
        let once = map_user_preview(&student_doc()).unwrap();
        let twice = map_user_preview(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unwraps_nested_raw_wrapper() {
        let wrapped = json!({"raw": student_doc()});
        let preview = map_user_preview(&wrapped).unwrap();
        assert_eq!(preview.id, "u9");
        assert_eq!(preview.name, "Ana Lindqvist");
    }

    #[test]
    fn returns_none_without_an_id() {
        assert!(map_user_preview(&Value::Null).is_none());
        assert!(map_user_preview(&json!({"firstName": "Ana"})).is_none());
    }

    #[test]
    fn unknown_roles_get_a_title_cased_subtitle() {
        let doc = json!({"id": "u1", "name": "X", "role": "leading_company"});
        let preview = map_user_preview(&doc).unwrap();
        assert_eq!(preview.subtitle.as_deref(), Some("Leading Company"));
    }

    #[test]
    fn connection_peer_is_the_other_side() {
        let doc = json!({
            "_id": "c1",
            "requester": {"_id": "me", "name": "Me"},
            "recipient": student_doc(),
            "createdAt": "2026-03-01T10:00:00Z",
        });
        let entry = map_connection_payload(&doc, "me").unwrap();
        assert_eq!(entry.id, "c1");
        assert_eq!(entry.peer.id, "u9");
        assert!(entry.created_at.is_some());
    }

    #[test]
    fn connection_handles_bare_id_sides() {
        let doc = json!({
            "id": "c2",
            "requester": "u9",
            "recipient": "me",
        });
        let entry = map_connection_payload(&doc, "me").unwrap();
        assert_eq!(entry.peer.id, "u9");
        assert_eq!(entry.peer.name, "u9");
    }

    #[test]
    fn connection_not_involving_current_user_is_dropped() {
        let doc = json!({
            "id": "c3",
            "requester": "a",
            "recipient": "b",
        });
        assert!(map_connection_payload(&doc, "me").is_none());
    }
}
