//! Notification cache.
//!
//! Items are deduplicated by id. `read_at` is monotonic: once set, no
//! refresh or repeated mark can clear it. Client-synthesized notifications
//! carry `local = true`; they are readable like any other entry but are
//! never handed to the server read-receipt batch.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use liahub_shared::ids::canonical_id;
use liahub_shared::preview::map_user_preview;
use liahub_shared::types::{FetchStatus, Notification, NotificationKind, Preview};

#[derive(Debug, Default)]
pub struct NotificationSlice {
    revision: u64,
    pub items: Vec<Notification>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl NotificationSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn fetch_started(&mut self) {
        self.status = FetchStatus::Loading;
        self.error = None;
        self.touch();
    }

    pub fn fetch_failed(&mut self, message: String) {
        self.status = FetchStatus::Failed;
        self.error = Some(message);
        self.touch();
    }

    /// Merge a list of raw notification documents.
    ///
    /// Existing entries with the same id are refreshed, except that a
    /// refresh can never clear an already-set `read_at` (monotonicity) and
    /// never demotes a local entry to a server one.
    pub fn apply_notifications(&mut self, docs: &[Value]) {
        for doc in docs {
            let Some(incoming) = map_notification(doc) else {
                continue;
            };
            match self.position(&incoming.id) {
                Some(index) => {
                    let existing = &mut self.items[index];
                    let read_at = existing.read_at.or(incoming.read_at);
                    let local = existing.local;
                    *existing = incoming;
                    existing.read_at = read_at;
                    existing.local = local;
                }
                None => self.items.push(incoming),
            }
        }
        self.items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
    }

    /// Synthesize a local notification (e.g. from a realtime event that has
    /// no server-side notification document). Returns its generated id.
    pub fn push_local(
        &mut self,
        kind: NotificationKind,
        actor: Option<Preview>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.items.insert(
            0,
            Notification {
                id: id.clone(),
                kind,
                actor,
                payload,
                created_at: now,
                read_at: None,
                archived_at: None,
                local: true,
            },
        );
        self.touch();
        id
    }

    /// Mark one notification read.
    ///
    /// Returns `true` when the entry transitioned unread -> read *and* has a
    /// server-side counterpart, i.e. when the id belongs in the acknowledge
    /// batch. An already-read entry keeps its original timestamp.
    pub fn mark_read(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let item = &mut self.items[index];
        if item.read_at.is_some() {
            return false;
        }
        item.read_at = Some(at);
        let was_server_backed = !item.local;
        self.touch();
        was_server_backed
    }

    /// Archive one notification.
    pub fn archive(&mut self, id: &str, at: DateTime<Utc>) {
        if let Some(index) = self.position(id) {
            if self.items[index].archived_at.is_none() {
                self.items[index].archived_at = Some(at);
                self.touch();
            }
        }
    }

    /// Ids of unread, server-backed notifications (batch candidates).
    pub fn unread_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|n| n.read_at.is_none() && !n.local)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Count of all unread notifications, local included.
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| n.read_at.is_none()).count()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.position(id).map(|i| &self.items[i])
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|n| n.id == id)
    }
}

/// Map a raw notification document into the canonical shape.
fn map_notification(doc: &Value) -> Option<Notification> {
    let id = canonical_id(doc)?;
    let kind = doc
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("default")
        .to_string();

    Some(Notification {
        id,
        kind: NotificationKind::from(kind),
        actor: doc.get("actor").and_then(map_user_preview),
        payload: doc.get("payload").cloned().unwrap_or(Value::Null),
        created_at: timestamp(doc, "createdAt").unwrap_or_else(Utc::now),
        read_at: timestamp(doc, "readAt"),
        archived_at: timestamp(doc, "archivedAt"),
        local: false,
    })
}

fn timestamp(doc: &Value, key: &str) -> Option<DateTime<Utc>> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(id: &str, read_at: Option<&str>) -> Value {
        json!({
            "_id": id,
            "type": "connection_request",
            "actor": {"_id": "u9", "name": "Ana"},
            "createdAt": "2026-03-01T10:00:00Z",
            "readAt": read_at,
        })
    }

    #[test]
    fn refetch_never_duplicates_entries() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[notification("n1", None)]);
        slice.apply_notifications(&[notification("n1", None)]);

        assert_eq!(slice.items.len(), 1);
    }

    #[test]
    fn read_at_is_monotonic_across_refreshes() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[notification("n1", None)]);

        let at = Utc::now();
        assert!(slice.mark_read("n1", at));

        // The server has not caught up yet and still reports it unread.
        slice.apply_notifications(&[notification("n1", None)]);
        assert_eq!(slice.get("n1").unwrap().read_at, Some(at));
    }

    #[test]
    fn marking_twice_keeps_the_first_timestamp() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[notification("n1", None)]);

        let first = Utc::now();
        assert!(slice.mark_read("n1", first));
        assert!(!slice.mark_read("n1", first + chrono::Duration::seconds(5)));
        assert_eq!(slice.get("n1").unwrap().read_at, Some(first));
    }

    #[test]
    fn local_notifications_stay_out_of_the_batch() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[notification("n1", None)]);
        let local_id = slice.push_local(
            NotificationKind::Message,
            None,
            json!({"threadId": "t1"}),
            Utc::now(),
        );

        let batch = slice.unread_ids();
        assert_eq!(batch, vec!["n1".to_string()]);

        // Reading the local entry reports "do not batch".
        assert!(!slice.mark_read(&local_id, Utc::now()));
        assert!(slice.get(&local_id).unwrap().read_at.is_some());
    }

    #[test]
    fn unknown_kinds_are_preserved_verbatim() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[json!({
            "id": "n2",
            "type": "galaxy_brain",
            "createdAt": "2026-03-01T10:00:00Z",
        })]);

        assert_eq!(
            slice.get("n2").unwrap().kind,
            NotificationKind::Other("galaxy_brain".into())
        );
    }

    #[test]
    fn items_are_ordered_newest_first() {
        let mut slice = NotificationSlice::new();
        slice.apply_notifications(&[
            json!({"id": "old", "type": "message", "createdAt": "2026-01-01T00:00:00Z"}),
            json!({"id": "new", "type": "message", "createdAt": "2026-06-01T00:00:00Z"}),
        ]);

        assert_eq!(slice.items[0].id, "new");
    }
}
