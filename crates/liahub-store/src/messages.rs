//! Message thread cache.
//!
//! Thread unread counts increment only for incoming messages on a thread
//! that is not the currently active one; opening or reading a thread resets
//! the count. Both the HTTP send path and the realtime bridge land in the
//! same [`MessageSlice::receive_message`] reducer, so the invariants hold
//! regardless of delivery path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use liahub_shared::ids::canonical_id;
use liahub_shared::preview::map_user_preview;
use liahub_shared::types::{Attachment, FetchStatus, Message, MessageOrigin, Thread};

#[derive(Debug, Default)]
pub struct MessageSlice {
    revision: u64,
    pub threads: Vec<Thread>,
    messages: HashMap<String, Vec<Message>>,
    pub active_thread: Option<String>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl MessageSlice {
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

    /// Merge the thread list. Existing threads are refreshed by id; the
    /// locally tracked unread count survives a refresh that reports fewer
    /// unread (the server catches up via the read endpoint, not here).
    pub fn apply_threads(&mut self, docs: &[Value], current_user_id: &str) {
        for doc in docs {
            let Some(incoming) = map_thread(doc, current_user_id) else {
                continue;
            };
            match self.threads.iter_mut().find(|t| t.id == incoming.id) {
                Some(existing) => {
                    let unread = existing.unread_count.max(incoming.unread_count);
                    *existing = incoming;
                    existing.unread_count = unread;
                }
                None => self.threads.push(incoming),
            }
        }
        self.sort_threads();
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
    }

    /// Replace the cached page of messages for one thread.
    pub fn apply_thread_messages(
        &mut self,
        thread_id: &str,
        docs: &[Value],
        current_user_id: &str,
    ) {
        let mut page: Vec<Message> = docs
            .iter()
            .filter_map(|doc| map_message(doc, current_user_id))
            .collect();
        page.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        self.messages.insert(thread_id.to_string(), page);
        self.touch();
    }

    /// Land one message in a thread, from either delivery path (HTTP send
    /// fulfillment or realtime push).
    ///
    /// Duplicate ids are dropped, the thread's `last_message_at` advances,
    /// and the unread count increments only for an incoming message on a
    /// non-active thread.
    pub fn receive_message(&mut self, thread_id: &str, doc: &Value, current_user_id: &str) {
        let Some(message) = map_message(doc, current_user_id) else {
            debug!(thread = %thread_id, "Dropping unmappable message document");
            return;
        };

        let entries = self.messages.entry(thread_id.to_string()).or_default();
        if entries.iter().any(|m| m.id == message.id) {
            debug!(message = %message.id, "Duplicate message id, ignoring");
            return;
        }

        let incoming = message.origin == MessageOrigin::Them;
        let sent_at = message.sent_at;
        entries.push(message);
        entries.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));

        let active = self.active_thread.as_deref() == Some(thread_id);
        match self.threads.iter_mut().find(|t| t.id == thread_id) {
            Some(thread) => {
                thread.last_message_at = Some(sent_at);
                if incoming && !active {
                    thread.unread_count += 1;
                }
            }
            None => {
                // A message for a thread we have not listed yet: create a
                // stub that the next thread fetch will flesh out.
                self.threads.push(Thread {
                    id: thread_id.to_string(),
                    participants: Vec::new(),
                    peer: None,
                    last_message_at: Some(sent_at),
                    unread_count: u32::from(incoming && !active),
                });
            }
        }
        self.sort_threads();
        self.touch();
    }

    /// Activate a thread and reset its unread count.
    pub fn open_thread(&mut self, thread_id: &str) {
        self.active_thread = Some(thread_id.to_string());
        self.mark_thread_read(thread_id);
        self.touch();
    }

    /// Deactivate whatever thread is open (navigation away).
    pub fn clear_active_thread(&mut self) {
        self.active_thread = None;
        self.touch();
    }

    /// Reset a thread's unread count to zero, whatever it was.
    pub fn mark_thread_read(&mut self, thread_id: &str) {
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            thread.unread_count = 0;
            self.touch();
        }
    }

    pub fn thread(&self, thread_id: &str) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn thread_messages(&self, thread_id: &str) -> &[Message] {
        self.messages.get(thread_id).map_or(&[], Vec::as_slice)
    }

    /// Sum of unread counts across all threads.
    pub fn unread_total(&self) -> u32 {
        self.threads.iter().map(|t| t.unread_count).sum()
    }

    fn sort_threads(&mut self) {
        self.threads
            .sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    }
}

/// Map a raw thread document; the peer is the participant that is not the
/// current user.
fn map_thread(doc: &Value, current_user_id: &str) -> Option<Thread> {
    let id = canonical_id(doc)?;
    let participants: Vec<_> = doc
        .get("participants")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(map_user_preview).collect())
        .unwrap_or_default();
    let peer = participants
        .iter()
        .find(|p| p.id != current_user_id)
        .cloned();

    Some(Thread {
        id,
        participants,
        peer,
        last_message_at: timestamp(doc, "lastMessageAt"),
        unread_count: doc
            .get("unreadCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
    })
}

/// Map a raw message document; origin is derived by comparing the sender to
/// the current user.
fn map_message(doc: &Value, current_user_id: &str) -> Option<Message> {
    let id = canonical_id(doc)?;
    let sender_id = doc
        .get("senderId")
        .or_else(|| doc.get("sender"))
        .and_then(canonical_id)?;
    let origin = if sender_id == current_user_id {
        MessageOrigin::Me
    } else {
        MessageOrigin::Them
    };

    let attachments = doc
        .get("attachments")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(map_attachment).collect())
        .unwrap_or_default();

    Some(Message {
        id,
        text: doc
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        sender_id,
        origin,
        sent_at: timestamp(doc, "time")
            .or_else(|| timestamp(doc, "sentAt"))
            .unwrap_or_else(Utc::now),
        attachments,
    })
}

fn map_attachment(doc: &Value) -> Option<Attachment> {
    Some(Attachment {
        file_name: doc.get("fileName").and_then(Value::as_str)?.to_string(),
        url: doc.get("url").and_then(Value::as_str)?.to_string(),
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

    fn thread_doc(id: &str) -> Value {
        json!({
            "_id": id,
            "participants": [
                {"_id": "me", "name": "Me"},
                {"_id": "u9", "name": "Ana"},
            ],
            "unreadCount": 0,
        })
    }

    fn message_doc(id: &str, sender: &str, time: &str) -> Value {
        json!({
            "_id": id,
            "senderId": sender,
            "text": "hej",
            "time": time,
        })
    }

    #[test]
    fn incoming_message_on_inactive_thread_increments_unread() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");

        slice.receive_message("t1", &message_doc("m1", "u9", "2026-03-01T10:00:00Z"), "me");

        assert_eq!(slice.thread("t1").unwrap().unread_count, 1);
    }

    #[test]
    fn incoming_message_on_the_active_thread_stays_read() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");
        slice.open_thread("t1");

        slice.receive_message("t1", &message_doc("m1", "u9", "2026-03-01T10:00:00Z"), "me");

        assert_eq!(slice.thread("t1").unwrap().unread_count, 0);
    }

    #[test]
    fn own_messages_never_increment_unread() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");

        slice.receive_message("t1", &message_doc("m1", "me", "2026-03-01T10:00:00Z"), "me");

        assert_eq!(slice.thread("t1").unwrap().unread_count, 0);
        assert_eq!(
            slice.thread_messages("t1")[0].origin,
            MessageOrigin::Me
        );
    }

    #[test]
    fn opening_a_thread_resets_unread_whatever_it_was() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");
        for i in 0..5 {
            slice.receive_message(
                "t1",
                &message_doc(&format!("m{i}"), "u9", "2026-03-01T10:00:00Z"),
                "me",
            );
        }
        assert_eq!(slice.thread("t1").unwrap().unread_count, 5);

        slice.open_thread("t1");
        assert_eq!(slice.thread("t1").unwrap().unread_count, 0);
    }

    #[test]
    fn duplicate_delivery_is_dropped() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");

        let doc = message_doc("m1", "u9", "2026-03-01T10:00:00Z");
        // Once from the send fulfillment, once from the realtime push.
        slice.receive_message("t1", &doc, "me");
        slice.receive_message("t1", &doc, "me");

        assert_eq!(slice.thread_messages("t1").len(), 1);
        assert_eq!(slice.thread("t1").unwrap().unread_count, 1);
    }

    #[test]
    fn a_message_for_an_unknown_thread_creates_a_stub() {
        let mut slice = MessageSlice::new();
        slice.receive_message("t9", &message_doc("m1", "u9", "2026-03-01T10:00:00Z"), "me");

        let stub = slice.thread("t9").unwrap();
        assert_eq!(stub.unread_count, 1);
        assert!(stub.peer.is_none());
    }

    #[test]
    fn messages_are_ordered_by_send_time() {
        let mut slice = MessageSlice::new();
        slice.receive_message("t1", &message_doc("m2", "u9", "2026-03-01T11:00:00Z"), "me");
        slice.receive_message("t1", &message_doc("m1", "u9", "2026-03-01T10:00:00Z"), "me");

        let ids: Vec<_> = slice.thread_messages("t1").iter().map(|m| &m.id).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[test]
    fn thread_peer_excludes_the_current_user() {
        let mut slice = MessageSlice::new();
        slice.apply_threads(&[thread_doc("t1")], "me");

        assert_eq!(slice.thread("t1").unwrap().peer.as_ref().unwrap().id, "u9");
    }
}
