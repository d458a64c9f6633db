//! Connection graph cache.
//!
//! A peer id lives in at most one of the three buckets (network / incoming /
//! outgoing) at any time. Acceptance atomically moves an incoming entry into
//! the network and mirrors the peer into the follower/following lists.
//! Follow and unfollow are explicit two-phase optimistic mutations: every
//! begin has a matching confirm or revert.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use liahub_shared::ids::canonical_id;
use liahub_shared::preview::map_connection_payload;
use liahub_shared::types::{ConnectionEntry, FetchStatus};

/// Prior membership recorded when an optimistic follow/unfollow begins,
/// restored verbatim on revert.
#[derive(Debug, Clone, Copy)]
struct PendingFollow {
    was_following: bool,
}

#[derive(Debug, Default)]
pub struct ConnectionSlice {
    revision: u64,
    pub network: Vec<ConnectionEntry>,
    pub incoming: Vec<ConnectionEntry>,
    pub outgoing: Vec<ConnectionEntry>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub status: FetchStatus,
    pub error: Option<String>,
    pending_follows: HashMap<String, PendingFollow>,
}

impl ConnectionSlice {
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

    /// Replace the whole graph from one backend payload.
    ///
    /// Each categorized list is deduplicated by peer id (first seen wins),
    /// then bucket exclusivity is enforced: network beats incoming beats
    /// outgoing when the backend files the same peer in more than one list.
    pub fn apply_graph(&mut self, payload: &Value, current_user_id: &str) {
        let network = dedupe_by_peer(mapped_list(payload, "network", current_user_id));
        let mut incoming = dedupe_by_peer(mapped_list(payload, "incoming", current_user_id));
        let mut outgoing = dedupe_by_peer(mapped_list(payload, "outgoing", current_user_id));

        incoming.retain(|entry| !contains_peer(&network, &entry.peer.id));
        outgoing.retain(|entry| {
            !contains_peer(&network, &entry.peer.id) && !contains_peer(&incoming, &entry.peer.id)
        });

        self.network = network;
        self.incoming = incoming;
        self.outgoing = outgoing;
        self.followers = id_list(payload, "followers");
        self.following = id_list(payload, "following");
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
    }

    /// Accept a pending incoming connection.
    ///
    /// Removes the entry from incoming, inserts it into the network (unless
    /// the peer is somehow already there), and mirrors the peer id into both
    /// followers and following. Returns the accepted entry.
    pub fn accept_incoming(&mut self, connection_id: &str) -> Option<ConnectionEntry> {
        let position = self.incoming.iter().position(|e| e.id == connection_id)?;
        let entry = self.incoming.remove(position);

        if !contains_peer(&self.network, &entry.peer.id) {
            self.network.push(entry.clone());
        }
        push_unique(&mut self.followers, &entry.peer.id);
        push_unique(&mut self.following, &entry.peer.id);

        self.touch();
        Some(entry)
    }

    /// Decline a pending incoming connection.
    pub fn decline_incoming(&mut self, connection_id: &str) -> bool {
        let before = self.incoming.len();
        self.incoming.retain(|e| e.id != connection_id);
        let removed = self.incoming.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Record a freshly requested outgoing connection.
    ///
    /// No-op when the peer already occupies a bucket, preserving
    /// exclusivity.
    pub fn add_outgoing(&mut self, entry: ConnectionEntry) {
        let peer_id = &entry.peer.id;
        if contains_peer(&self.network, peer_id)
            || contains_peer(&self.incoming, peer_id)
            || contains_peer(&self.outgoing, peer_id)
        {
            debug!(peer = %peer_id, "Peer already present in a bucket, skipping");
            return;
        }
        self.outgoing.push(entry);
        self.touch();
    }

    // -- optimistic follow / unfollow ---------------------------------------

    /// Optimistically add the peer to the following list. Must be paired
    /// with [`Self::confirm_follow`] or [`Self::revert_follow`].
    pub fn begin_follow(&mut self, peer_id: &str) {
        let was_following = self.following.iter().any(|id| id == peer_id);
        self.pending_follows
            .insert(peer_id.to_string(), PendingFollow { was_following });
        push_unique(&mut self.following, peer_id);
        self.touch();
    }

    /// Optimistically remove the peer from the following list. Must be
    /// paired with [`Self::confirm_follow`] or [`Self::revert_follow`].
    pub fn begin_unfollow(&mut self, peer_id: &str) {
        let was_following = self.following.iter().any(|id| id == peer_id);
        self.pending_follows
            .insert(peer_id.to_string(), PendingFollow { was_following });
        self.following.retain(|id| id != peer_id);
        self.touch();
    }

    /// The optimistic change was confirmed by the server; drop the saved
    /// prior state. Authoritative counts arrive with the next
    /// [`Self::apply_graph`].
    pub fn confirm_follow(&mut self, peer_id: &str) {
        self.pending_follows.remove(peer_id);
    }

    /// The optimistic change was rejected; restore the prior membership.
    pub fn revert_follow(&mut self, peer_id: &str) {
        let Some(pending) = self.pending_follows.remove(peer_id) else {
            return;
        };
        if pending.was_following {
            push_unique(&mut self.following, peer_id);
        } else {
            self.following.retain(|id| id != peer_id);
        }
        self.touch();
    }

    /// Which bucket a peer currently occupies, if any. Used by tests and
    /// derived views; at most one bucket can ever match.
    pub fn bucket_of(&self, peer_id: &str) -> Option<&'static str> {
        if contains_peer(&self.network, peer_id) {
            Some("network")
        } else if contains_peer(&self.incoming, peer_id) {
            Some("incoming")
        } else if contains_peer(&self.outgoing, peer_id) {
            Some("outgoing")
        } else {
            None
        }
    }
}

/// Deduplicate entries by peer id, first seen wins.
pub fn dedupe_by_peer(entries: Vec<ConnectionEntry>) -> Vec<ConnectionEntry> {
    let mut seen = HashMap::new();
    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.peer.id.clone(), ()).is_none() {
            result.push(entry);
        }
    }
    result
}

fn mapped_list(payload: &Value, key: &str, current_user_id: &str) -> Vec<ConnectionEntry> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| map_connection_payload(doc, current_user_id))
                .collect()
        })
        .unwrap_or_default()
}

fn id_list(payload: &Value, key: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    if let Some(docs) = payload.get(key).and_then(Value::as_array) {
        for id in docs.iter().filter_map(canonical_id) {
            push_unique(&mut ids, &id);
        }
    }
    ids
}

fn contains_peer(entries: &[ConnectionEntry], peer_id: &str) -> bool {
    entries.iter().any(|e| e.peer.id == peer_id)
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connection(id: &str, peer: &str) -> Value {
        json!({
            "_id": id,
            "requester": {"_id": peer, "name": peer},
            "recipient": "me",
        })
    }

    fn graph(network: Vec<Value>, incoming: Vec<Value>, outgoing: Vec<Value>) -> Value {
        json!({
            "network": network,
            "incoming": incoming,
            "outgoing": outgoing,
            "followers": [],
            "following": [],
        })
    }

    #[test]
    fn a_peer_occupies_at_most_one_bucket() {
        let mut slice = ConnectionSlice::new();
        // The backend files u9 in every list at once.
        slice.apply_graph(
            &graph(
                vec![connection("c1", "u9")],
                vec![connection("c2", "u9")],
                vec![connection("c3", "u9")],
            ),
            "me",
        );

        assert_eq!(slice.bucket_of("u9"), Some("network"));
        assert_eq!(slice.incoming.len(), 0);
        assert_eq!(slice.outgoing.len(), 0);
    }

    #[test]
    fn duplicate_entries_within_a_list_keep_the_first() {
        let mut slice = ConnectionSlice::new();
        slice.apply_graph(
            &graph(
                vec![],
                vec![connection("c1", "u9"), connection("c2", "u9")],
                vec![],
            ),
            "me",
        );

        assert_eq!(slice.incoming.len(), 1);
        assert_eq!(slice.incoming[0].id, "c1");
    }

    #[test]
    fn accept_moves_incoming_to_network_and_mirrors_follow_lists() {
        let mut slice = ConnectionSlice::new();
        slice.apply_graph(&graph(vec![], vec![connection("c1", "u9")], vec![]), "me");

        let accepted = slice.accept_incoming("c1").unwrap();

        assert_eq!(accepted.peer.id, "u9");
        assert_eq!(slice.bucket_of("u9"), Some("network"));
        assert!(slice.incoming.is_empty());
        assert!(slice.followers.contains(&"u9".to_string()));
        assert!(slice.following.contains(&"u9".to_string()));
    }

    #[test]
    fn follow_revert_restores_prior_membership() {
        let mut slice = ConnectionSlice::new();

        slice.begin_follow("u9");
        assert!(slice.following.contains(&"u9".to_string()));

        slice.revert_follow("u9");
        assert!(!slice.following.contains(&"u9".to_string()));
    }

    #[test]
    fn unfollow_revert_reinstates_the_peer() {
        let mut slice = ConnectionSlice::new();
        slice.begin_follow("u9");
        slice.confirm_follow("u9");

        slice.begin_unfollow("u9");
        assert!(!slice.following.contains(&"u9".to_string()));

        slice.revert_follow("u9");
        assert!(slice.following.contains(&"u9".to_string()));
    }

    #[test]
    fn confirmed_follow_survives_a_revert_of_a_later_toggle() {
        let mut slice = ConnectionSlice::new();
        slice.begin_follow("u9");
        slice.confirm_follow("u9");

        // A second optimistic follow of an already-followed peer, reverted.
        slice.begin_follow("u9");
        slice.revert_follow("u9");

        assert!(slice.following.contains(&"u9".to_string()));
    }

    #[test]
    fn add_outgoing_respects_exclusivity() {
        let mut slice = ConnectionSlice::new();
        slice.apply_graph(&graph(vec![connection("c1", "u9")], vec![], vec![]), "me");

        slice.add_outgoing(ConnectionEntry {
            id: "c9".into(),
            peer: liahub_shared::preview::map_user_preview(&json!({"id": "u9"})).unwrap(),
            created_at: None,
        });

        assert_eq!(slice.bucket_of("u9"), Some("network"));
        assert!(slice.outgoing.is_empty());
    }
}
