//! User preview cache.
//!
//! Entries are keyed by canonical id with last-write-wins semantics. Lookup
//! failures are stored per id so one missing profile never blocks unrelated
//! lookups.

use std::collections::HashMap;

use serde_json::Value;

use liahub_shared::preview::map_user_preview;
use liahub_shared::types::{FetchStatus, Preview};

#[derive(Debug, Default)]
pub struct UserSlice {
    revision: u64,
    entries: HashMap<String, Preview>,
    pub status: FetchStatus,
    pub error: Option<String>,
    lookup_errors: HashMap<String, String>,
}

impl UserSlice {
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

    /// Merge a list of raw user documents. Unmappable documents are skipped;
    /// mapped ones overwrite any existing entry with the same id.
    pub fn apply_users(&mut self, docs: &[Value]) {
        for doc in docs {
            if let Some(preview) = map_user_preview(doc) {
                self.entries.insert(preview.id.clone(), preview);
            }
        }
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
    }

    /// Merge one user document, clearing any stale lookup error for it.
    /// Returns the canonical id when the document was cacheable.
    pub fn apply_user(&mut self, doc: &Value) -> Option<String> {
        let preview = map_user_preview(doc)?;
        let id = preview.id.clone();
        self.lookup_errors.remove(&id);
        self.entries.insert(id.clone(), preview);
        self.touch();
        Some(id)
    }

    /// Record a failed lookup for one id without touching other entries.
    pub fn lookup_failed(&mut self, user_id: &str, message: String) {
        self.lookup_errors.insert(user_id.to_string(), message);
        self.touch();
    }

    pub fn get(&self, user_id: &str) -> Option<&Preview> {
        self.entries.get(user_id)
    }

    pub fn lookup_error(&self, user_id: &str) -> Option<&str> {
        self.lookup_errors.get(user_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_fetches_never_duplicate_an_entry() {
        let mut slice = UserSlice::new();
        slice.apply_users(&[json!({"_id": "u1", "name": "Ana"})]);
        slice.apply_users(&[json!({"id": "u1", "name": "Ana Lindqvist"})]);

        assert_eq!(slice.len(), 1);
        assert_eq!(slice.get("u1").unwrap().name, "Ana Lindqvist");
    }

    #[test]
    fn unmappable_documents_are_skipped() {
        let mut slice = UserSlice::new();
        slice.apply_users(&[json!({"name": "no id"}), json!({"id": "u2", "name": "Bo"})]);

        assert_eq!(slice.len(), 1);
        assert!(slice.get("u2").is_some());
    }

    #[test]
    fn one_failed_lookup_does_not_block_others() {
        let mut slice = UserSlice::new();
        slice.lookup_failed("u404", "User not found".into());
        slice.apply_user(&json!({"id": "u2", "name": "Bo"}));

        assert_eq!(slice.lookup_error("u404"), Some("User not found"));
        assert!(slice.lookup_error("u2").is_none());
        assert!(slice.get("u2").is_some());
    }

    #[test]
    fn successful_lookup_clears_a_stale_error() {
        let mut slice = UserSlice::new();
        slice.lookup_failed("u1", "User not found".into());
        slice.apply_user(&json!({"id": "u1", "name": "Ana"}));

        assert!(slice.lookup_error("u1").is_none());
    }

    #[test]
    fn every_reducer_bumps_the_revision() {
        let mut slice = UserSlice::new();
        let r0 = slice.revision();
        slice.fetch_started();
        slice.apply_users(&[json!({"id": "u1"})]);
        assert!(slice.revision() > r0 + 1);
    }
}
