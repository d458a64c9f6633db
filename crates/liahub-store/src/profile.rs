//! Own-profile cache.
//!
//! The profile document as a whole follows last-write-wins like every other
//! entity, with one exception: the named profile sections (education,
//! experience, documents, ...) merge per section, so updating one section
//! never discards the others.

use std::collections::HashMap;

use serde_json::Value;

use liahub_shared::preview::map_user_preview;
use liahub_shared::types::{FetchStatus, Preview};

#[derive(Debug, Default)]
pub struct ProfileSlice {
    revision: u64,
    pub me: Option<Preview>,
    sections: HashMap<String, Value>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl ProfileSlice {
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

    /// Apply a full profile document. Sections present in the document are
    /// merged key by key; cached sections the document does not mention are
    /// kept.
    pub fn apply_profile(&mut self, doc: &Value) {
        self.me = map_user_preview(doc);
        if let Some(sections) = doc.get("sections").and_then(Value::as_object) {
            for (name, content) in sections {
                self.sections.insert(name.clone(), content.clone());
            }
        }
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
    }

    /// Replace one named section (the fulfillment of a section update).
    pub fn apply_section(&mut self, name: &str, content: Value) {
        self.sections.insert(name.to_string(), content);
        self.touch();
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// The current user's id, when a profile is loaded.
    pub fn user_id(&self) -> Option<&str> {
        self.me.as_ref().map(|p| p.id.as_str())
    }
}
