//! Dashboard table cache.
//!
//! One global fetch populates all seven sections atomically; there is no
//! per-section fetch. A repeat fetch inside the TTL window is a cache hit
//! and must not touch state. Mutations (create/update/delete) target exactly
//! one section, with two exceptions the backend forces on us:
//!
//! - an update response may file the record under a different section than
//!   requested (server-side reclassification), in which case the stale copy
//!   is removed from the requested section and the record lands in the
//!   response's section;
//! - a delete rejected as not-found still purges the record locally, since
//!   the row is already gone server-side and keeping it would leave a stuck
//!   entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use liahub_shared::constants::DASHBOARD_CACHE_TTL_SECS;
use liahub_shared::ids::canonical_id;
use liahub_shared::types::{FetchStatus, MutationStatus, SectionKey, SectionRecord};

/// Cache and mutation state for one named section.
#[derive(Debug, Default)]
pub struct SectionState {
    pub data: Vec<SectionRecord>,
    pub status: FetchStatus,
    pub mutation_status: MutationStatus,
    pub mutation_error: Option<String>,
    /// Assignments awaiting confirmation; only ever populated for the
    /// students section.
    pub pending_assignments: Vec<SectionRecord>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub cache_valid: bool,
}

#[derive(Debug)]
pub struct DashboardSlice {
    revision: u64,
    sections: HashMap<SectionKey, SectionState>,
    pub last_global_fetch: Option<DateTime<Utc>>,
    pub error: Option<String>,
    issued_seq: u64,
    applied_seq: u64,
}

impl Default for DashboardSlice {
    fn default() -> Self {
        let sections = SectionKey::ALL
            .iter()
            .map(|key| (*key, SectionState::default()))
            .collect();
        Self {
            revision: 0,
            sections,
            last_global_fetch: None,
            error: None,
            issued_seq: 0,
            applied_seq: 0,
        }
    }
}

impl DashboardSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn section(&self, key: SectionKey) -> &SectionState {
        &self.sections[&key]
    }

    fn section_mut(&mut self, key: SectionKey) -> &mut SectionState {
        self.sections.entry(key).or_default()
    }

    /// Whether the last global fetch is still inside the TTL window. A fresh
    /// cache makes a non-forced fetch a no-op.
    pub fn is_cache_fresh(&self, now: DateTime<Utc>) -> bool {
        self.last_global_fetch
            .is_some_and(|at| (now - at).num_seconds() < DASHBOARD_CACHE_TTL_SECS)
    }

    /// Begin a global fetch. Returns the request sequence number the
    /// fulfillment must present; a fulfillment older than the newest applied
    /// one is dropped.
    pub fn fetch_started(&mut self) -> u64 {
        self.issued_seq += 1;
        self.error = None;
        for state in self.sections.values_mut() {
            state.status = FetchStatus::Loading;
        }
        self.touch();
        self.issued_seq
    }

    /// Apply a full dashboard payload, populating every section atomically.
    /// Returns `false` when the fulfillment is stale and was dropped.
    pub fn apply_dashboard(&mut self, seq: u64, payload: &Value, now: DateTime<Utc>) -> bool {
        if seq < self.applied_seq {
            debug!(seq, newest = self.applied_seq, "Dropping stale dashboard fulfillment");
            return false;
        }
        self.applied_seq = seq;

        for key in SectionKey::ALL {
            let data = record_list(payload.get(key.as_str()), key);
            let state = self.section_mut(key);
            state.data = data;
            state.status = FetchStatus::Succeeded;
            state.last_fetched = Some(now);
            state.cache_valid = true;
        }

        let pending = record_list(payload.get("pendingAssignments"), SectionKey::Students);
        self.section_mut(SectionKey::Students).pending_assignments = pending;

        self.last_global_fetch = Some(now);
        self.error = None;
        self.touch();
        true
    }

    /// A global fetch failed. Section data already loaded is kept; only the
    /// statuses and the slice error change.
    pub fn fetch_failed(&mut self, seq: u64, message: String) {
        if seq < self.applied_seq {
            return;
        }
        for state in self.sections.values_mut() {
            state.status = FetchStatus::Failed;
        }
        self.error = Some(message);
        self.touch();
    }

    // -- mutations ----------------------------------------------------------

    pub fn mutation_started(&mut self, key: SectionKey) {
        let state = self.section_mut(key);
        state.mutation_status = MutationStatus::Pending;
        state.mutation_error = None;
        self.touch();
    }

    /// A mutation failed. Only the targeted section's mutation state
    /// changes; its read status and data stay exactly as they were.
    pub fn mutation_failed(&mut self, key: SectionKey, message: String) {
        let state = self.section_mut(key);
        state.mutation_status = MutationStatus::Idle;
        state.mutation_error = Some(message);
        self.touch();
    }

    /// Merge a created record into the section the response filed it under.
    pub fn apply_created(&mut self, requested: SectionKey, doc: &Value) {
        self.apply_upsert(requested, doc);
    }

    /// Merge an updated record, honoring server-side reclassification: when
    /// the response reports a different section than requested, the stale
    /// copy is removed from the requested section first.
    pub fn apply_updated(&mut self, requested: SectionKey, doc: &Value) {
        self.apply_upsert(requested, doc);
    }

    fn apply_upsert(&mut self, requested: SectionKey, doc: &Value) {
        let Some(record) = map_section_record(doc, requested) else {
            warn!(section = %requested, "Mutation response had no identifiable record");
            self.finish_mutation(requested);
            return;
        };

        if record.section != requested {
            let id = record.id.clone();
            self.section_mut(requested).data.retain(|r| r.id != id);
        }

        let target = self.section_mut(record.section);
        match target.data.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => target.data.push(record),
        }
        self.finish_mutation(requested);
    }

    /// Remove a record from a section, including the students section's
    /// pending assignments. Also the not-found-on-delete path: the record is
    /// purged even though the server said it never saw it.
    pub fn apply_deleted(&mut self, key: SectionKey, record_id: &str) {
        let state = self.section_mut(key);
        state.data.retain(|r| r.id != record_id);
        state
            .pending_assignments
            .retain(|r| r.id != record_id);
        self.finish_mutation(key);
    }

    /// A two-step move left the section inconsistent and compensation also
    /// failed; park the section in a needs-manual-fix state.
    pub fn set_needs_reconciliation(&mut self, key: SectionKey, message: String) {
        let state = self.section_mut(key);
        state.mutation_status = MutationStatus::Idle;
        state.mutation_error = Some(message);
        self.touch();
    }

    /// Resolve one pending student assignment. On confirmation the record
    /// joins the students table; either way it leaves the pending list.
    pub fn apply_assignment_resolved(&mut self, assignment_id: &str, confirmed: bool) {
        let state = self.section_mut(SectionKey::Students);
        let position = state
            .pending_assignments
            .iter()
            .position(|r| r.id == assignment_id);
        let Some(position) = position else {
            debug!(assignment = %assignment_id, "No pending assignment to resolve");
            return;
        };
        let record = state.pending_assignments.remove(position);
        if confirmed && !state.data.iter().any(|r| r.id == record.id) {
            state.data.push(record);
        }
        self.touch();
    }

    fn finish_mutation(&mut self, key: SectionKey) {
        let state = self.section_mut(key);
        state.mutation_status = MutationStatus::Idle;
        state.mutation_error = None;
        self.touch();
    }
}

/// Map one raw row. The record keeps the section the backend filed it
/// under when the document names one, else the requested section.
fn map_section_record(doc: &Value, fallback: SectionKey) -> Option<SectionRecord> {
    let id = canonical_id(doc)?;
    let section = doc
        .get("section")
        .and_then(Value::as_str)
        .and_then(SectionKey::from_str)
        .unwrap_or(fallback);
    Some(SectionRecord {
        id,
        section,
        fields: doc.clone(),
    })
}

fn record_list(value: Option<&Value>, section: SectionKey) -> Vec<SectionRecord> {
    value
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| map_section_record(doc, section))
                .collect()
        })
        .unwrap_or_default()
}
