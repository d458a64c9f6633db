//! Posting cache for jobs and LIA (internship) listings.
//!
//! A search fully replaces the list with the latest result page and resets
//! the selection to the first result; there is no incremental merge, and a
//! subsequent search is the canonical resync point for every optimistic
//! change. Wishlist and apply are explicit two-phase optimistic mutations:
//! every begin stores the prior values and is paired with a confirm or a
//! revert.
//!
//! Ingestion runs every document through the canonical id resolver, so
//! postings arriving from endpoints that disagree on the id field name
//! (`id` / `_id` / `postingId`) collapse to one cached entry. A mutation
//! that matches no cached posting logs and leaves state untouched; it never
//! breaks the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use liahub_shared::ids::canonical_id;
use liahub_shared::preview::map_user_preview;
use liahub_shared::types::{
    Application, ApplicationEvent, ApplicationStatus, FetchStatus, Posting,
};

/// Prior record state captured when an optimistic mutation begins.
#[derive(Debug, Clone)]
enum PendingChange {
    Wishlist { wishlisted: bool, count: u32 },
    Apply { applied: bool, count: u32 },
}

#[derive(Debug, Default)]
pub struct PostingSlice {
    revision: u64,
    pub list: Vec<Posting>,
    pub selected_id: Option<String>,
    pub status: FetchStatus,
    pub error: Option<String>,
    issued_seq: u64,
    applied_seq: u64,
    pending: HashMap<String, PendingChange>,
}

impl PostingSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Begin a search. Returns the sequence number its fulfillment must
    /// present; older fulfillments are dropped so a slow response can never
    /// overwrite a newer one.
    pub fn search_started(&mut self) -> u64 {
        self.issued_seq += 1;
        self.status = FetchStatus::Loading;
        self.error = None;
        self.touch();
        self.issued_seq
    }

    /// Replace the list with a result page and select its first entry.
    /// Returns `false` when the fulfillment was stale.
    pub fn apply_search(&mut self, seq: u64, docs: &[Value]) -> bool {
        if seq < self.applied_seq {
            debug!(seq, newest = self.applied_seq, "Dropping stale search fulfillment");
            return false;
        }
        self.applied_seq = seq;

        self.list = docs.iter().filter_map(map_posting).collect();
        self.selected_id = self.list.first().map(|p| p.id.clone());
        self.pending.clear();
        self.status = FetchStatus::Succeeded;
        self.error = None;
        self.touch();
        true
    }

    pub fn search_failed(&mut self, seq: u64, message: String) {
        if seq < self.applied_seq {
            return;
        }
        self.status = FetchStatus::Failed;
        self.error = Some(message);
        self.touch();
    }

    /// Select a posting by id (detail view).
    pub fn select(&mut self, posting_id: &str) {
        if self.list.iter().any(|p| p.id == posting_id) {
            self.selected_id = Some(posting_id.to_string());
            self.touch();
        }
    }

    /// Merge a freshly created posting at the head of the list.
    pub fn apply_created(&mut self, doc: &Value) {
        let Some(posting) = map_posting(doc) else {
            warn!("Created posting document had no identifiable id");
            return;
        };
        self.list.retain(|p| p.id != posting.id);
        self.list.insert(0, posting);
        self.touch();
    }

    // -- optimistic wishlist ------------------------------------------------

    /// Optimistically flip the wishlist flag, adjusting the count in the
    /// same direction. Returns the new flag value, or `None` when no cached
    /// posting matched (logged, not an error).
    pub fn begin_wishlist_toggle(&mut self, posting_id: &str) -> Option<bool> {
        let posting = match self.list.iter_mut().find(|p| p.id == posting_id) {
            Some(p) => p,
            None => {
                warn!(posting = %posting_id, "Wishlist toggle matched no cached posting");
                return None;
            }
        };
        self.pending.insert(
            posting_id.to_string(),
            PendingChange::Wishlist {
                wishlisted: posting.wishlisted,
                count: posting.wishlist_count,
            },
        );
        posting.wishlisted = !posting.wishlisted;
        posting.wishlist_count = if posting.wishlisted {
            posting.wishlist_count + 1
        } else {
            posting.wishlist_count.saturating_sub(1)
        };
        let now_wishlisted = posting.wishlisted;
        self.touch();
        Some(now_wishlisted)
    }

    /// The toggle was accepted; the optimistic values stand until the next
    /// search resyncs them.
    pub fn confirm_wishlist(&mut self, posting_id: &str) {
        self.pending.remove(posting_id);
    }

    /// The toggle was rejected; restore the pre-toggle flag and count.
    pub fn revert_wishlist(&mut self, posting_id: &str) {
        let Some(PendingChange::Wishlist { wishlisted, count }) =
            self.pending.remove(posting_id)
        else {
            return;
        };
        if let Some(posting) = self.list.iter_mut().find(|p| p.id == posting_id) {
            posting.wishlisted = wishlisted;
            posting.wishlist_count = count;
            self.touch();
        }
    }

    // -- optimistic apply ---------------------------------------------------

    /// Optimistically mark a posting applied and bump its applicant count.
    /// Returns `false` when no cached posting matched.
    pub fn begin_apply(&mut self, posting_id: &str) -> bool {
        let posting = match self.list.iter_mut().find(|p| p.id == posting_id) {
            Some(p) => p,
            None => {
                warn!(posting = %posting_id, "Apply matched no cached posting");
                return false;
            }
        };
        self.pending.insert(
            posting_id.to_string(),
            PendingChange::Apply {
                applied: posting.applied,
                count: posting.applicant_count,
            },
        );
        posting.applied = true;
        posting.applicant_count += 1;
        self.touch();
        true
    }

    /// The application was stored; merge the returned application document
    /// into the posting's applicant list when one came back.
    pub fn confirm_apply(&mut self, posting_id: &str, application_doc: Option<&Value>) {
        self.pending.remove(posting_id);
        let Some(doc) = application_doc else {
            return;
        };
        let Some(application) = map_application(doc) else {
            return;
        };
        if let Some(posting) = self.list.iter_mut().find(|p| p.id == posting_id) {
            if !posting.applicants.iter().any(|a| a.id == application.id) {
                posting.applicants.push(application);
            }
            self.touch();
        }
    }

    /// The application was rejected; restore the pre-apply flag and count.
    pub fn revert_apply(&mut self, posting_id: &str) {
        let Some(PendingChange::Apply { applied, count }) = self.pending.remove(posting_id)
        else {
            return;
        };
        if let Some(posting) = self.list.iter_mut().find(|p| p.id == posting_id) {
            posting.applied = applied;
            posting.applicant_count = count;
            self.touch();
        }
    }

    // -- application lifecycle ----------------------------------------------

    /// Move an application to a new status wherever it is cached, appending
    /// to its timeline. Returns `false` when no cached application matched.
    pub fn apply_application_status(
        &mut self,
        application_id: &str,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> bool {
        for posting in &mut self.list {
            if let Some(application) = posting
                .applicants
                .iter_mut()
                .find(|a| a.id == application_id)
            {
                application.status = status.clone();
                application.timeline.push(ApplicationEvent {
                    status,
                    at,
                    note: None,
                });
                self.touch();
                return true;
            }
        }
        warn!(application = %application_id, "Status update matched no cached application");
        false
    }

    /// Attach an offer letter to an application and mark the offer sent.
    pub fn apply_offer_sent(
        &mut self,
        application_id: &str,
        offer_letter: Option<String>,
        at: DateTime<Utc>,
    ) -> bool {
        for posting in &mut self.list {
            if let Some(application) = posting
                .applicants
                .iter_mut()
                .find(|a| a.id == application_id)
            {
                application.offer_letter = offer_letter;
                application.status = ApplicationStatus::OfferSent;
                application.timeline.push(ApplicationEvent {
                    status: ApplicationStatus::OfferSent,
                    at,
                    note: None,
                });
                self.touch();
                return true;
            }
        }
        warn!(application = %application_id, "Offer matched no cached application");
        false
    }

    pub fn get(&self, posting_id: &str) -> Option<&Posting> {
        self.list.iter().find(|p| p.id == posting_id)
    }

    pub fn selected(&self) -> Option<&Posting> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }
}

/// Map a raw posting document into the canonical shape. The company name
/// comes from the posting's organization; list endpoints report counts while
/// detail endpoints carry the full applicant array.
pub fn map_posting(doc: &Value) -> Option<Posting> {
    let id = canonical_id(doc)?;

    let company = doc
        .get("companyName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            doc.get("organization")
                .and_then(|org| org.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let applicants: Vec<Application> = doc
        .get("applicants")
        .or_else(|| doc.get("applications"))
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(map_application).collect())
        .unwrap_or_default();

    let applicant_count = doc
        .get("applicantCount")
        .and_then(Value::as_u64)
        .map(|n| n as u32)
        .unwrap_or(applicants.len() as u32);

    Some(Posting {
        id,
        title: doc
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        company,
        location: doc
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: doc
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        applied: doc.get("applied").and_then(Value::as_bool).unwrap_or(false),
        wishlisted: doc
            .get("wishlisted")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        applicant_count,
        wishlist_count: doc
            .get("wishlistCount")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(0),
        applicants,
    })
}

/// Map a raw application document.
pub fn map_application(doc: &Value) -> Option<Application> {
    let id = canonical_id(doc)?;
    let status = doc
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("applied")
        .to_string();

    let timeline = doc
        .get("timeline")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|event| {
                    let status = event.get("status").and_then(Value::as_str)?;
                    let at = event
                        .get("at")
                        .and_then(Value::as_str)
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
                        .with_timezone(&Utc);
                    Some(ApplicationEvent {
                        status: ApplicationStatus::from(status.to_string()),
                        at,
                        note: event
                            .get("note")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Application {
        id,
        applicant: doc.get("applicant").and_then(map_user_preview),
        status: ApplicationStatus::from(status),
        stage: doc
            .get("stage")
            .and_then(Value::as_str)
            .map(str::to_string),
        timeline,
        offer_letter: doc
            .get("offerLetter")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn posting(id_field: &str, id: &str, title: &str) -> Value {
        json!({
            id_field: id,
            "title": title,
            "companyName": "Acme",
            "wishlistCount": 3,
        })
    }

    fn searched_slice() -> PostingSlice {
        let mut slice = PostingSlice::new();
        let seq = slice.search_started();
        slice.apply_search(
            seq,
            &[posting("_id", "j1", "Backend"), posting("id", "j2", "Frontend")],
        );
        slice
    }

    #[test]
    fn search_replaces_the_list_and_selects_the_first_result() {
        let mut slice = searched_slice();
        assert_eq!(slice.list.len(), 2);
        assert_eq!(slice.selected_id.as_deref(), Some("j1"));

        let seq = slice.search_started();
        slice.apply_search(seq, &[posting("postingId", "j3", "Design")]);

        assert_eq!(slice.list.len(), 1);
        assert_eq!(slice.selected_id.as_deref(), Some("j3"));
    }

    #[test]
    fn id_aliases_collapse_at_ingestion() {
        let slice = searched_slice();
        // Both documents used different id field names; lookups use one key.
        assert!(slice.get("j1").is_some());
        assert!(slice.get("j2").is_some());
    }

    #[test]
    fn stale_search_fulfillment_is_dropped() {
        let mut slice = PostingSlice::new();
        let first = slice.search_started();
        let second = slice.search_started();

        assert!(slice.apply_search(second, &[posting("id", "new", "New")]));
        assert!(!slice.apply_search(first, &[posting("id", "old", "Old")]));

        assert_eq!(slice.list[0].id, "new");
    }

    #[test]
    fn wishlist_toggle_is_optimistic_and_reverts_on_rejection() {
        let mut slice = searched_slice();

        // Optimistic flip before the network settles.
        assert_eq!(slice.begin_wishlist_toggle("j1"), Some(true));
        let posting = slice.get("j1").unwrap();
        assert!(posting.wishlisted);
        assert_eq!(posting.wishlist_count, 4);

        // Rejection restores the pre-toggle values.
        slice.revert_wishlist("j1");
        let posting = slice.get("j1").unwrap();
        assert!(!posting.wishlisted);
        assert_eq!(posting.wishlist_count, 3);
    }

    #[test]
    fn confirmed_wishlist_keeps_the_optimistic_value() {
        let mut slice = searched_slice();
        slice.begin_wishlist_toggle("j1");
        slice.confirm_wishlist("j1");

        assert!(slice.get("j1").unwrap().wishlisted);
        // A late revert is a no-op once confirmed.
        slice.revert_wishlist("j1");
        assert!(slice.get("j1").unwrap().wishlisted);
    }

    #[test]
    fn apply_is_optimistic_with_an_explicit_revert_path() {
        let mut slice = searched_slice();

        assert!(slice.begin_apply("j1"));
        assert!(slice.get("j1").unwrap().applied);
        assert_eq!(slice.get("j1").unwrap().applicant_count, 1);

        slice.revert_apply("j1");
        assert!(!slice.get("j1").unwrap().applied);
        assert_eq!(slice.get("j1").unwrap().applicant_count, 0);
    }

    #[test]
    fn apply_with_no_cached_match_logs_and_leaves_state_alone() {
        let mut slice = searched_slice();
        let before = slice.revision();

        assert!(!slice.begin_apply("missing"));
        assert_eq!(slice.revision(), before);
    }

    #[test]
    fn status_update_appends_to_the_timeline() {
        let mut slice = PostingSlice::new();
        let seq = slice.search_started();
        slice.apply_search(
            seq,
            &[json!({
                "_id": "j1",
                "title": "Backend",
                "applicants": [{"_id": "a1", "status": "applied"}],
            })],
        );

        assert!(slice.apply_application_status("a1", ApplicationStatus::Interview, Utc::now()));

        let application = &slice.get("j1").unwrap().applicants[0];
        assert_eq!(application.status, ApplicationStatus::Interview);
        assert_eq!(application.timeline.len(), 1);
    }

    #[test]
    fn offer_attaches_the_letter_and_moves_status() {
        let mut slice = PostingSlice::new();
        let seq = slice.search_started();
        slice.apply_search(
            seq,
            &[json!({
                "_id": "j1",
                "applicants": [{"_id": "a1", "status": "interview"}],
            })],
        );

        assert!(slice.apply_offer_sent("a1", Some("offer.pdf".into()), Utc::now()));

        let application = &slice.get("j1").unwrap().applicants[0];
        assert_eq!(application.status, ApplicationStatus::OfferSent);
        assert_eq!(application.offer_letter.as_deref(), Some("offer.pdf"));
    }
}
