//! Memoized derived views over the slices.
//!
//! Derived values are pure functions of slice state; [`Memo`] caches the
//! last computation keyed by the slice revision so repeated reads between
//! mutations cost nothing.

use std::collections::HashMap;

use liahub_shared::types::{Application, ApplicationStatus, ApplicationSummary, Preview};

use crate::connections::ConnectionSlice;
use crate::messages::MessageSlice;
use crate::notifications::NotificationSlice;
use crate::postings::PostingSlice;

/// Revision-keyed cache of one derived value.
#[derive(Debug)]
pub struct Memo<T> {
    cached: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { cached: None }
    }
}

impl<T: Clone> Memo<T> {
    /// Return the cached value when the revision matches, else recompute
    /// and cache.
    pub fn get_or_compute(&mut self, revision: u64, compute: impl FnOnce() -> T) -> T {
        if let Some((cached_revision, value)) = &self.cached {
            if *cached_revision == revision {
                return value.clone();
            }
        }
        let value = compute();
        self.cached = Some((revision, value.clone()));
        value
    }
}

/// Derive the per-posting applicant summary.
///
/// The classification is fixed: hired and accepted offers count as selected,
/// sent offers as offers, rejections and withdrawals as rejected. Everything
/// else is in process, floored at zero so a misclassified or stale status
/// can never produce a negative figure.
pub fn application_summary(applications: &[Application]) -> ApplicationSummary {
    let total = applications.len();
    let mut selected = 0;
    let mut offers = 0;
    let mut rejected = 0;

    for application in applications {
        match application.status {
            ApplicationStatus::Hired | ApplicationStatus::OfferAccepted => selected += 1,
            ApplicationStatus::OfferSent => offers += 1,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn => rejected += 1,
            _ => {}
        }
    }

    ApplicationSummary {
        total,
        selected,
        offers,
        rejected,
        in_process: total.saturating_sub(selected + offers + rejected),
    }
}

/// Memo holders for the standard derived views.
#[derive(Debug, Default)]
pub struct Selectors {
    network_previews: Memo<Vec<Preview>>,
    unread_notifications: Memo<usize>,
    unread_messages: Memo<u32>,
    job_summaries: Memo<HashMap<String, ApplicationSummary>>,
    lia_summaries: Memo<HashMap<String, ApplicationSummary>>,
}

impl Selectors {
    /// Deduplicated previews of every peer in the accepted network.
    pub fn network_previews(&mut self, connections: &ConnectionSlice) -> Vec<Preview> {
        self.network_previews
            .get_or_compute(connections.revision(), || {
                let mut seen = HashMap::new();
                let mut previews = Vec::new();
                for entry in &connections.network {
                    if seen.insert(entry.peer.id.clone(), ()).is_none() {
                        previews.push(entry.peer.clone());
                    }
                }
                previews
            })
    }

    /// Count of unread notifications, local included.
    pub fn unread_notifications(&mut self, notifications: &NotificationSlice) -> usize {
        self.unread_notifications
            .get_or_compute(notifications.revision(), || notifications.unread_count())
    }

    /// Sum of unread message counts across all threads.
    pub fn unread_messages(&mut self, messages: &MessageSlice) -> u32 {
        self.unread_messages
            .get_or_compute(messages.revision(), || messages.unread_total())
    }

    /// Applicant summaries for every cached job posting, keyed by id.
    pub fn job_summaries(&mut self, jobs: &PostingSlice) -> HashMap<String, ApplicationSummary> {
        self.job_summaries
            .get_or_compute(jobs.revision(), || summaries(jobs))
    }

    /// Applicant summaries for every cached LIA posting, keyed by id.
    pub fn lia_summaries(&mut self, lias: &PostingSlice) -> HashMap<String, ApplicationSummary> {
        self.lia_summaries
            .get_or_compute(lias.revision(), || summaries(lias))
    }
}

fn summaries(slice: &PostingSlice) -> HashMap<String, ApplicationSummary> {
    slice
        .list
        .iter()
        .map(|posting| (posting.id.clone(), application_summary(&posting.applicants)))
        .collect()
}
