//! Normalized in-memory entity cache.
//!
//! One module per slice; each slice owns one collection keyed by canonical
//! id, a read-path fetch status, and reducer-style mutation methods. All
//! mutation goes through those methods, which bump a per-slice revision the
//! memoized selectors key on.
//!
//! Reducers run while the caller holds the store lock, so they are atomic
//! relative to each other; the invariants documented on each slice hold
//! between any two reducer applications.

pub mod connections;
pub mod dashboard;
pub mod messages;
pub mod notifications;
pub mod postings;
pub mod profile;
pub mod selectors;
pub mod users;

pub use connections::ConnectionSlice;
pub use dashboard::{DashboardSlice, SectionState};
pub use messages::MessageSlice;
pub use notifications::NotificationSlice;
pub use postings::PostingSlice;
pub use profile::ProfileSlice;
pub use selectors::{application_summary, Memo, Selectors};
pub use users::UserSlice;

/// The whole client cache: every slice plus the memoized selector state.
#[derive(Debug, Default)]
pub struct Store {
    pub users: UserSlice,
    pub connections: ConnectionSlice,
    pub notifications: NotificationSlice,
    pub messages: MessageSlice,
    pub profile: ProfileSlice,
    pub dashboard: DashboardSlice,
    pub jobs: PostingSlice,
    pub lias: PostingSlice,
    pub selectors: Selectors,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
