//! Canonical entity shapes cached by the client.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer. Field names follow the backend's camelCase
//! convention on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// A normalized, minimal read projection of a backend entity (user, company,
/// school), used uniformly across all caches.
///
/// Two previews with the same id are the same entity; later writes overwrite
/// earlier ones wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    /// Stable backend id, always present for cacheable entities.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar image URL, if the entity has one.
    pub avatar_url: Option<String>,
    /// Role-derived subtitle ("Student", "Company", ...).
    pub subtitle: Option<String>,
    /// The raw backend document, passed through opaquely.
    pub raw: Value,
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// One edge in the user's connection graph.
///
/// The bucket (network / incoming / outgoing) is held by the slice, not the
/// entry: a peer id lives in at most one bucket at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntry {
    /// Connection document id.
    pub id: String,
    /// The participant that is not the current user.
    pub peer: Preview,
    /// When the connection was requested.
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Closed set of notification kinds emitted by the backend. Unrecognised
/// tags are preserved verbatim in `Other` rather than dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccept,
    Message,
    JobPosted,
    JobApplication,
    JobStatusUpdate,
    LiaPosted,
    FollowerUpdate,
    DocumentShared,
    StudentAssigned,
    PostLiked,
    PostCreated,
    PostCommented,
    OfferAccepted,
    JobOffer,
    JobHiringStopped,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConnectionRequest => "connection_request",
            Self::ConnectionAccept => "connection_accept",
            Self::Message => "message",
            Self::JobPosted => "job_posted",
            Self::JobApplication => "job_application",
            Self::JobStatusUpdate => "job_status_update",
            Self::LiaPosted => "lia_posted",
            Self::FollowerUpdate => "follower_update",
            Self::DocumentShared => "document_shared",
            Self::StudentAssigned => "student_assigned",
            Self::PostLiked => "post_liked",
            Self::PostCreated => "post_created",
            Self::PostCommented => "post_commented",
            Self::OfferAccepted => "offer_accepted",
            Self::JobOffer => "job_offer",
            Self::JobHiringStopped => "job_hiring_stopped",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "connection_request" => Self::ConnectionRequest,
            "connection_accept" => Self::ConnectionAccept,
            "message" => Self::Message,
            "job_posted" => Self::JobPosted,
            "job_application" => Self::JobApplication,
            "job_status_update" => Self::JobStatusUpdate,
            "lia_posted" => Self::LiaPosted,
            "follower_update" => Self::FollowerUpdate,
            "document_shared" => Self::DocumentShared,
            "student_assigned" => Self::StudentAssigned,
            "post_liked" => Self::PostLiked,
            "post_created" => Self::PostCreated,
            "post_commented" => Self::PostCommented,
            "offer_accepted" => Self::OfferAccepted,
            "job_offer" => Self::JobOffer,
            "job_hiring_stopped" => Self::JobHiringStopped,
            _ => Self::Other(tag),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A single notification.
///
/// `read_at` is monotonic: once set it is never cleared by any later action.
/// Client-synthesized notifications carry `local = true` and are excluded
/// from server read-receipt batching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub actor: Option<Preview>,
    /// Free-form kind-specific payload.
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    /// True for notifications synthesized on this client.
    pub local: bool,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// Whether a message was sent by the current user or the peer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    Me,
    Them,
}

/// A file attached to a message. Upload storage is opaque to the client;
/// only the resulting URL and name are cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub url: String,
}

/// A single chat message within a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    /// Derived by comparing `sender_id` to the current user id.
    pub origin: MessageOrigin,
    pub sent_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

/// A conversation thread between the current user and one peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub participants: Vec<Preview>,
    /// The participant that is not the current user.
    pub peer: Option<Preview>,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Incremented only for incoming messages on a thread that is not the
    /// active one; reset to zero when the thread is opened or read.
    pub unread_count: u32,
}

// ---------------------------------------------------------------------------
// Dashboard sections
// ---------------------------------------------------------------------------

/// The fixed set of dashboard table sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    Students,
    Teachers,
    EducationManagers,
    AdminManagement,
    Companies,
    LeadingCompanies,
    LiahubCompanies,
}

impl SectionKey {
    /// Every section, in dashboard display order.
    pub const ALL: [SectionKey; 7] = [
        SectionKey::Students,
        SectionKey::Teachers,
        SectionKey::EducationManagers,
        SectionKey::AdminManagement,
        SectionKey::Companies,
        SectionKey::LeadingCompanies,
        SectionKey::LiahubCompanies,
    ];

    /// Wire tag for the section, matching the backend payload keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::EducationManagers => "educationManagers",
            Self::AdminManagement => "adminManagement",
            Self::Companies => "companies",
            Self::LeadingCompanies => "leadingCompanies",
            Self::LiahubCompanies => "liahubCompanies",
        }
    }

    pub fn from_str(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == tag)
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a dashboard table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub id: String,
    /// The section the backend filed this record under. An update response
    /// may report a different section than the one the mutation targeted.
    pub section: SectionKey,
    /// The row's column values, kept opaque.
    pub fields: Value,
}

// ---------------------------------------------------------------------------
// Postings & applications
// ---------------------------------------------------------------------------

/// Lifecycle status of one application against a posting. Unrecognised
/// backend statuses are preserved in `Other`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    Applied,
    UnderReview,
    Interview,
    OfferSent,
    Hired,
    Rejected,
    Withdrawn,
    OfferAccepted,
    Other(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Applied => "applied",
            Self::UnderReview => "under_review",
            Self::Interview => "interview",
            Self::OfferSent => "offer_sent",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::OfferAccepted => "offer_accepted",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for ApplicationStatus {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "applied" => Self::Applied,
            "under_review" => Self::UnderReview,
            "interview" => Self::Interview,
            "offer_sent" => Self::OfferSent,
            "hired" => Self::Hired,
            "rejected" => Self::Rejected,
            "withdrawn" => Self::Withdrawn,
            "offer_accepted" => Self::OfferAccepted,
            _ => Self::Other(tag),
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One entry in an application's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEvent {
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A student's submission against a posting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub applicant: Option<Preview>,
    pub status: ApplicationStatus,
    pub stage: Option<String>,
    /// Append-only status history.
    pub timeline: Vec<ApplicationEvent>,
    pub offer_letter: Option<String>,
}

/// A job or LIA (internship) posting.
///
/// Summary counts are never stored on the posting; they are derived from
/// `applicants` so they cannot desync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: String,
    pub title: String,
    /// Company name derived from the posting organization.
    pub company: String,
    pub location: Option<String>,
    pub status: Option<String>,
    /// Whether the current user has applied.
    pub applied: bool,
    /// Whether the current user has wishlisted this posting.
    pub wishlisted: bool,
    /// Number of applicants reported by the backend list endpoints (the
    /// detailed `applicants` list is only populated on detail fetches).
    pub applicant_count: u32,
    /// Number of users who wishlisted the posting.
    pub wishlist_count: u32,
    pub applicants: Vec<Application>,
}

/// Derived per-posting applicant summary. `in_process` is floored at zero
/// so classification overlaps can never produce a negative figure.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub total: usize,
    pub selected: usize,
    pub offers: usize,
    pub rejected: usize,
    pub in_process: usize,
}

// ---------------------------------------------------------------------------
// Fetch / mutation lifecycle
// ---------------------------------------------------------------------------

/// Read-path lifecycle of a slice or section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Write-path lifecycle, tracked independently of the read path so a failed
/// edit never blanks out previously loaded data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
}
