// Shared domain model for the LiaHub client: canonical entity shapes,
// ingestion mappers, socket wire protocol, and constants.

pub mod constants;
pub mod error;
pub mod ids;
pub mod preview;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use ids::canonical_id;
pub use preview::{map_connection_payload, map_user_preview};
pub use protocol::ServerEvent;
pub use types::{
    Application, ApplicationEvent, ApplicationStatus, ApplicationSummary, Attachment,
    ConnectionEntry, FetchStatus, Message, MessageOrigin, MutationStatus, Notification,
    NotificationKind, Posting, Preview, SectionKey, SectionRecord, Thread,
};
