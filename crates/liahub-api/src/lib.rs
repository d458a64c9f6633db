// REST/WebSocket gateway for the LiaHub backend. The HTTP client owns token
// attachment and error flattening; the socket module owns the realtime
// connection behind a command/event channel pair.

pub mod client;
pub mod connections;
pub mod dashboard;
pub mod error;
pub mod jobs;
pub mod lias;
pub mod messages;
pub mod notifications;
pub mod session;
pub mod socket;
pub mod users;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use messages::OutgoingAttachment;
pub use session::{SessionProvider, StaticSession};
pub use socket::{socket_url, spawn_socket, SocketCommand, SocketEvent};
