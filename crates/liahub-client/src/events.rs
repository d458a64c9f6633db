use tokio::sync::broadcast;
use tracing::debug;

/// Events pushed to UI subscribers when cache state changes from a
/// non-command path (realtime delivery, local synthesis) or the socket
/// lifecycle moves.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A message landed in a thread (realtime delivery).
    MessageReceived {
        thread_id: String,
        message_id: String,
    },
    /// A notification was added locally.
    NotificationAdded { id: String },
    /// An incoming connection was accepted.
    ConnectionAccepted { peer_id: String },
    /// The realtime socket connected or dropped.
    SocketStatusChanged { connected: bool },
}

/// Emit an event to whoever is subscribed. Having no subscribers is normal
/// (headless use); it is logged at debug, never treated as an error.
pub fn emit_event(tx: &broadcast::Sender<ClientEvent>, event: ClientEvent) {
    if let Err(e) = tx.send(event) {
        debug!(error = %e, "No subscribers for client event");
    }
}
