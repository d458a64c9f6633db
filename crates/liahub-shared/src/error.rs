use thiserror::Error;

/// Errors produced when decoding frames off the realtime socket.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The frame was not valid JSON or did not match any known event shape.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame named an event this client does not subscribe to.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}
