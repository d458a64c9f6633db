use thiserror::Error;

/// Errors produced by the gateway.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `message` carries the
    /// backend's own `message` body field when present, else a generic
    /// fallback, so it is always safe to show to a user.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The access token was rejected; the session provider has already been
    /// asked to refresh or log out.
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// The response body was not the JSON shape we expected.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Realtime socket failure.
    #[error("Socket error: {0}")]
    Socket(String),
}

impl ApiError {
    /// Flatten to the readable string the state layer stores. Never exposes
    /// a raw error object.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this is a not-found status. Deletes hitting this are treated
    /// as success-equivalent by the dashboard reducers: the record is gone
    /// server-side, so local state purges it instead of keeping a stuck row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
