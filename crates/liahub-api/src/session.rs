//! Session access for the HTTP transport.
//!
//! The transport needs the current access token and a way to report a
//! rejected one without holding a reference to application state. Both are
//! provided through this trait, injected at [`crate::ApiClient`]
//! construction.

use std::sync::Mutex;

/// Provides the ambient session to the gateway.
pub trait SessionProvider: Send + Sync {
    /// The current bearer token, if a session is active.
    fn access_token(&self) -> Option<String>;

    /// Called once per request that came back 401. The host decides whether
    /// to refresh the token or log the user out; the gateway only reports.
    fn handle_unauthorized(&self);
}

/// A fixed-token session, for tests and simple embedders.
#[derive(Default)]
pub struct StaticSession {
    token: Mutex<Option<String>>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// Replace (or clear) the stored token.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
    }
}

impl SessionProvider for StaticSession {
    fn access_token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn handle_unauthorized(&self) {
        self.set_token(None);
    }
}
