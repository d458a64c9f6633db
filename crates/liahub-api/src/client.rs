//! HTTP client wrapper for the LiaHub REST backend.
//!
//! [`ApiClient`] owns the reqwest client, the versioned base URL, and the
//! injected [`SessionProvider`]. Endpoint methods live in one module per
//! resource (`users`, `connections`, ...), each adding an `impl ApiClient`
//! block.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use liahub_shared::constants::API_BASE_PATH;

use crate::error::{ApiError, Result};
use crate::session::SessionProvider;

/// Gateway to the REST backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    /// Create a gateway for the given origin (e.g. `https://api.liahub.se`).
    ///
    /// The session provider is consulted for the bearer token on every
    /// request and notified once per 401 response.
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    /// Absolute URL for a route under the versioned base path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_BASE_PATH, path)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value> {
        self.send(self.http.get(self.url(path))).await
    }

    pub(crate) async fn get_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value> {
        self.send(self.http.delete(self.url(path))).await
    }

    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value> {
        self.send(self.http.post(self.url(path)).multipart(form))
            .await
    }

    /// Attach the bearer token, send, and flatten the response.
    ///
    /// Responses with an empty body decode to `Value::Null`; error bodies
    /// surface their `message` field when present.
    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let request = match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Request rejected with 401, notifying session provider");
            self.session.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body, status);
            debug!(status = status.as_u16(), message = %message, "Request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Extract the backend's `message` body field, falling back to a generic
/// readable string.
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_origin_and_versioned_path() {
        let session = Arc::new(crate::session::StaticSession::default());
        let client = ApiClient::new("https://api.liahub.se/", session);
        assert_eq!(
            client.url("/users/u1"),
            "https://api.liahub.se/api/v1/users/u1"
        );
    }

    #[test]
    fn error_message_prefers_backend_message() {
        let body = r#"{"message": "Record already exists"}"#;
        assert_eq!(
            error_message(body, StatusCode::CONFLICT),
            "Record already exists"
        );
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(
            error_message("<html>oops</html>", StatusCode::BAD_GATEWAY),
            "Request failed with status 502"
        );
    }
}
