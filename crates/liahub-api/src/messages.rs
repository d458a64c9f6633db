//! Messaging endpoints, including the multipart send route.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use liahub_shared::constants::{DEFAULT_PAGE_SIZE, MAX_ATTACHMENT_SIZE};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// A file handed to [`ApiClient::send_message`]. The upload itself is opaque
/// to the cache layer; only the resulting attachment metadata comes back.
#[derive(Debug, Clone)]
pub struct OutgoingAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ApiClient {
    /// List the current user's message threads.
    pub async fn fetch_threads(&self) -> Result<Value> {
        self.get("/messages/threads").await
    }

    /// Fetch one page of messages for a thread, newest first.
    pub async fn fetch_thread_messages(
        &self,
        thread_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Value> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string();
        let offset = offset.unwrap_or(0).to_string();
        self.get_query(
            &format!("/messages/threads/{thread_id}/messages"),
            &[("limit", limit.as_str()), ("offset", offset.as_str())],
        )
        .await
    }

    /// Send a message, with optional file attachments, as one multipart
    /// request. Returns the stored message document.
    pub async fn send_message(
        &self,
        thread_id: &str,
        text: &str,
        attachments: Vec<OutgoingAttachment>,
    ) -> Result<Value> {
        let mut form = Form::new()
            .text("threadId", thread_id.to_string())
            .text("text", text.to_string());

        for attachment in attachments {
            if attachment.bytes.len() > MAX_ATTACHMENT_SIZE {
                return Err(ApiError::Status {
                    status: 413,
                    message: format!(
                        "Attachment too large: {} bytes (max {})",
                        attachment.bytes.len(),
                        MAX_ATTACHMENT_SIZE
                    ),
                });
            }
            form = form.part(
                "files",
                Part::bytes(attachment.bytes).file_name(attachment.file_name),
            );
        }

        self.post_multipart("/messages/send", form).await
    }
}
