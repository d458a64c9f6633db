use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Fetch the current user's notifications.
    pub async fn fetch_notifications(&self) -> Result<Value> {
        self.get("/notifications").await
    }

    /// Acknowledge a batch of notifications as read in one call.
    ///
    /// The caller accumulates ids and flushes them together; this endpoint
    /// is idempotent on the server side.
    pub async fn mark_notifications_read(&self, ids: &[String]) -> Result<Value> {
        self.post("/notifications/read", &json!({ "ids": ids }))
            .await
    }
}
