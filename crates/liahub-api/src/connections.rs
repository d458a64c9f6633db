use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Fetch the full connection graph for the current user: the accepted
    /// network plus pending incoming/outgoing requests and the
    /// follower/following id lists, in one payload.
    pub async fn fetch_connections(&self) -> Result<Value> {
        self.get("/connections").await
    }

    /// Send a connection request to a user.
    pub async fn request_connection(&self, user_id: &str) -> Result<Value> {
        self.post("/connections", &json!({ "userId": user_id }))
            .await
    }

    /// Accept or decline a pending incoming connection.
    pub async fn respond_connection(&self, connection_id: &str, accept: bool) -> Result<Value> {
        let action = if accept { "accept" } else { "decline" };
        self.post(
            &format!("/connections/{connection_id}/respond"),
            &json!({ "action": action }),
        )
        .await
    }
}
