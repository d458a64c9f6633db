use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Search LIA (internship) postings.
    pub async fn search_lias(&self, query: &str) -> Result<Value> {
        self.get_query("/lias", &[("search", query)]).await
    }

    /// Create a LIA posting.
    pub async fn create_lia(&self, payload: &Value) -> Result<Value> {
        self.post("/lias", payload).await
    }

    /// Apply to a LIA posting as the current user.
    pub async fn apply_to_lia(&self, lia_id: &str) -> Result<Value> {
        self.post(&format!("/lias/{lia_id}/apply"), &Value::Null)
            .await
    }

    /// Move a LIA application to a new status.
    pub async fn update_lia_application_status(
        &self,
        lia_id: &str,
        application_id: &str,
        status: &str,
    ) -> Result<Value> {
        self.post(
            &format!("/lias/{lia_id}/applications/{application_id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    /// Attach an offer letter to a LIA application.
    pub async fn send_lia_offer(
        &self,
        lia_id: &str,
        application_id: &str,
        offer: &Value,
    ) -> Result<Value> {
        self.post(
            &format!("/lias/{lia_id}/applications/{application_id}/offer"),
            offer,
        )
        .await
    }

    /// Accept a received offer on a LIA application.
    pub async fn accept_lia_offer(&self, lia_id: &str, application_id: &str) -> Result<Value> {
        self.post(
            &format!("/lias/{lia_id}/applications/{application_id}/accept"),
            &Value::Null,
        )
        .await
    }

    /// Withdraw a LIA application.
    pub async fn withdraw_lia_application(
        &self,
        lia_id: &str,
        application_id: &str,
    ) -> Result<Value> {
        self.post(
            &format!("/lias/{lia_id}/applications/{application_id}/withdraw"),
            &Value::Null,
        )
        .await
    }
}
