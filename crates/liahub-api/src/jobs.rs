use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Search job postings. One request per call; the caller owns replacing
    /// its cached list with the result page.
    pub async fn search_jobs(&self, query: &str) -> Result<Value> {
        self.get_query("/jobs", &[("search", query)]).await
    }

    /// Create a job posting. The payload is the backend's posting shape.
    pub async fn create_job(&self, payload: &Value) -> Result<Value> {
        self.post("/jobs", payload).await
    }

    /// Apply to a job posting as the current user.
    pub async fn apply_to_job(&self, job_id: &str) -> Result<Value> {
        self.post(&format!("/jobs/{job_id}/apply"), &Value::Null)
            .await
    }

    /// Toggle the current user's wishlist flag on a posting.
    pub async fn toggle_job_wishlist(&self, job_id: &str) -> Result<Value> {
        self.post(&format!("/jobs/{job_id}/wishlist"), &Value::Null)
            .await
    }

    /// Move an application to a new status.
    pub async fn update_application_status(
        &self,
        application_id: &str,
        status: &str,
    ) -> Result<Value> {
        self.post(
            &format!("/jobs/applications/{application_id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    /// Attach an offer letter to an application and move it to offer-sent.
    pub async fn send_job_offer(&self, application_id: &str, offer: &Value) -> Result<Value> {
        self.post(&format!("/jobs/applications/{application_id}/offer"), offer)
            .await
    }
}
