use serde_json::{json, Value};

use liahub_shared::types::SectionKey;

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Fetch the full student dashboard in one payload. There is no
    /// per-section fetch: the response carries every section's table and the
    /// caller splits it.
    pub async fn fetch_student_dashboard(&self) -> Result<Value> {
        self.get("/dashboard/student").await
    }

    /// Create one school dashboard record in the given section.
    pub async fn create_school_record(
        &self,
        section: SectionKey,
        payload: &Value,
    ) -> Result<Value> {
        self.post(
            "/dashboard/school/records",
            &json!({ "section": section.as_str(), "record": payload }),
        )
        .await
    }

    /// Update one school dashboard record. The response may file the record
    /// under a different section than the one requested (server-side
    /// reclassification); the caller must honor the response's section.
    pub async fn update_school_record(
        &self,
        record_id: &str,
        section: SectionKey,
        payload: &Value,
    ) -> Result<Value> {
        self.put(
            &format!("/dashboard/school/records/{record_id}"),
            &json!({ "section": section.as_str(), "record": payload }),
        )
        .await
    }

    /// Delete one school dashboard record.
    pub async fn delete_school_record(&self, record_id: &str) -> Result<Value> {
        self.delete(&format!("/dashboard/school/records/{record_id}"))
            .await
    }

    /// Confirm a pending student assignment.
    pub async fn confirm_assignment(&self, assignment_id: &str) -> Result<Value> {
        self.post(
            &format!("/dashboard/company/assignments/{assignment_id}/confirm"),
            &Value::Null,
        )
        .await
    }

    /// Reject a pending student assignment.
    pub async fn reject_assignment(&self, assignment_id: &str) -> Result<Value> {
        self.post(
            &format!("/dashboard/company/assignments/{assignment_id}/reject"),
            &Value::Null,
        )
        .await
    }
}
