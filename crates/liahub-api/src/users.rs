use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// List users, optionally filtered by a search term.
    pub async fn fetch_users(&self, search: Option<&str>) -> Result<Value> {
        match search {
            Some(term) => self.get_query("/users", &[("search", term)]).await,
            None => self.get("/users").await,
        }
    }

    /// Fetch one user document by id.
    pub async fn fetch_user(&self, user_id: &str) -> Result<Value> {
        self.get(&format!("/users/{user_id}")).await
    }

    /// Fetch the current user's own profile document.
    pub async fn fetch_own_profile(&self) -> Result<Value> {
        self.get("/users/me").await
    }

    /// Update one named section of the current user's profile.
    pub async fn update_profile_section(&self, section: &str, content: &Value) -> Result<Value> {
        self.put("/users/me", &json!({ "section": section, "content": content }))
            .await
    }

    /// Follow a user.
    pub async fn follow_user(&self, user_id: &str) -> Result<Value> {
        self.post(&format!("/users/{user_id}/follow"), &Value::Null)
            .await
    }

    /// Unfollow a user.
    pub async fn unfollow_user(&self, user_id: &str) -> Result<Value> {
        self.delete(&format!("/users/{user_id}/follow")).await
    }
}
