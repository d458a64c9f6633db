use serde_json::Value;
use tracing::info;

use crate::state::Client;

/// Load the current user's own profile. Must run before commands that need
/// the current user id (thread mapping, connection peer resolution).
pub async fn fetch_own_profile(client: &Client) -> Result<String, String> {
    {
        client.lock_store()?.profile.fetch_started();
    }

    match client.api().fetch_own_profile().await {
        Ok(doc) => {
            let mut store = client.lock_store()?;
            store.profile.apply_profile(&doc);
            let user_id = store
                .profile
                .user_id()
                .map(str::to_string)
                .ok_or_else(|| "Profile document had no id".to_string())?;
            info!(user = %user_id, "Profile loaded");
            Ok(user_id)
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.profile.fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Update one named profile section. Only the targeted section changes in
/// the cache; the others keep their merged content.
pub async fn update_profile_section(
    client: &Client,
    section: &str,
    content: Value,
) -> Result<(), String> {
    match client
        .api()
        .update_profile_section(section, &content)
        .await
    {
        Ok(response) => {
            let stored = response
                .get("content")
                .cloned()
                .unwrap_or(content);
            let mut store = client.lock_store()?;
            store.profile.apply_section(section, stored);
            Ok(())
        }
        Err(e) => Err(e.message()),
    }
}
