use tracing::info;

use crate::commands::doc_list;
use crate::state::Client;

/// Fetch users, optionally filtered by a search term, and merge them into
/// the preview cache. Returns how many documents the backend sent.
pub async fn fetch_users(client: &Client, search: Option<&str>) -> Result<usize, String> {
    {
        client.lock_store()?.users.fetch_started();
    }

    match client.api().fetch_users(search).await {
        Ok(payload) => {
            let docs = doc_list(&payload, &["users", "results"]);
            let mut store = client.lock_store()?;
            store.users.apply_users(&docs);
            info!(count = docs.len(), "Users fetched");
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.users.fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Fetch one user by id. A failure is stored against that id only, so other
/// cached users and pending lookups are unaffected.
pub async fn fetch_user(client: &Client, user_id: &str) -> Result<(), String> {
    match client.api().fetch_user(user_id).await {
        Ok(doc) => {
            let mut store = client.lock_store()?;
            store.users.apply_user(&doc);
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .users
                .lookup_failed(user_id, message.clone());
            Err(message)
        }
    }
}
