use tracing::info;

use liahub_api::OutgoingAttachment;
use liahub_shared::ids::canonical_id;

use crate::commands::doc_list;
use crate::state::Client;

/// Fetch the thread list for the current user.
pub async fn fetch_threads(client: &Client) -> Result<usize, String> {
    let user_id = client.current_user_id()?;
    {
        client.lock_store()?.messages.fetch_started();
    }

    match client.api().fetch_threads().await {
        Ok(payload) => {
            let docs = doc_list(&payload, &["threads"]);
            let mut store = client.lock_store()?;
            store.messages.apply_threads(&docs, &user_id);
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.messages.fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Open a thread: it becomes the active thread, its unread count resets
/// immediately, and its message page is loaded.
pub async fn open_thread(client: &Client, thread_id: &str) -> Result<usize, String> {
    let user_id = client.current_user_id()?;
    {
        client.lock_store()?.messages.open_thread(thread_id);
    }

    match client
        .api()
        .fetch_thread_messages(thread_id, None, None)
        .await
    {
        Ok(payload) => {
            let docs = doc_list(&payload, &["messages"]);
            let mut store = client.lock_store()?;
            store
                .messages
                .apply_thread_messages(thread_id, &docs, &user_id);
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.messages.fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Deactivate the open thread (navigation away). Unread counting resumes
/// for it.
pub fn close_thread(client: &Client) -> Result<(), String> {
    client.lock_store()?.messages.clear_active_thread();
    Ok(())
}

/// Send a message with optional attachments. The stored document lands
/// through the same reducer realtime deliveries use, so the thread ordering
/// and unread rules cannot diverge between the two paths.
pub async fn send_message(
    client: &Client,
    thread_id: &str,
    text: &str,
    attachments: Vec<OutgoingAttachment>,
) -> Result<String, String> {
    let user_id = client.current_user_id()?;

    let doc = client
        .api()
        .send_message(thread_id, text, attachments)
        .await
        .map_err(|e| e.message())?;

    let message_id = canonical_id(&doc).unwrap_or_default();
    {
        let mut store = client.lock_store()?;
        store.messages.receive_message(thread_id, &doc, &user_id);
    }

    info!(message = %message_id, thread = %thread_id, "Message sent");
    Ok(message_id)
}
