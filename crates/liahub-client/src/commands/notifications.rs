use chrono::Utc;
use serde_json::Value;
use tracing::info;

use liahub_shared::types::{NotificationKind, Preview};

use crate::commands::doc_list;
use crate::events::{emit_event, ClientEvent};
use crate::state::Client;

/// Fetch the notification list and merge it by id.
pub async fn fetch_notifications(client: &Client) -> Result<usize, String> {
    {
        client.lock_store()?.notifications.fetch_started();
    }

    match client.api().fetch_notifications().await {
        Ok(payload) => {
            let docs = doc_list(&payload, &["notifications"]);
            let mut store = client.lock_store()?;
            store.notifications.apply_notifications(&docs);
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .notifications
                .fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Mark one notification read.
///
/// The read flag is set immediately; server-backed ids are handed to the
/// debounced batcher, which acknowledges them in one call once the user
/// goes quiet. Local notifications have no server counterpart and skip the
/// batch entirely.
pub async fn mark_notification_read(client: &Client, notification_id: &str) -> Result<(), String> {
    let batch_it = {
        client
            .lock_store()?
            .notifications
            .mark_read(notification_id, Utc::now())
    };

    if batch_it {
        client
            .read_batch()
            .add(vec![notification_id.to_string()])
            .await;
    }
    Ok(())
}

/// Mark every unread notification read, batching all server-backed ids.
pub async fn mark_all_notifications_read(client: &Client) -> Result<usize, String> {
    let batch = {
        let mut store = client.lock_store()?;
        let ids = store.notifications.unread_ids();
        let now = Utc::now();
        let mut batch = Vec::with_capacity(ids.len());
        for id in ids {
            if store.notifications.mark_read(&id, now) {
                batch.push(id);
            }
        }
        // Local unread entries are read too, just never acknowledged.
        for id in store
            .notifications
            .items
            .iter()
            .filter(|n| n.read_at.is_none())
            .map(|n| n.id.clone())
            .collect::<Vec<_>>()
        {
            store.notifications.mark_read(&id, now);
        }
        batch
    };

    let count = batch.len();
    if count > 0 {
        client.read_batch().add(batch).await;
    }
    Ok(count)
}

/// Synthesize a local notification (no server counterpart). Returns its
/// generated id.
pub fn push_local_notification(
    client: &Client,
    kind: NotificationKind,
    actor: Option<Preview>,
    payload: Value,
) -> Result<String, String> {
    let id = {
        client
            .lock_store()?
            .notifications
            .push_local(kind, actor, payload, Utc::now())
    };

    info!(notification = %id, "Local notification added");
    emit_event(
        &client.events_handle(),
        ClientEvent::NotificationAdded { id: id.clone() },
    );
    Ok(id)
}

/// Archive a notification in the local cache.
pub fn archive_notification(client: &Client, notification_id: &str) -> Result<(), String> {
    client
        .lock_store()?
        .notifications
        .archive(notification_id, Utc::now());
    Ok(())
}
