use tracing::{debug, info};

use liahub_shared::preview::map_connection_payload;

use crate::events::{emit_event, ClientEvent};
use crate::state::Client;

/// Fetch the full connection graph and replace the slice with the
/// deduplicated, bucket-exclusive result.
pub async fn fetch_connections(client: &Client) -> Result<(), String> {
    let user_id = client.current_user_id()?;
    {
        client.lock_store()?.connections.fetch_started();
    }

    match client.api().fetch_connections().await {
        Ok(payload) => {
            let mut store = client.lock_store()?;
            store.connections.apply_graph(&payload, &user_id);
            info!(
                network = store.connections.network.len(),
                incoming = store.connections.incoming.len(),
                outgoing = store.connections.outgoing.len(),
                "Connections fetched"
            );
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .connections
                .fetch_failed(message.clone());
            Err(message)
        }
    }
}

/// Send a connection request; on success the returned document lands in the
/// outgoing bucket.
pub async fn request_connection(client: &Client, peer_id: &str) -> Result<(), String> {
    let user_id = client.current_user_id()?;

    let doc = client
        .api()
        .request_connection(peer_id)
        .await
        .map_err(|e| e.message())?;

    if let Some(entry) = map_connection_payload(&doc, &user_id) {
        client.lock_store()?.connections.add_outgoing(entry);
    } else {
        debug!(peer = %peer_id, "Request response was not a mappable connection");
    }
    Ok(())
}

/// Accept or decline a pending incoming connection.
///
/// Acceptance atomically moves the entry into the network and mirrors the
/// peer into followers and following.
pub async fn respond_connection(
    client: &Client,
    connection_id: &str,
    accept: bool,
) -> Result<(), String> {
    client
        .api()
        .respond_connection(connection_id, accept)
        .await
        .map_err(|e| e.message())?;

    let accepted_peer = {
        let mut store = client.lock_store()?;
        if accept {
            store
                .connections
                .accept_incoming(connection_id)
                .map(|entry| entry.peer.id)
        } else {
            store.connections.decline_incoming(connection_id);
            None
        }
    };

    if let Some(peer_id) = accepted_peer {
        info!(peer = %peer_id, "Connection accepted");
        emit_event(
            &client.events_handle(),
            ClientEvent::ConnectionAccepted { peer_id },
        );
    }
    Ok(())
}

/// Follow a user: the following list changes immediately, the server call
/// settles after, and the whole graph is re-fetched as the authority. On
/// rejection the optimistic change is reverted.
pub async fn follow_user(client: &Client, peer_id: &str) -> Result<(), String> {
    {
        client.lock_store()?.connections.begin_follow(peer_id);
    }

    match client.api().follow_user(peer_id).await {
        Ok(_) => {
            client.lock_store()?.connections.confirm_follow(peer_id);
            resync_graph(client).await;
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.connections.revert_follow(peer_id);
            Err(message)
        }
    }
}

/// Unfollow a user, with the same optimistic begin/confirm/revert contract
/// as [`follow_user`].
pub async fn unfollow_user(client: &Client, peer_id: &str) -> Result<(), String> {
    {
        client.lock_store()?.connections.begin_unfollow(peer_id);
    }

    match client.api().unfollow_user(peer_id).await {
        Ok(_) => {
            client.lock_store()?.connections.confirm_follow(peer_id);
            resync_graph(client).await;
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.connections.revert_follow(peer_id);
            Err(message)
        }
    }
}

/// Authoritative counts come from a full re-fetch after an optimistic
/// follow/unfollow settles. A resync failure keeps the optimistic state and
/// is only logged; the next fetch reconciles.
async fn resync_graph(client: &Client) {
    if let Err(e) = fetch_connections(client).await {
        debug!(error = %e, "Connection resync failed");
    }
}
