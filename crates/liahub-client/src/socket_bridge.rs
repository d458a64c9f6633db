//! Realtime socket bridge.
//!
//! One socket connection exists per access token. Reconnecting with an
//! unchanged token reuses the live connection; a token change tears the
//! stale connection down first. Incoming events land in the exact same
//! reducers the HTTP paths use, so cache invariants hold regardless of
//! delivery path.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use liahub_api::{spawn_socket, SocketCommand, SocketEvent};
use liahub_shared::ids::canonical_id;
use liahub_shared::protocol::ServerEvent;
use liahub_store::Store;

use crate::events::{emit_event, ClientEvent};
use crate::state::{Client, SocketHandle};

/// Connect the realtime socket for the given access token and spawn the
/// event loop that feeds incoming frames into the store.
///
/// Connection failures are logged and returned to the caller; they are never
/// written into slice state.
pub async fn connect_socket(client: &Client, token: &str) -> Result<(), String> {
    // Same token: the live connection is reused, never duplicated.
    {
        let guard = client
            .socket
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        if let Some(handle) = guard.as_ref() {
            if handle.token_tag == token {
                debug!("Socket already connected for this token, reusing");
                return Ok(());
            }
        }
    }

    // A connection for a stale token is torn down before the new one opens.
    disconnect_socket(client).await;

    let (cmd_tx, event_rx) = match spawn_socket(&client.config().socket_url, token).await {
        Ok(channels) => channels,
        Err(e) => {
            warn!(error = %e.message(), "Socket connect failed");
            return Err(e.message());
        }
    };

    {
        let mut guard = client
            .socket
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        *guard = Some(SocketHandle {
            token_tag: token.to_string(),
            cmd_tx,
        });
    }

    let store = client.store_handle();
    let events = client.events_handle();
    tokio::spawn(async move {
        event_loop(store, events, event_rx).await;
    });

    Ok(())
}

/// Tear the realtime connection down (logout or token loss).
pub async fn disconnect_socket(client: &Client) {
    let handle = client
        .socket
        .lock()
        .map_err(|e| format!("Lock poisoned: {e}"))
        .map(|mut guard| guard.take());

    if let Ok(Some(handle)) = handle {
        info!("Disconnecting socket");
        let _ = handle.cmd_tx.send(SocketCommand::Shutdown).await;
    }
}

/// Receive socket events and dispatch them into the store and the UI event
/// channel.
async fn event_loop(
    store: Arc<Mutex<Store>>,
    events: broadcast::Sender<ClientEvent>,
    mut event_rx: mpsc::Receiver<SocketEvent>,
) {
    info!("Socket bridge started");

    while let Some(event) = event_rx.recv().await {
        match event {
            SocketEvent::Connected => {
                emit_event(&events, ClientEvent::SocketStatusChanged { connected: true });
            }

            SocketEvent::Event(ServerEvent::MessageNew { thread_id, message }) => {
                let message_id = canonical_id(&message).unwrap_or_default();
                debug!(thread = %thread_id, message = %message_id, "Realtime message");

                {
                    let mut guard = match store.lock() {
                        Ok(g) => g,
                        Err(_) => return,
                    };
                    let current_user = guard
                        .profile
                        .user_id()
                        .map(str::to_string)
                        .unwrap_or_default();
                    // Same reducer the HTTP send path uses, so thread and
                    // unread invariants hold for pushed messages too.
                    guard
                        .messages
                        .receive_message(&thread_id, &message, &current_user);
                }

                emit_event(
                    &events,
                    ClientEvent::MessageReceived {
                        thread_id,
                        message_id,
                    },
                );
            }

            SocketEvent::Disconnected => {
                emit_event(
                    &events,
                    ClientEvent::SocketStatusChanged { connected: false },
                );
            }
        }
    }

    warn!("Socket bridge ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    use liahub_api::StaticSession;

    use crate::state::ClientConfig;

    /// Minimal WebSocket server: counts connections and pushes one frame to
    /// each, then holds the connection open.
    async fn serve(listener: TcpListener, connections: Arc<AtomicUsize>, frame: Option<String>) {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            connections.fetch_add(1, Ordering::SeqCst);
            let frame = frame.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                if let Some(text) = frame {
                    let _ = ws.send(Message::Text(text.into())).await;
                }
                // Hold the connection until the client goes away.
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    }

    async fn test_client(socket_url: String) -> Client {
        let config = ClientConfig {
            base_url: "http://localhost:0".into(),
            socket_url,
        };
        Client::new(config, Arc::new(StaticSession::new("token-a")))
    }

    #[tokio::test]
    async fn same_token_reuses_the_live_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        tokio::spawn(serve(listener, connections.clone(), None));

        let client = test_client(format!("ws://{addr}")).await;

        connect_socket(&client, "token-a").await.unwrap();
        connect_socket(&client, "token-a").await.unwrap();

        // Give the server a beat to register anything unexpected.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_changed_token_opens_a_fresh_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        tokio::spawn(serve(listener, connections.clone(), None));

        let client = test_client(format!("ws://{addr}")).await;

        connect_socket(&client, "token-a").await.unwrap();
        connect_socket(&client, "token-b").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pushed_messages_land_through_the_shared_reducer() {
        let frame = serde_json::json!({
            "event": "message:new",
            "data": {
                "threadId": "t1",
                "message": {"_id": "m1", "senderId": "u9", "text": "hej",
                             "time": "2026-03-01T10:00:00Z"},
            }
        })
        .to_string();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, Arc::default(), Some(frame)));

        let client = test_client(format!("ws://{addr}")).await;
        let mut events = client.subscribe();

        connect_socket(&client, "token-a").await.unwrap();

        // Connected first, then the message event.
        loop {
            match events.recv().await.unwrap() {
                ClientEvent::SocketStatusChanged { .. } => continue,
                event => {
                    assert_eq!(
                        event,
                        ClientEvent::MessageReceived {
                            thread_id: "t1".into(),
                            message_id: "m1".into(),
                        }
                    );
                    break;
                }
            }
        }

        let store = client.lock_store().unwrap();
        assert_eq!(store.messages.thread("t1").unwrap().unread_count, 1);
        assert_eq!(store.messages.thread_messages("t1").len(), 1);
    }
}
