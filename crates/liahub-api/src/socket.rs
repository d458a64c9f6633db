//! Realtime socket task with tokio mpsc command/event pattern.
//!
//! The WebSocket connection runs in a dedicated tokio task. External code
//! communicates with it through typed command and event channels, keeping
//! the transport fully asynchronous and decoupled from application state.
//! One connection exists per access token; reconnect policy (token rotation,
//! teardown on logout) is owned by the caller.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use liahub_shared::constants::SOCKET_CHANNEL_CAPACITY;
use liahub_shared::error::ProtocolError;
use liahub_shared::protocol::ServerEvent;

use crate::error::{ApiError, Result};

// ---------------------------------------------------------------------------
// Command / event types
// ---------------------------------------------------------------------------

/// Commands sent *into* the socket task.
#[derive(Debug)]
pub enum SocketCommand {
    /// Send a raw text frame to the server.
    Send(String),
    /// Gracefully close the connection and end the task.
    Shutdown,
}

/// Events sent *from* the socket task to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// The connection is established and frames will follow.
    Connected,
    /// A server event frame arrived.
    Event(ServerEvent),
    /// The connection closed (server side, network, or shutdown).
    Disconnected,
}

/// Append the auth token to the socket endpoint as the handshake parameter.
pub fn socket_url(endpoint: &str, token: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}token={token}")
}

/// Connect to the realtime endpoint and spawn the socket task.
///
/// Returns channels for sending commands and receiving events. A connect
/// failure is returned to the caller, who logs it; it is never surfaced as
/// UI-visible state.
///
/// # Arguments
///
/// * `endpoint` - The WebSocket URL (e.g. `wss://api.liahub.se/socket`)
/// * `token` - The access token for the `token` handshake parameter
pub async fn spawn_socket(
    endpoint: &str,
    token: &str,
) -> Result<(mpsc::Sender<SocketCommand>, mpsc::Receiver<SocketEvent>)> {
    let url = socket_url(endpoint, token);

    let (stream, _) = connect_async(url.as_str())
        .await
        .map_err(|e| ApiError::Socket(e.to_string()))?;

    info!(endpoint, "Socket connected");

    let (mut write, mut read) = stream.split();
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<SocketCommand>(SOCKET_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<SocketEvent>(SOCKET_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let _ = event_tx.send(SocketEvent::Connected).await;

        loop {
            tokio::select! {
                // --- Incoming commands ---
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SocketCommand::Send(text)) => {
                            if let Err(e) = write.send(Message::Text(text.into())).await {
                                warn!(error = %e, "Socket send failed");
                                break;
                            }
                        }
                        Some(SocketCommand::Shutdown) => {
                            info!("Socket shutdown requested");
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                        None => {
                            // All senders dropped
                            info!("Command channel closed, shutting down socket");
                            break;
                        }
                    }
                }

                // --- Incoming frames ---
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match ServerEvent::from_json(text.as_str()) {
                                Ok(event) => {
                                    let _ = event_tx.send(SocketEvent::Event(event)).await;
                                }
                                Err(ProtocolError::UnknownEvent(tag)) => {
                                    debug!(event = %tag, "Ignoring unsubscribed event");
                                }
                                Err(e) => {
                                    debug!(error = %e, "Dropping malformed frame");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Socket closed by server");
                            break;
                        }
                        Some(Ok(_)) => {
                            debug!("Ignoring non-text frame");
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Socket read error");
                            break;
                        }
                    }
                }
            }
        }

        let _ = event_tx.send(SocketEvent::Disconnected).await;
        info!("Socket task terminated");
    });

    Ok((cmd_tx, event_rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_appended_as_query_parameter() {
        assert_eq!(
            socket_url("wss://api.liahub.se/socket", "abc"),
            "wss://api.liahub.se/socket?token=abc"
        );
    }

    #[test]
    fn token_joins_an_existing_query_string() {
        assert_eq!(
            socket_url("wss://api.liahub.se/socket?v=2", "abc"),
            "wss://api.liahub.se/socket?v=2&token=abc"
        );
    }
}
