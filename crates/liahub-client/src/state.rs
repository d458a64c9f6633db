//! Shared client state.
//!
//! The [`Client`] is the one handle the host application keeps: the store
//! behind `Arc<Mutex<>>`, the REST gateway, the realtime socket handle, the
//! read-receipt batcher, and the UI event channel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use liahub_api::{ApiClient, SessionProvider, SocketCommand};
use liahub_shared::constants::{EVENT_CHANNEL_CAPACITY, READ_BATCH_QUIET_MS};
use liahub_store::Store;

use crate::events::ClientEvent;
use crate::read_batch::DebouncedBatch;

/// Endpoints and tuning for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the REST backend.
    pub base_url: String,
    /// WebSocket endpoint for realtime delivery.
    pub socket_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            socket_url: "ws://localhost:8080/socket".to_string(),
        }
    }
}

/// Live realtime connection bookkeeping. The token tag lets a reconnect
/// with an unchanged token reuse the connection instead of duplicating it.
pub(crate) struct SocketHandle {
    pub(crate) token_tag: String,
    pub(crate) cmd_tx: mpsc::Sender<SocketCommand>,
}

/// Central client handle.
///
/// Construct inside a tokio runtime (the read-receipt batcher task is
/// spawned at construction).
pub struct Client {
    config: ClientConfig,
    api: ApiClient,
    store: Arc<Mutex<Store>>,
    events: broadcast::Sender<ClientEvent>,
    pub(crate) socket: Mutex<Option<SocketHandle>>,
    read_batch: DebouncedBatch,
}

impl Client {
    /// Create a client against the given backend, with the session provider
    /// injected into the HTTP transport.
    pub fn new(config: ClientConfig, session: Arc<dyn SessionProvider>) -> Self {
        let api = ApiClient::new(config.base_url.clone(), session);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let flush_api = api.clone();
        let read_batch = DebouncedBatch::spawn(
            Duration::from_millis(READ_BATCH_QUIET_MS),
            move |ids: Vec<String>| {
                let api = flush_api.clone();
                async move {
                    if let Err(e) = api.mark_notifications_read(&ids).await {
                        // No retry: the ids stay read locally and the next
                        // fetch reconciles with the server.
                        warn!(count = ids.len(), error = %e.message(), "Read-receipt flush failed");
                    }
                }
            },
        );

        Self {
            config,
            api,
            store: Arc::new(Mutex::new(Store::new())),
            events,
            socket: Mutex::new(None),
            read_batch,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    pub(crate) fn store_handle(&self) -> Arc<Mutex<Store>> {
        self.store.clone()
    }

    pub(crate) fn events_handle(&self) -> broadcast::Sender<ClientEvent> {
        self.events.clone()
    }

    pub(crate) fn read_batch(&self) -> &DebouncedBatch {
        &self.read_batch
    }

    /// Lock the store for a reducer application or a read.
    pub fn lock_store(&self) -> Result<MutexGuard<'_, Store>, String> {
        self.store.lock().map_err(|e| format!("Lock poisoned: {e}"))
    }

    /// Subscribe to UI-facing events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// The current user's id, once a profile has been loaded.
    pub fn current_user_id(&self) -> Result<String, String> {
        let store = self.lock_store()?;
        store
            .profile
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| "No profile loaded".to_string())
    }
}
