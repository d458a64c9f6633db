//! Application-facing handle over the LiaHub cache layer.
//!
//! A [`Client`] owns the shared [`liahub_store::Store`], the REST gateway,
//! the realtime socket bridge, and the read-receipt batcher. UI code calls
//! the async command functions in [`commands`], reads state through the
//! store, and subscribes to [`events::ClientEvent`]s for push updates.

pub mod commands;
pub mod events;
pub mod read_batch;
pub mod socket_bridge;
pub mod state;

pub use events::ClientEvent;
pub use state::{Client, ClientConfig};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the tracing subscriber with a default filter favouring the
/// workspace's own crates. Call once, early, from the host application.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("liahub_client=debug,liahub_store=debug,liahub_api=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
