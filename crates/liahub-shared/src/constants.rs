/// Versioned base path prepended to every REST route.
pub const API_BASE_PATH: &str = "/api/v1";

/// Application name
pub const APP_NAME: &str = "LiaHub";

/// How long a full dashboard fetch stays fresh before a repeat fetch
/// goes back to the network (seconds).
pub const DASHBOARD_CACHE_TTL_SECS: i64 = 300;

/// Quiet window after the last read-receipt activity before the
/// accumulated batch is flushed to the server (milliseconds).
pub const READ_BATCH_QUIET_MS: u64 = 2_000;

/// Default page size for message and thread listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Capacity of the socket command / event channels.
pub const SOCKET_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the client event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Maximum attachment size accepted for a message send (50 MiB).
pub const MAX_ATTACHMENT_SIZE: usize = 50 * 1024 * 1024;
