//! Configuration constants.
//!
//! Defaults used by `WriterConfig`, `DumperConfig` and the spill adapters.

use std::time::Duration;

/// Default database location (SQLite file, created if missing)
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./spillway.db";
/// Default destination table
pub const DEFAULT_TABLE: &str = "events";

// Batching
/// Records per batch before a flush is dispatched
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Maximum number of flush transactions running at once
/// Each flush holds one pooled connection for the duration of its transaction
pub const DEFAULT_MAX_CONCURRENT_FLUSHES: usize = 4;

// Connection health
/// Interval between connection pings
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);
/// Delay between a failed ping and the reconnect attempt
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);
/// How long a ping may take before the connection counts as dead
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);
/// How long opening a connection (or acquiring one from the pool) may take
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// Replay
/// Interval between scans of the spill store
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);
/// Consecutive failed scans of the spill store before the replay loop gives up
pub const DEFAULT_MAX_LIST_FAILURES: u32 = 3;

// Spill storage
/// Default directory of the local spill adapter
pub const DEFAULT_SPILL_DIR: &str = "./spill";
/// Default region of the object store adapter (S3-compatible stores ignore it)
pub const DEFAULT_S3_REGION: &str = "auto";
/// Prefix of environment variables mapped onto adapter options
pub const ENV_PREFIX: &str = "SPILLWAY_";
