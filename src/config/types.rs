//! Configuration types.
//!
//! This module defines the writer and dumper settings and the logging enums
//! shared with the command-line interface.

use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Writer configuration.
///
/// # Examples
///
/// ```no_run
/// use spillway::WriterConfig;
/// use std::time::Duration;
///
/// let config = WriterConfig {
///     table: "page_views".to_string(),
///     batch_size: 500,
///     ping_interval: Duration::from_secs(30),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Destination table of submitted records
    pub table: String,

    /// Database URL (`sqlite:<path>`)
    pub database_url: String,

    /// Queue length that triggers a flush
    pub batch_size: usize,

    /// Maximum number of concurrent flush transactions
    pub max_concurrent_flushes: usize,

    /// Interval between connection pings
    pub ping_interval: Duration,

    /// Delay between a failed ping and the reconnect
    pub reconnect_backoff: Duration,

    /// Ping deadline
    pub ping_timeout: Duration,

    /// Connect and pool-acquire deadline
    pub connect_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_flushes: DEFAULT_MAX_CONCURRENT_FLUSHES,
            ping_interval: DEFAULT_PING_INTERVAL,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Dumper configuration.
#[derive(Debug, Clone)]
pub struct DumperConfig {
    /// Interval between scans of the spill store
    pub check_interval: Duration,

    /// Consecutive failed scans before the replay loop stops
    pub max_list_failures: u32,
}

impl Default for DumperConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            max_list_failures: DEFAULT_MAX_LIST_FAILURES,
        }
    }
}
