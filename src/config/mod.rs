//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch size, intervals, timeouts)
//! - Writer and dumper settings
//! - Logging option types shared with the CLI

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{DumperConfig, LogFormat, LogLevel, WriterConfig};
