//! spillway: a batching datastore writer that never loses a batch to an outage
//!
//! Records are submitted without waiting on the database and written in
//! batches by background flushes. A batch the database rejects is spilled to
//! durable storage (a local directory or an S3-compatible bucket) and replayed
//! by a background loop once the database is reachable again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use spillway::{default_callback, AdapterOptions, Dumper, DumperConfig, Record, Value, Writer, WriterConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let events = default_callback();
//! let options = AdapterOptions::new().with("fs.dir", "./spill");
//! let dumper = Arc::new(Dumper::from_options(&options, DumperConfig::default(), events.clone()).await?);
//!
//! let config = WriterConfig {
//!     table: "page_views".to_string(),
//!     database_url: "sqlite:./analytics.db".to_string(),
//!     batch_size: 500,
//!     ..Default::default()
//! };
//! let writer = Writer::start(config, dumper, events).await?;
//!
//! writer.submit(Record::from([
//!     ("path".to_string(), Value::from("/pricing")),
//!     ("status".to_string(), Value::from(200)),
//! ]));
//!
//! writer.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod dumper;
mod error_handling;
pub mod events;
pub mod initialization;
pub mod spill;
pub mod storage;

// Re-export public API
pub use config::{DumperConfig, LogFormat, LogLevel, WriterConfig};
pub use dumper::Dumper;
pub use error_handling::{DatabaseError, InitializationError, StorageError};
pub use events::{default_callback, EventCallback, EventKind, SaverEvent};
pub use spill::{
    AdapterKind, AdapterOptions, DataAdapter, FsAdapter, ReplayCallback, RestoreReport,
    S3Adapter,
};
pub use storage::{Batch, Record, Value, Writer};
