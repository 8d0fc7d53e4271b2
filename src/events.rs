//! Failure and informational events.
//!
//! The writer and the dumper report everything that happens off the caller's
//! path through a single callback: inserted row counts, spills, replays,
//! reconnects, and every recoverable error. The default callback forwards
//! events to the `log` facade.

use std::fmt;
use std::sync::Arc;

use strum_macros::EnumIter as EnumIterMacro;

use crate::error_handling::{DatabaseError, StorageError};

/// Callback receiving every event of a writer and its dumper.
pub type EventCallback = Arc<dyn Fn(&SaverEvent<'_>) + Send + Sync>;

/// An event reported by the writer or the dumper.
#[derive(Debug)]
pub enum SaverEvent<'a> {
    /// A batch was committed to the datastore.
    Inserted {
        /// Destination table.
        table: &'a str,
        /// Number of rows committed.
        rows: usize,
    },
    /// A batch could not be inserted and is being handed to the dumper.
    FlushFailed {
        /// Destination table.
        table: &'a str,
        /// Number of rows in the batch.
        rows: usize,
        /// Why the insert failed.
        error: &'a DatabaseError,
    },
    /// A failed batch was written to durable storage.
    Spilled {
        /// Destination table.
        table: &'a str,
        /// Number of rows spilled.
        rows: usize,
        /// Name of the created artifact.
        artifact: &'a str,
    },
    /// A failed batch could not be spilled and is lost.
    SpillFailed {
        /// Destination table.
        table: &'a str,
        /// Number of rows lost.
        rows: usize,
        /// Why the spill failed.
        error: &'a StorageError,
    },
    /// A spilled artifact was replayed and removed.
    Replayed {
        /// Destination table recovered from the artifact name.
        table: &'a str,
        /// Number of rows replayed.
        rows: usize,
        /// Name of the removed artifact.
        artifact: &'a str,
    },
    /// A spilled artifact could not be replayed or removed; it stays in place.
    ReplayFailed {
        /// Name of the artifact.
        artifact: &'a str,
        /// Why the replay failed.
        error: &'a StorageError,
    },
    /// The spill store could not be enumerated.
    ListFailed {
        /// Consecutive enumeration failures so far.
        attempt: u32,
        /// Why enumeration failed.
        error: &'a StorageError,
    },
    /// The replay loop ended because the spill store stayed unreachable.
    WatchAborted {
        /// The last enumeration error.
        error: &'a StorageError,
    },
    /// The scheduled connection check failed; a reconnect is scheduled.
    PingFailed {
        /// Why the ping failed.
        error: &'a DatabaseError,
    },
    /// The connection was replaced by a new one.
    Reconnected,
    /// Opening a new connection failed; the next ping retries.
    ReconnectFailed {
        /// Why the connection could not be opened.
        error: &'a DatabaseError,
    },
    /// A record was submitted after shutdown and dropped.
    SubmitRejected,
}

/// Discriminant of a [`SaverEvent`], convenient for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum EventKind {
    /// A batch was committed.
    Inserted,
    /// A batch insert failed.
    FlushFailed,
    /// A failed batch was spilled.
    Spilled,
    /// A failed batch could not be spilled.
    SpillFailed,
    /// An artifact was replayed and removed.
    Replayed,
    /// An artifact was left in place.
    ReplayFailed,
    /// The spill store could not be enumerated.
    ListFailed,
    /// The replay loop gave up.
    WatchAborted,
    /// A connection ping failed.
    PingFailed,
    /// The connection was replaced.
    Reconnected,
    /// A reconnect attempt failed.
    ReconnectFailed,
    /// A record arrived after shutdown.
    SubmitRejected,
}

impl EventKind {
    /// Returns a human-readable name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Inserted => "inserted",
            EventKind::FlushFailed => "flush failed",
            EventKind::Spilled => "spilled",
            EventKind::SpillFailed => "spill failed",
            EventKind::Replayed => "replayed",
            EventKind::ReplayFailed => "replay failed",
            EventKind::ListFailed => "list failed",
            EventKind::WatchAborted => "watch aborted",
            EventKind::PingFailed => "ping failed",
            EventKind::Reconnected => "reconnected",
            EventKind::ReconnectFailed => "reconnect failed",
            EventKind::SubmitRejected => "submit rejected",
        }
    }

    /// Returns `true` for events that report a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            EventKind::Inserted | EventKind::Spilled | EventKind::Replayed | EventKind::Reconnected
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SaverEvent<'_> {
    /// Returns the event's kind.
    pub fn kind(&self) -> EventKind {
        match self {
            SaverEvent::Inserted { .. } => EventKind::Inserted,
            SaverEvent::FlushFailed { .. } => EventKind::FlushFailed,
            SaverEvent::Spilled { .. } => EventKind::Spilled,
            SaverEvent::SpillFailed { .. } => EventKind::SpillFailed,
            SaverEvent::Replayed { .. } => EventKind::Replayed,
            SaverEvent::ReplayFailed { .. } => EventKind::ReplayFailed,
            SaverEvent::ListFailed { .. } => EventKind::ListFailed,
            SaverEvent::WatchAborted { .. } => EventKind::WatchAborted,
            SaverEvent::PingFailed { .. } => EventKind::PingFailed,
            SaverEvent::Reconnected => EventKind::Reconnected,
            SaverEvent::ReconnectFailed { .. } => EventKind::ReconnectFailed,
            SaverEvent::SubmitRejected => EventKind::SubmitRejected,
        }
    }
}

impl fmt::Display for SaverEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaverEvent::Inserted { table, rows } => {
                write!(f, "Inserted into '{table}' count: {rows}")
            }
            SaverEvent::FlushFailed { table, rows, error } => {
                write!(f, "Insert of {rows} rows into '{table}' failed: {error}")
            }
            SaverEvent::Spilled {
                table,
                rows,
                artifact,
            } => write!(f, "Spilled {rows} rows for '{table}' to {artifact}"),
            SaverEvent::SpillFailed { table, rows, error } => {
                write!(f, "Lost {rows} rows for '{table}', spill failed: {error}")
            }
            SaverEvent::Replayed {
                table,
                rows,
                artifact,
            } => write!(f, "Replayed {rows} rows into '{table}' from {artifact}"),
            SaverEvent::ReplayFailed { artifact, error } => {
                write!(f, "Could not replay {artifact}: {error}")
            }
            SaverEvent::ListFailed { attempt, error } => {
                write!(f, "Listing spilled artifacts failed (attempt {attempt}): {error}")
            }
            SaverEvent::WatchAborted { error } => {
                write!(f, "Replay loop stopped, spill store unreachable: {error}")
            }
            SaverEvent::PingFailed { error } => write!(f, "Database ping failed: {error}"),
            SaverEvent::Reconnected => f.write_str("Database connection re-established"),
            SaverEvent::ReconnectFailed { error } => {
                write!(f, "Database reconnect failed: {error}")
            }
            SaverEvent::SubmitRejected => f.write_str("Record submitted after shutdown dropped"),
        }
    }
}

/// Forwards an event to the `log` facade at a level matching its severity.
pub fn log_event(event: &SaverEvent<'_>) {
    match event.kind() {
        EventKind::Inserted | EventKind::Replayed => log::debug!("{event}"),
        EventKind::Spilled | EventKind::Reconnected => log::info!("{event}"),
        EventKind::SpillFailed | EventKind::WatchAborted => log::error!("{event}"),
        _ => log::warn!("{event}"),
    }
}

/// Returns a callback that forwards events to the `log` facade.
pub fn default_callback() -> EventCallback {
    Arc::new(log_event)
}
