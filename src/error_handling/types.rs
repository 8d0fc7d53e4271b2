//! Error type definitions.
//!
//! This module defines the error types used by the writer, the dumper and the
//! storage adapters.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for datastore operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQL execution or connection error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// The table name cannot be safely used as a relation or artifact prefix.
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// A record of the batch does not share the first record's field set.
    #[error("Record {row} has fields [{found}], expected [{expected}]")]
    InconsistentFields {
        /// Position of the offending record in the batch.
        row: usize,
        /// Field list derived from the first record.
        expected: String,
        /// Field list of the offending record.
        found: String,
    },

    /// The first record of the batch has no fields, so no column list exists.
    #[error("Cannot insert records without fields")]
    NoFields,

    /// The connection did not answer a ping in time.
    #[error("Ping timed out after {0}ms")]
    PingTimeout(u128),
}

/// Error types for durable spill storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// The artifact body could not be decoded.
    #[error("Decoding error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The artifact does not start with the expected format marker.
    #[error("Artifact is not in spill format (bad magic)")]
    BadMagic,

    /// The artifact has bytes left over after the encoded batch.
    #[error("Artifact has {0} trailing bytes")]
    TrailingBytes(usize),

    /// The object store rejected an operation.
    #[error("Object store {op} failed for {key:?}: {message}")]
    ObjectStore {
        /// Operation name (list, get, put, delete).
        op: &'static str,
        /// Object key, or the bucket for list.
        key: String,
        /// Rendered SDK error.
        message: String,
    },

    /// A configuration option is missing or malformed.
    #[error("Invalid option {key}: {reason}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The adapter was used before `init`.
    #[error("Adapter used before initialization")]
    NotInitialized,

    /// The artifact name does not encode a table.
    #[error("Invalid artifact name: {0:?}")]
    InvalidArtifactName(String),

    /// The replay callback rejected the batch; the artifact is kept.
    #[error("Replay of {artifact} failed: {source}")]
    Replay {
        /// Artifact that was being replayed.
        artifact: String,
        /// Error returned by the replay callback.
        #[source]
        source: anyhow::Error,
    },
}
