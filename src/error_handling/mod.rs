//! Error handling.
//!
//! This module provides the error types of the crate:
//! - **DatabaseError**: failures talking to the datastore or building the insert
//! - **StorageError**: failures of the durable spill store and the artifact codec
//! - **InitializationError**: logger setup failures
//!
//! Neither datastore nor storage errors are fatal to the host process; they are
//! reported through the event callback and recovered by spilling or replaying.

mod types;

// Re-export public API
pub use types::{DatabaseError, InitializationError, StorageError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_error_conversion() {
        let error = DatabaseError::from(sqlx::Error::PoolClosed);
        assert!(matches!(error, DatabaseError::SqlError(sqlx::Error::PoolClosed)));
        assert!(error.to_string().starts_with("SQL error:"));
    }

    #[test]
    fn test_storage_error_not_initialized_message() {
        assert_eq!(
            StorageError::NotInitialized.to_string(),
            "Adapter used before initialization"
        );
    }
}
