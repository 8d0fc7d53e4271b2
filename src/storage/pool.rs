//! Database connection management.
//!
//! The writer's connection handle is a SQLite pool opened with:
//! - WAL mode enabled for concurrent flushes
//! - Connection limits and acquire timeouts
//! - Automatic database file creation

use std::str::FromStr;
use std::time::Duration;

use log::{debug, error};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, SqlitePool};

use crate::error_handling::DatabaseError;

/// Opens a connection pool to `database_url`.
///
/// Creates the database file if it doesn't exist and enables WAL mode so
/// concurrent flush transactions don't block readers.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    connect_timeout: Duration,
) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            error!("Invalid database URL {database_url}: {e}");
            DatabaseError::SqlError(e)
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })?;

    debug!("Connected to {database_url}");
    Ok(pool)
}

/// Checks that the pool can hand out a live connection within `timeout`.
pub async fn ping(pool: &SqlitePool, timeout: Duration) -> Result<(), DatabaseError> {
    let check = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await
    };
    match tokio::time::timeout(timeout, check).await {
        Ok(result) => result.map_err(DatabaseError::SqlError),
        Err(_) => Err(DatabaseError::PingTimeout(timeout.as_millis())),
    }
}

/// Closes the pool, waiting for checked-out connections to be returned.
///
/// Closing an already closed pool is a no-op.
pub async fn close(pool: &SqlitePool) {
    if pool.is_closed() {
        return;
    }
    pool.close().await;
    debug!("Database connection closed");
}
