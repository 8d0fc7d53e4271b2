//! Database insert operations.
//!
//! A batch is written with one statement shape: a multi-row transactional
//! `INSERT`. The column list comes from the first record; every record must
//! carry the same field set. All inserts use parameterized queries; table and
//! column identifiers are validated or quoted before they reach the SQL text.

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

use super::record::{batch_columns, is_valid_table_name, Record, Value};

/// Quotes an identifier for SQLite, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds `INSERT INTO <table> ("a", "b") VALUES (?, ?)`.
///
/// `table` must already have passed `is_valid_table_name`.
pub(crate) fn build_insert(table: &str, columns: &[&str]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        quoted.join(", "),
        placeholders
    )
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
        Value::Timestamp(ts) => query.bind(*ts),
    }
}

/// Inserts `batch` into `table` in a single transaction.
///
/// Returns the number of rows committed. An empty batch returns `Ok(0)`
/// without touching the database. On error nothing is committed: the
/// transaction is rolled back when it is dropped.
///
/// # Errors
///
/// - `InvalidTableName` if `table` is not a plain identifier
/// - `NoFields` / `InconsistentFields` if the batch fails field-set validation
/// - `SqlError` if any statement or the commit fails
pub async fn save_queue(
    pool: &SqlitePool,
    table: &str,
    batch: &[Record],
) -> Result<usize, DatabaseError> {
    if batch.is_empty() {
        return Ok(0);
    }
    if !is_valid_table_name(table) {
        return Err(DatabaseError::InvalidTableName(table.to_string()));
    }

    let columns = batch_columns(batch)?;
    let sql = build_insert(table, &columns);
    log::debug!("Inserting {} rows into {}", batch.len(), table);

    let mut tx = pool.begin().await?;
    for record in batch {
        // Same SQL text on every row, so sqlx reuses the cached prepared statement.
        let query = record
            .values()
            .fold(sqlx::query(&sql), |query, value| bind_value(query, value));
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;

    Ok(batch.len())
}
