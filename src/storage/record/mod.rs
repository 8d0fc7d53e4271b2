//! Record data structures and batch validation.
//!
//! This module defines the `Record`/`Value` model shared by the writer and the
//! spill adapters, the binary codec used for spilled artifacts, and the checks
//! a batch must pass before an insert statement is derived from it.

pub mod codec;
mod types;

pub use types::{Batch, Record, Value};

use crate::error_handling::DatabaseError;

/// Returns `true` if `table` can be used both as a SQL relation name and as
/// the prefix of an artifact name.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_.]*`. The `.` allows `database.table` names;
/// `-` is rejected because it separates the table from the artifact token.
pub fn is_valid_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Derives the column list of a batch and checks every record against it.
///
/// Columns come from the first record in its enumeration order. Every other
/// record must carry exactly the same field set. Returns an empty list for an
/// empty batch; callers short-circuit on that before building a statement.
pub fn batch_columns(batch: &[Record]) -> Result<Vec<&str>, DatabaseError> {
    let Some(first) = batch.first() else {
        return Ok(Vec::new());
    };
    if first.is_empty() {
        return Err(DatabaseError::NoFields);
    }

    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    for (row, record) in batch.iter().enumerate().skip(1) {
        if record.len() != columns.len() || !record.keys().eq(first.keys()) {
            return Err(DatabaseError::InconsistentFields {
                row,
                expected: columns.join(", "),
                found: record.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(columns)
}
