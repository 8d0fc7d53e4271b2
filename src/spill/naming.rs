//! Artifact naming.
//!
//! Artifacts are named `<table>-<token>.bin`. The table is everything before
//! the first `-`; the token is `<unix_millis>_<sequence>_<random>`, where the
//! sequence is a process-wide counter and the random part tells processes
//! sharing one store apart.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::error_handling::StorageError;
use crate::storage::record::is_valid_table_name;

/// Extension of artifact names; identifies the spill codec.
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Separator between the table and the token.
pub const TABLE_SEPARATOR: char = '-';

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds a fresh artifact name for `table`.
///
/// Two calls never return the same name within a process, even within the
/// same millisecond.
pub fn artifact_name(table: &str) -> Result<String, StorageError> {
    if !is_valid_table_name(table) {
        return Err(StorageError::InvalidArtifactName(table.to_string()));
    }
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    Ok(format!(
        "{}{}{}_{:06}_{:08x}.{}",
        table,
        TABLE_SEPARATOR,
        Utc::now().timestamp_millis(),
        sequence,
        rand::random::<u32>(),
        ARTIFACT_EXTENSION
    ))
}

/// Returns `true` if `name` carries the artifact extension.
///
/// Enumeration uses this to skip foreign files and in-progress writes.
pub fn is_artifact(name: &str) -> bool {
    name.strip_suffix(ARTIFACT_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
}

/// Recovers the table an artifact belongs to.
pub fn table_of(name: &str) -> Result<&str, StorageError> {
    let invalid = || StorageError::InvalidArtifactName(name.to_string());
    if !is_artifact(name) {
        return Err(invalid());
    }
    let (table, _token) = name.split_once(TABLE_SEPARATOR).ok_or_else(invalid)?;
    if !is_valid_table_name(table) {
        return Err(invalid());
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_artifact_name_round_trips_table() {
        let name = artifact_name("events").unwrap();
        assert!(name.starts_with("events-"));
        assert!(name.ends_with(".bin"));
        assert_eq!(table_of(&name).unwrap(), "events");
    }

    #[test]
    fn test_artifact_names_do_not_collide() {
        let names: HashSet<String> = (0..1000)
            .map(|_| artifact_name("events").unwrap())
            .collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_artifact_name_rejects_separator_in_table() {
        assert!(matches!(
            artifact_name("page-views"),
            Err(StorageError::InvalidArtifactName(_))
        ));
    }

    #[test]
    fn test_table_of_takes_prefix_before_first_separator() {
        assert_eq!(table_of("db.events-1700000000000_000001_0a0b0c0d.bin").unwrap(), "db.events");
        assert_eq!(table_of("events-legacy-1700000000.bin").unwrap(), "events");
    }

    #[test]
    fn test_table_of_rejects_foreign_names() {
        assert!(table_of("events-1.tmp").is_err());
        assert!(table_of("events.bin").is_err());
        assert!(table_of("-1.bin").is_err());
        assert!(table_of(".bin").is_err());
    }

    #[test]
    fn test_is_artifact() {
        assert!(is_artifact("events-1.bin"));
        assert!(!is_artifact("events-1.bin.tmp"));
        assert!(!is_artifact("bin"));
        assert!(!is_artifact("eventsbin"));
    }
}
