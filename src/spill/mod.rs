//! Durable spill storage.
//!
//! A `DataAdapter` persists batches the datastore rejected and hands them back
//! for replay. Backends only supply the primitives of their medium (list, get,
//! put, delete); writing and restoring artifacts is implemented once on top of
//! them:
//!
//! - `write` encodes a batch and stores it under a fresh `<table>-<token>.bin`
//!   name. Empty batches are not stored.
//! - `restore` walks every artifact, decodes it, invokes the replay callback
//!   and deletes the artifact only if the callback succeeded. A failing
//!   artifact is recorded in the report and left in place; the walk continues
//!   with the next one. Only a failure to enumerate the store is an error.

pub mod local;
pub mod naming;
pub mod object_store;
pub mod options;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error_handling::StorageError;
use crate::storage::record::{codec, Batch, Record};

pub use local::FsAdapter;
pub use object_store::S3Adapter;
pub use options::{AdapterKind, AdapterOptions};

/// Replays one spilled batch into its table.
///
/// Receives the table recovered from the artifact name and the decoded batch.
/// Returning `Ok` allows the artifact to be deleted.
pub type ReplayCallback =
    Arc<dyn Fn(String, Batch) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An artifact that was replayed and deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedArtifact {
    /// Artifact name.
    pub name: String,
    /// Table the batch was replayed into.
    pub table: String,
    /// Number of records in the batch.
    pub rows: usize,
}

/// An artifact that could not be replayed or deleted.
#[derive(Debug)]
pub struct ArtifactFailure {
    /// Artifact name.
    pub name: String,
    /// What went wrong.
    pub error: StorageError,
}

/// Outcome of one restore pass.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Artifacts replayed and deleted, in processing order.
    pub replayed: Vec<ReplayedArtifact>,
    /// Artifacts left in place.
    pub failures: Vec<ArtifactFailure>,
}

impl RestoreReport {
    /// Total records replayed in this pass.
    pub fn rows(&self) -> usize {
        self.replayed.iter().map(|a| a.rows).sum()
    }

    /// Returns `true` if no artifact was found.
    pub fn is_empty(&self) -> bool {
        self.replayed.is_empty() && self.failures.is_empty()
    }
}

/// Durable storage backend for spilled batches.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Backend kind, for logging.
    fn kind(&self) -> AdapterKind;

    /// One-time setup from named options. Calling it again on an initialized
    /// adapter is a no-op.
    async fn init(&mut self, options: &AdapterOptions) -> Result<(), StorageError>;

    /// Names of every stored artifact.
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Contents of one artifact.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Stores one artifact. Must not leave a partial artifact visible to
    /// `list` on failure.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Removes one artifact.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Persists `batch` for `table`, returning the artifact name.
    ///
    /// Returns `Ok(None)` for an empty batch; nothing is stored.
    async fn write(&self, table: &str, batch: &[Record]) -> Result<Option<String>, StorageError> {
        if batch.is_empty() {
            return Ok(None);
        }
        let name = naming::artifact_name(table)?;
        let bytes = codec::serialize(batch)?;
        self.put(&name, bytes).await?;
        Ok(Some(name))
    }

    /// Replays every stored artifact through `replay`.
    async fn restore(&self, replay: &ReplayCallback) -> Result<RestoreReport, StorageError> {
        let names = self.list().await?;
        let mut report = RestoreReport::default();
        for name in names {
            match restore_artifact(self, &name, replay).await {
                Ok(replayed) => report.replayed.push(replayed),
                Err(error) => report.failures.push(ArtifactFailure { name, error }),
            }
        }
        Ok(report)
    }
}

async fn restore_artifact<A: DataAdapter + ?Sized>(
    adapter: &A,
    name: &str,
    replay: &ReplayCallback,
) -> Result<ReplayedArtifact, StorageError> {
    let table = naming::table_of(name)?.to_string();
    let bytes = adapter.get(name).await?;
    let batch = codec::deserialize(&bytes)?;
    let rows = batch.len();

    replay(table.clone(), batch)
        .await
        .map_err(|source| StorageError::Replay {
            artifact: name.to_string(),
            source,
        })?;

    // Deleting only after a successful replay keeps delivery at-least-once.
    adapter.delete(name).await?;

    Ok(ReplayedArtifact {
        name: name.to_string(),
        table,
        rows,
    })
}

/// Creates and initializes the adapter selected by `options`.
pub async fn build_adapter(options: &AdapterOptions) -> Result<Box<dyn DataAdapter>, StorageError> {
    let mut adapter: Box<dyn DataAdapter> = match options.kind()? {
        AdapterKind::Fs => Box::new(FsAdapter::default()),
        AdapterKind::S3 => Box::new(S3Adapter::default()),
    };
    adapter.init(options).await?;
    log::info!("Spill adapter initialized: {}", adapter.kind());
    Ok(adapter)
}
