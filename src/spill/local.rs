//! Local directory spill adapter.
//!
//! Artifacts are plain files in one directory. A write goes to
//! `<name>.tmp`, is synced to disk and then renamed, so enumeration (which
//! only looks at `*.bin` files) never sees a half-written artifact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::DEFAULT_SPILL_DIR;
use crate::error_handling::StorageError;

use super::naming;
use super::options::{AdapterKind, AdapterOptions, KEY_FS_DIR};
use super::DataAdapter;

/// Spill adapter storing artifacts as files in a local directory.
#[derive(Debug, Default)]
pub struct FsAdapter {
    dir: Option<PathBuf>,
}

impl FsAdapter {
    /// Creates an adapter rooted at `dir`. The directory is created by `init`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// The spill directory, once known.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn root(&self) -> Result<&Path, StorageError> {
        self.dir.as_deref().ok_or(StorageError::NotInitialized)
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, StorageError> {
        // Names come from `list` or `artifact_name`; never let one escape the root.
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(StorageError::InvalidArtifactName(name.to_string()));
        }
        Ok(self.root()?.join(name))
    }
}

#[async_trait]
impl DataAdapter for FsAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Fs
    }

    async fn init(&mut self, options: &AdapterOptions) -> Result<(), StorageError> {
        let dir = match self.dir.take() {
            Some(dir) => dir,
            None => PathBuf::from(options.get(KEY_FS_DIR).unwrap_or(DEFAULT_SPILL_DIR)),
        };
        fs::create_dir_all(&dir).await?;
        log::debug!("Spill directory ready: {}", dir.display());
        self.dir = Some(dir);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let root = self.root()?;
        fs::create_dir_all(root).await?;

        let mut names = Vec::new();
        let mut entries = fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if naming::is_artifact(&name) => names.push(name),
                Ok(_) => {}
                Err(raw) => log::debug!("Skipping non UTF-8 file in spill directory: {:?}", raw),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(self.path_of(name)?).await?)
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_of(name)?;
        let tmp = self.path_of(&format!("{name}.tmp"))?;

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            // Best effort; a leftover .tmp file is never picked up by `list`.
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        Ok(fs::remove_file(self.path_of(name)?).await?)
    }
}
