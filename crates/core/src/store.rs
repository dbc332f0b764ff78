//! Flat directory of persisted assets keyed by item identifier.
//!
//! Writes go to a hidden `.{name}.part` file in the same directory and are
//! renamed into place once fully flushed, so readers never see a partial
//! asset under its final name.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::item::{AssetNaming, ItemId};

/// Errors that can occur while reading or writing the asset directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the temporary file.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the temporary file to its final name.
    #[error("Failed to move {source_path} to {destination}")]
    MoveFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to list the directory.
    #[error("Failed to list directory: {path}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A successfully persisted asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Item the asset belongs to.
    pub item: ItemId,
    /// Final path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Hex SHA-256 of the content.
    pub sha256: String,
}

/// Asset directory with identifier-keyed paths.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    naming: AssetNaming,
}

impl AssetStore {
    /// Creates a store rooted at `dir`. Nothing is touched on disk yet.
    pub fn new(dir: impl Into<PathBuf>, naming: AssetNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the naming scheme.
    pub fn naming(&self) -> &AssetNaming {
        &self.naming
    }

    /// Creates the directory (and parents) if absent.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::DirectoryCreationFailed {
                path: self.dir.clone(),
                source: e,
            })
    }

    /// Final path of an item. Pure function of the identifier.
    pub fn path_for(&self, item: ItemId) -> PathBuf {
        self.dir.join(self.naming.file_name(item))
    }

    /// Temporary path used while an item is being written.
    fn partial_path_for(&self, item: ItemId) -> PathBuf {
        self.dir
            .join(format!(".{}.part", self.naming.file_name(item)))
    }

    /// Writes `bytes` as the asset for `item`, replacing any previous content.
    ///
    /// On error the temporary file is removed and the final path is left as it
    /// was before the call.
    pub async fn persist(&self, item: ItemId, bytes: &[u8]) -> Result<StoredAsset, StoreError> {
        let partial = self.partial_path_for(item);
        let destination = self.path_for(item);

        if let Err(e) = Self::write_partial(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StoreError::WriteFailed {
                path: partial,
                source: e,
            });
        }

        if let Err(e) = fs::rename(&partial, &destination).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StoreError::MoveFailed {
                source_path: partial,
                destination,
                source: e,
            });
        }

        Ok(StoredAsset {
            item,
            path: destination,
            size_bytes: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(bytes)),
        })
    }

    async fn write_partial(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
        let mut file = File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Lists persisted assets sorted by file name.
    ///
    /// Files that do not carry the canonical name of an item (including
    /// leftover `.part` files and unpadded names like `7.png`) are skipped,
    /// so each identifier appears at most once and its path is `path_for`.
    pub async fn list(&self) -> Result<Vec<(ItemId, PathBuf)>, StoreError> {
        let list_err = |e| StoreError::ListFailed {
            path: self.dir.clone(),
            source: e,
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(list_err)?;
        let mut found = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(item) = self.naming.parse(name) else {
                tracing::debug!("Skipping non-asset file {:?}", entry.path());
                continue;
            };
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => found.push((name.to_string(), item, entry.path())),
                _ => continue,
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found.into_iter().map(|(_, item, path)| (item, path)).collect())
    }
}
