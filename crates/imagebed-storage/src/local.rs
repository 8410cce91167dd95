// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Local filesystem blob store
//!
//! Implements [`BlobStore`](crate::BlobStore) on the local filesystem with:
//! - Sharded directory structure to prevent too many files in one directory
//! - Atomic writes using temp files and atomic rename operations
//! - A sidecar file holding the content-type hint
//! - Streaming reads via `tokio_util::io::ReaderStream`
//!
//! # Directory Structure
//!
//! ```text
//! root/
//!   objects/
//!     0b/
//!       7c/
//!         0b7c3e9e-6f7d-4c59-9a53-1f2d8d3b2a10
//!         0b7c3e9e-6f7d-4c59-9a53-1f2d8d3b2a10.content-type
//! ```

use crate::blob::{validate_key, Blob, BlobStore};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Local filesystem blob store
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store at the given root path
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails if the root path exists but is not a directory, or cannot be created.
    pub async fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        match fs::metadata(&root).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(StorageError::config(format!(
                    "path exists but is not a directory: {}",
                    root.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => fs::create_dir_all(&root).await?,
            Err(e) => return Err(e.into()),
        }

        Ok(LocalBlobStore { root })
    }

    /// Get the root path for this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sharded path for a key: `root/objects/AB/CD/key`
    fn object_path(&self, key: &str) -> PathBuf {
        let objects = self.root.join("objects");
        match (key.get(0..2), key.get(2..4)) {
            (Some(shard1), Some(shard2)) => objects.join(shard1).join(shard2).join(key),
            (Some(shard1), None) => objects.join(shard1).join(key),
            _ => objects.join(key),
        }
    }

    fn content_type_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(name)
    }

    /// Write `data` to `path` through a temp file and an atomic rename
    async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(format!(".tmp-{}", uuid::Uuid::new_v4()));
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path).await?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        fs::rename(&temp_path, path).await?;
        Ok(())
    }

    async fn remove_if_present(path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for LocalBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBlobStore")
            .field("root", &self.root)
            .finish()
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        validate_key(key)?;

        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // The hint goes first so a visible object always has its sidecar.
        let type_path = Self::content_type_path(&path);
        match content_type {
            Some(content_type) => Self::write_atomic(&type_path, content_type.as_bytes()).await?,
            None => Self::remove_if_present(&type_path).await?,
        }
        Self::write_atomic(&path, &data).await?;

        debug!(key, size = data.len(), "Wrote blob to local store");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Blob> {
        validate_key(key)?;

        let path = self.object_path(key);
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::not_found(key)),
            Err(e) => return Err(e.into()),
        };
        let content_length = file.metadata().await?.len();

        let content_type = match fs::read_to_string(Self::content_type_path(&path)).await {
            Ok(content_type) => Some(content_type.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Blob {
            body: ReaderStream::new(file).map_err(StorageError::from).boxed(),
            content_type,
            content_length: Some(content_length),
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(fs::try_exists(self.object_path(key)).await?)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;

        let path = self.object_path(key);
        Self::remove_if_present(&path).await?;
        Self::remove_if_present(&Self::content_type_path(&path)).await?;
        Ok(())
    }
}
