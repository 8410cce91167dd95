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
//! In-memory blob store
//!
//! Provides a thread-safe, in-memory implementation of [`BlobStore`](crate::BlobStore)
//! using `Arc<RwLock<HashMap>>` for concurrent access. Used by tests and by the
//! `memory` object-store setting for throwaway deployments.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use imagebed_storage::{BlobStore, MemoryBlobStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), imagebed_storage::StorageError> {
//!     let store = MemoryBlobStore::new();
//!
//!     store.put("key", Bytes::from_static(b"hello"), Some("image/png")).await?;
//!     assert!(store.exists("key").await?);
//!
//!     store.delete("key").await?;
//!     assert!(!store.exists("key").await?);
//!     Ok(())
//! }
//! ```

use crate::blob::{validate_key, Blob, BlobStore};
use crate::error::{StorageError, StorageResult};
use crate::body_from_bytes;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
}

/// In-memory blob store
///
/// Cloning shares the underlying map, so a test can hold one handle while
/// the gateway holds another.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    store: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl MemoryBlobStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current number of objects stored
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Get a copy of all stored keys
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for MemoryBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlobStore").finish()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        validate_key(key)?;

        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            StoredBlob {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Blob> {
        validate_key(key)?;

        let store = self.store.read().await;
        let blob = store
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))?;

        Ok(Blob {
            content_length: Some(blob.data.len() as u64),
            content_type: blob.content_type,
            body: body_from_bytes(blob.data),
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.store.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.store.write().await.remove(key);
        Ok(())
    }
}
