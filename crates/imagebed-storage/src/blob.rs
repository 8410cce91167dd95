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
//! Key-addressed blob storage used by the object-store backend

use crate::error::StorageResult;
use crate::BodyStream;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// A stored blob opened for reading
pub struct Blob {
    /// Streamed content
    pub body: BodyStream,

    /// Content type hint written alongside the blob
    pub content_type: Option<String>,

    /// Size in bytes, if known
    pub content_length: Option<u64>,
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blob store trait for opaque byte objects
///
/// Implementations must be `Send + Sync + Debug`, reject empty keys with
/// [`StorageError::InvalidKey`](crate::StorageError::InvalidKey), return
/// [`StorageError::NotFound`](crate::StorageError::NotFound) from `get` for
/// unknown keys, and treat deletion of a missing key as success.
#[async_trait]
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Write `data` under `key`, replacing any previous object
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()>;

    /// Open the object stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Blob>;

    /// Check whether `key` exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Remove `key` (idempotent)
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Shared key validation for blob stores
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    use crate::StorageError;

    if key.is_empty() {
        return Err(StorageError::invalid_key("key cannot be empty"));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(StorageError::invalid_key(format!(
            "key must not contain path separators: {}",
            key
        )));
    }
    Ok(())
}
