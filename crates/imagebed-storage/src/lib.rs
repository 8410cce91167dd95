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
//! Storage abstraction layer for imagebed
//!
//! This crate turns heterogeneous places that can hold image bytes into one
//! asynchronous interface, [`ImageBackend`], with two variants:
//!
//! - [`RelayBackend`]: a Telegram-style bot API used as blob storage. The
//!   relay issues the storage key (an attachment `file_id`) and keeps a
//!   separate message reference that is needed to retract the upload.
//! - [`ObjectStoreBackend`]: a key-addressed [`BlobStore`] (in-memory,
//!   local filesystem, or S3-compatible) keyed by a UUID generated at upload.
//!
//! # Core Concepts
//!
//! - **Storage key**: opaque handle issued by the backend that stored the bytes
//! - **Backend kind**: which variant owns a record, fixed at creation time
//! - **Body stream**: fetched bytes are streamed, never buffered whole
//!
//! # Examples
//!
//! ```no_run
//! use bytes::Bytes;
//! use imagebed_storage::{ImageBackend, MemoryBlobStore, ObjectStoreBackend, UpstreamPolicy};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), imagebed_storage::StorageError> {
//!     let backend = ObjectStoreBackend::new(Arc::new(MemoryBlobStore::new()), UpstreamPolicy::default());
//!
//!     let stored = backend.store(Bytes::from_static(b"GIF89a"), "cat.gif").await?;
//!     let fetched = backend.fetch(&stored.storage_key).await?;
//!     assert_eq!(fetched.content_type.as_deref(), Some("image/gif"));
//!
//!     backend.delete(&stored).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Implementation Guide
//!
//! When implementing `ImageBackend`:
//!
//! 1. Use `#[async_trait]` on the impl block
//! 2. `store` must either return a fetchable key or fail without visible leftovers
//! 3. `fetch` returns [`StorageError::NotFound`] for unknown keys
//! 4. `delete` treats a missing object as success
//! 5. Wrap upstream calls with [`retry::with_timeout`]; only fetch and delete may retry

pub mod blob;
pub mod error;
pub mod local;
pub mod media;
pub mod memory;
pub mod object_store;
pub mod relay;
pub mod retry;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use blob::{Blob, BlobStore};
pub use error::{StorageError, StorageResult};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use object_store::ObjectStoreBackend;
pub use relay::{RelayBackend, RelayConfig};
pub use retry::UpstreamPolicy;
pub use s3::{S3BlobStore, S3Config};

/// Streamed object body
pub type BodyStream = BoxStream<'static, StorageResult<Bytes>>;

/// Wrap an in-memory buffer as a single-chunk [`BodyStream`].
pub fn body_from_bytes(data: Bytes) -> BodyStream {
    futures::stream::once(async move { Ok(data) }).boxed()
}

/// Drain a [`BodyStream`] into one buffer.
pub async fn collect_body(body: BodyStream) -> StorageResult<Bytes> {
    let chunks: Vec<Bytes> = body.try_collect().await?;
    Ok(Bytes::from(chunks.concat()))
}

/// Which backend variant owns an image's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Bytes live in a bot relay's media hosting
    Relay,

    /// Bytes live in a key-addressed blob store
    ObjectStore,
}

impl BackendKind {
    /// Stable identifier persisted in the metadata store
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Relay => "relay",
            BackendKind::ObjectStore => "object_store",
        }
    }

    /// Human readable name used in provenance descriptions
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Relay => "Telegram",
            BackendKind::ObjectStore => "Object Store",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" | "telegram" | "tg" => Ok(BackendKind::Relay),
            "object_store" | "objectstore" | "r2" | "s3" | "blob" => Ok(BackendKind::ObjectStore),
            other => Err(StorageError::config(format!(
                "unknown storage backend '{}', expected 'telegram' or 'object_store'",
                other
            ))),
        }
    }
}

/// Canonical result of a successful `store`, and the handle for `delete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Opaque key that `fetch` accepts
    pub storage_key: String,

    /// Backend that issued the key
    pub backend: BackendKind,

    /// Relay message carrying the attachment (relay backend only)
    pub relay_message_id: Option<i64>,
}

/// Bytes returned by `fetch`
pub struct FetchedObject {
    /// Streamed content
    pub body: BodyStream,

    /// Content type declared by the backend, if any
    pub content_type: Option<String>,

    /// Size in bytes, when the backend knows it up front
    pub content_length: Option<u64>,
}

impl fmt::Debug for FetchedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedObject")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl FetchedObject {
    /// Buffer the whole body. Intended for tests and small objects.
    pub async fn into_bytes(self) -> StorageResult<Bytes> {
        collect_body(self.body).await
    }
}

impl From<Blob> for FetchedObject {
    fn from(blob: Blob) -> Self {
        FetchedObject {
            body: blob.body,
            content_type: blob.content_type,
            content_length: blob.content_length,
        }
    }
}

/// Image storage capability shared by every backend variant
///
/// # Error Handling
///
/// - `store`: [`StorageError::Upstream`] when the backend refuses the upload,
///   [`StorageError::Transient`] when it cannot be reached
/// - `fetch`: [`StorageError::NotFound`] for unknown keys
/// - `delete`: `Ok(())` for keys that no longer exist
#[async_trait]
pub trait ImageBackend: Send + Sync + fmt::Debug {
    /// Variant tag attached to every record this backend creates
    fn kind(&self) -> BackendKind;

    /// Persist `data` and return the key it can be fetched with
    async fn store(&self, data: Bytes, filename: &str) -> StorageResult<StoredObject>;

    /// Open the bytes stored under `storage_key`
    async fn fetch(&self, storage_key: &str) -> StorageResult<FetchedObject>;

    /// Remove the bytes behind `object`
    async fn delete(&self, object: &StoredObject) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn ImageBackend) {}
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("telegram".parse::<BackendKind>().unwrap(), BackendKind::Relay);
        assert_eq!("Relay".parse::<BackendKind>().unwrap(), BackendKind::Relay);
        assert_eq!("object_store".parse::<BackendKind>().unwrap(), BackendKind::ObjectStore);
        assert_eq!("R2".parse::<BackendKind>().unwrap(), BackendKind::ObjectStore);
        assert!(matches!(
            "ftp".parse::<BackendKind>(),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_backend_kind_round_trips_through_as_str() {
        for kind in [BackendKind::Relay, BackendKind::ObjectStore] {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_collect_body() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ])
        .boxed();
        assert_eq!(collect_body(body).await.unwrap(), Bytes::from_static(b"abcd"));
    }
}
