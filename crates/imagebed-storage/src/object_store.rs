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
//! Object-store image backend
//!
//! Direct blob storage keyed by a UUID generated at upload time. There is no
//! indirection: `fetch` is one key lookup and `delete` one key removal.

use crate::blob::BlobStore;
use crate::error::StorageResult;
use crate::media::mime_for_filename;
use crate::retry::{with_retry, with_timeout, UpstreamPolicy};
use crate::{BackendKind, FetchedObject, ImageBackend, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Image backend on top of a [`BlobStore`]
#[derive(Clone)]
pub struct ObjectStoreBackend {
    blobs: Arc<dyn BlobStore>,
    policy: UpstreamPolicy,
}

impl ObjectStoreBackend {
    /// Create a backend writing to `blobs`
    pub fn new(blobs: Arc<dyn BlobStore>, policy: UpstreamPolicy) -> Self {
        ObjectStoreBackend { blobs, policy }
    }
}

impl fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("blobs", &self.blobs)
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl ImageBackend for ObjectStoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }

    async fn store(&self, data: Bytes, filename: &str) -> StorageResult<StoredObject> {
        let storage_key = Uuid::new_v4().to_string();
        let content_type = mime_for_filename(filename);
        let size = data.len();

        with_timeout(
            &self.policy,
            "object store put",
            self.blobs.put(&storage_key, data, content_type),
        )
        .await?;

        info!(key = %storage_key, size, filename, "Stored image in object store");
        Ok(StoredObject {
            storage_key,
            backend: BackendKind::ObjectStore,
            relay_message_id: None,
        })
    }

    async fn fetch(&self, storage_key: &str) -> StorageResult<FetchedObject> {
        let blobs = &self.blobs;
        let blob = with_retry(&self.policy, "object store get", move || blobs.get(storage_key)).await?;
        debug!(key = storage_key, "Opened object store blob");
        Ok(blob.into())
    }

    async fn delete(&self, object: &StoredObject) -> StorageResult<()> {
        let blobs = &self.blobs;
        let key = object.storage_key.as_str();
        with_retry(&self.policy, "object store delete", move || blobs.delete(key)).await?;
        info!(key, "Deleted image from object store");
        Ok(())
    }
}
