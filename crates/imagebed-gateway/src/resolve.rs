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
//! Direct-link resolution
//!
//! `/image/{key}{.ext}` → record lookup → owning backend `fetch` → streamed
//! bytes with an inferred content type. Identifiers without a record are
//! treated as relay keys so links minted before the record existed keep
//! working.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Gateway, RequestContext};
use bytes::Bytes;
use imagebed_storage::media::{resolve_content_type, split_identifier};
use imagebed_storage::{BackendKind, BodyStream, StorageResult};
use std::fmt;
use tracing::debug;

/// `Cache-Control` for served images; bytes behind a key never change
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// `Content-Disposition` for served images
pub const CONTENT_DISPOSITION: &str = "inline";

/// Bytes ready to be proxied to the client
pub struct ResolvedImage {
    pub body: BodyStream,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub backend: BackendKind,
}

impl ResolvedImage {
    /// Buffer the whole body.
    pub async fn into_bytes(self) -> StorageResult<Bytes> {
        imagebed_storage::collect_body(self.body).await
    }
}

impl fmt::Debug for ResolvedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedImage")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Open the image behind a public identifier such as `abc123.png`.
    pub async fn resolve(&self, ctx: &RequestContext, identifier: &str) -> GatewayResult<ResolvedImage> {
        let (storage_key, extension) = split_identifier(identifier);
        if storage_key.is_empty() {
            return Err(GatewayError::not_found(identifier));
        }

        let record = self.metadata.get_record_by_storage_key(storage_key).await?;
        let kind = record.as_ref().map_or(BackendKind::Relay, |r| r.backend);

        let backend = match self.backends.backend_for(kind, &ctx.settings) {
            Ok(backend) => backend,
            Err(GatewayError::Config(reason)) if record.is_none() => {
                debug!(key = storage_key, %reason, "Unrecorded identifier and no relay binding");
                return Err(GatewayError::not_found(identifier));
            }
            Err(e) => return Err(e),
        };

        let fetched = backend.fetch(storage_key).await?;
        let content_type = resolve_content_type(extension.as_deref(), fetched.content_type.as_deref());

        debug!(key = storage_key, backend = %kind, %content_type, "Resolved image");
        Ok(ResolvedImage {
            body: fetched.body,
            content_type,
            content_length: fetched.content_length,
            backend: kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendRegistry;
    use crate::settings::{GatewaySettings, STORAGE_BACKEND};
    use crate::upload::UploadSource;
    use imagebed_metadata::SqliteStore;
    use imagebed_storage::{BlobStore, MemoryBlobStore, UpstreamPolicy};
    use std::sync::Arc;

    async fn gateway(blobs: &MemoryBlobStore) -> Gateway {
        let metadata = Arc::new(SqliteStore::new_in_memory().await.unwrap());
        let backends = BackendRegistry::new(reqwest::Client::new(), "http://relay.invalid", UpstreamPolicy::default())
            .with_blob_store(Arc::new(blobs.clone()));
        Gateway::new(metadata, backends)
    }

    fn ctx() -> RequestContext {
        RequestContext::new(
            GatewaySettings::from_map([(STORAGE_BACKEND.to_string(), "object_store".to_string())].into()),
            "http://localhost:8080",
        )
    }

    #[tokio::test]
    async fn test_round_trip() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;

        let outcome = gateway
            .handle_upload(&ctx(), Bytes::from_static(b"GIF89a"), Some("dance.gif"), UploadSource::Api)
            .await
            .unwrap();

        let resolved = gateway.resolve(&ctx(), &format!("{}.gif", outcome.file_id)).await.unwrap();
        assert_eq!(resolved.content_type, "image/gif");
        assert_eq!(resolved.backend, BackendKind::ObjectStore);
        assert_eq!(resolved.into_bytes().await.unwrap(), Bytes::from_static(b"GIF89a"));
    }

    #[tokio::test]
    async fn test_extension_in_link_wins_over_stored_hint() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;

        let outcome = gateway
            .handle_upload(&ctx(), Bytes::from_static(b"x"), Some("photo.png"), UploadSource::Api)
            .await
            .unwrap();

        let as_webp = gateway.resolve(&ctx(), &format!("{}.webp", outcome.file_id)).await.unwrap();
        assert_eq!(as_webp.content_type, "image/webp");

        let bare = gateway.resolve(&ctx(), &outcome.file_id).await.unwrap();
        assert_eq!(bare.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_declared_type_then_default() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;

        let outcome = gateway
            .handle_upload(&ctx(), Bytes::from_static(b"x"), Some("blob.bin"), UploadSource::Api)
            .await
            .unwrap();
        let resolved = gateway.resolve(&ctx(), &outcome.file_id).await.unwrap();
        assert_eq!(resolved.content_type, "image/jpeg");

        blobs
            .put(&outcome.file_id, Bytes::from_static(b"y"), Some("image/x-custom"))
            .await
            .unwrap();
        let resolved = gateway.resolve(&ctx(), &outcome.file_id).await.unwrap();
        assert_eq!(resolved.content_type, "image/x-custom");
    }

    #[tokio::test]
    async fn test_unknown_identifier_without_relay_is_not_found() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;

        let err = gateway.resolve(&ctx(), "nothing-here.png").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));

        let err = gateway.resolve(&ctx(), ".png").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }
}
