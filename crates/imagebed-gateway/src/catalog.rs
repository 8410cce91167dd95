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
//! Listing, editing and deleting recorded images, plus settings CRUD

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Gateway, RequestContext};
use crate::settings::validate_update;
use imagebed_metadata::{ImageRecord, ImageUpdate, SettingsMap};
use imagebed_storage::media::derive_extension;
use serde::Serialize;
use tracing::{info, warn};

/// Entry of the public gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicImage {
    pub file_id: String,
    pub filename: String,
    pub url: String,
}

/// Entry of the admin listing: the full record plus its link
#[derive(Debug, Clone, Serialize)]
pub struct AdminImage {
    #[serde(flatten)]
    pub record: ImageRecord,
    pub file_id: String,
    pub url: String,
}

fn record_url(ctx: &RequestContext, record: &ImageRecord) -> String {
    ctx.image_url(&record.storage_key, &derive_extension(&record.filename))
}

impl Gateway {
    /// All images, newest first, reduced to what the gallery shows.
    pub async fn list_public(&self, ctx: &RequestContext) -> GatewayResult<Vec<PublicImage>> {
        let records = self.metadata.list_records().await?;
        Ok(records
            .into_iter()
            .map(|record| PublicImage {
                url: record_url(ctx, &record),
                file_id: record.storage_key,
                filename: record.filename,
            })
            .collect())
    }

    /// All images, newest first, with every recorded field.
    pub async fn list_admin(&self, ctx: &RequestContext) -> GatewayResult<Vec<AdminImage>> {
        let records = self.metadata.list_records().await?;
        Ok(records
            .into_iter()
            .map(|record| AdminImage {
                url: record_url(ctx, &record),
                file_id: record.storage_key.clone(),
                record,
            })
            .collect())
    }

    /// Change the filename and/or description of the image behind `file_id`.
    pub async fn edit(&self, file_id: &str, update: ImageUpdate) -> GatewayResult<()> {
        if update.is_empty() {
            return Err(GatewayError::invalid_request("nothing to update"));
        }

        if !self.metadata.update_record(file_id, update).await? {
            return Err(GatewayError::not_found(file_id));
        }

        info!(key = file_id, "Image metadata updated");
        Ok(())
    }

    /// Delete the image with record id `id`.
    ///
    /// Best effort: the backend copy is removed first and any failure there
    /// is logged; the record is removed regardless. Returns `false` when no
    /// such record exists.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> GatewayResult<bool> {
        let Some(record) = self.metadata.get_record(id).await? else {
            return Ok(false);
        };

        match self.backends.backend_for(record.backend, &ctx.settings) {
            Ok(backend) => {
                if let Err(e) = backend.delete(&record.stored_object()).await {
                    warn!(id, key = %record.storage_key, backend = %record.backend, error = %e, "Backend delete failed, removing record anyway");
                }
            }
            Err(e) => {
                warn!(id, key = %record.storage_key, backend = %record.backend, error = %e, "Backend unavailable, removing record anyway");
            }
        }

        let removed = self.metadata.delete_record(id).await?;
        info!(id, key = %record.storage_key, "Image deleted");
        Ok(removed)
    }

    /// Current settings table.
    pub async fn settings(&self) -> GatewayResult<SettingsMap> {
        Ok(self.metadata.get_settings().await?)
    }

    /// Upsert `updates` into the settings table.
    pub async fn update_settings(&self, updates: &SettingsMap) -> GatewayResult<()> {
        validate_update(updates)?;
        self.metadata.set_settings(updates).await?;
        info!(keys = updates.len(), "Settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendRegistry;
    use crate::settings::{GatewaySettings, STORAGE_BACKEND};
    use crate::upload::UploadSource;
    use bytes::Bytes;
    use imagebed_metadata::SqliteStore;
    use imagebed_storage::{MemoryBlobStore, UpstreamPolicy};
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

    async fn upload(gateway: &Gateway, name: &str) -> String {
        gateway
            .handle_upload(&ctx(), Bytes::from_static(b"img"), Some(name), UploadSource::Admin)
            .await
            .unwrap()
            .file_id
    }

    #[tokio::test]
    async fn test_public_listing_is_newest_first() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;
        let first = upload(&gateway, "one.png").await;
        let second = upload(&gateway, "two.gif").await;

        let listing = gateway.list_public(&ctx()).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].file_id, second);
        assert_eq!(listing[0].url, format!("http://localhost:8080/image/{}.gif", second));
        assert_eq!(listing[1].file_id, first);
        assert_eq!(listing[1].filename, "one.png");
    }

    #[tokio::test]
    async fn test_admin_listing_serializes_flat() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;
        let key = upload(&gateway, "one.png").await;

        let listing = gateway.list_admin(&ctx()).await.unwrap();
        let json = serde_json::to_value(&listing[0]).unwrap();
        assert_eq!(json["file_id"], key);
        assert_eq!(json["storage_key"], key);
        assert_eq!(json["backend"], "object_store");
        assert_eq!(json["description"], "Admin Upload (Object Store)");
        assert!(json["url"].as_str().unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn test_edit() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;
        let key = upload(&gateway, "one.png").await;

        gateway
            .edit(
                &key,
                ImageUpdate {
                    filename: Some("renamed.png".into()),
                    description: Some("holiday".into()),
                },
            )
            .await
            .unwrap();

        let record = gateway.metadata().get_record_by_storage_key(&key).await.unwrap().unwrap();
        assert_eq!(record.filename, "renamed.png");
        assert_eq!(record.description, "holiday");

        let err = gateway
            .edit(
                "missing",
                ImageUpdate {
                    filename: Some("x".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));

        let err = gateway.edit(&key, ImageUpdate::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_bytes_and_record() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;
        let key = upload(&gateway, "one.png").await;
        let id = gateway.metadata().get_record_by_storage_key(&key).await.unwrap().unwrap().id;

        assert!(gateway.delete(&ctx(), id).await.unwrap());
        assert!(blobs.is_empty().await);
        assert!(matches!(
            gateway.resolve(&ctx(), &format!("{}.png", key)).await,
            Err(GatewayError::NotFound(_))
        ));

        assert!(!gateway.delete(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_backend_is_unbound() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;
        let key = upload(&gateway, "one.png").await;
        let id = gateway.metadata().get_record_by_storage_key(&key).await.unwrap().unwrap().id;

        let unbound = Gateway::new(
            Arc::clone(gateway.metadata()),
            BackendRegistry::new(reqwest::Client::new(), "http://relay.invalid", UpstreamPolicy::default()),
        );
        assert!(unbound.delete(&ctx(), id).await.unwrap());
        assert!(gateway.metadata().get_record(id).await.unwrap().is_none());
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn test_settings_update() {
        let blobs = MemoryBlobStore::new();
        let gateway = gateway(&blobs).await;

        let updates: SettingsMap = [
            (STORAGE_BACKEND.to_string(), "telegram".to_string()),
            ("tg_chat_id".to_string(), "-100".to_string()),
        ]
        .into();
        gateway.update_settings(&updates).await.unwrap();
        assert_eq!(gateway.settings().await.unwrap(), updates);

        let bad: SettingsMap = [(STORAGE_BACKEND.to_string(), "floppy".to_string())].into();
        assert!(matches!(
            gateway.update_settings(&bad).await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert_eq!(gateway.settings().await.unwrap()[STORAGE_BACKEND], "telegram");
    }
}
