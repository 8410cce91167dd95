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
//! Upload orchestration
//!
//! bytes → selected backend `store` → metadata insert → `{url, file_id}`.
//! A record is inserted only after the backend store succeeded, and an
//! object whose record could not be written is removed again.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Gateway, RequestContext};
use bytes::Bytes;
use imagebed_metadata::{ImageRecord, MetadataError, NewImageRecord};
use imagebed_storage::media::derive_extension;
use imagebed_storage::{ImageBackend, StoredObject};
use serde::Serialize;
use tracing::{info, warn};

/// Where an upload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSource {
    /// External API clients
    Api,

    /// The admin console
    Admin,
}

impl UploadSource {
    /// Provenance label written into the record description
    pub fn label(&self) -> &'static str {
        match self {
            UploadSource::Api => "API Upload",
            UploadSource::Admin => "Admin Upload",
        }
    }

    /// Filename used when the client sent none
    pub fn default_filename(&self) -> &'static str {
        match self {
            UploadSource::Api => "api_upload.png",
            UploadSource::Admin => "admin_upload.png",
        }
    }
}

/// Canonical result of an upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub url: String,
    pub file_id: String,
    #[serde(skip)]
    pub record: ImageRecord,
}

impl Gateway {
    /// Store `data` on the selected backend and record it.
    pub async fn handle_upload(
        &self,
        ctx: &RequestContext,
        data: Bytes,
        filename: Option<&str>,
        source: UploadSource,
    ) -> GatewayResult<UploadOutcome> {
        if data.is_empty() {
            return Err(GatewayError::invalid_request("uploaded file is empty"));
        }

        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| source.default_filename());
        let extension = derive_extension(filename);

        let kind = ctx.settings.selected_backend()?;
        let backend = self.backends.backend_for(kind, &ctx.settings)?;

        let size = data.len();
        let stored = backend.store(data, filename).await?;

        let description = format!("{} ({})", source.label(), kind.display_name());
        let new_record = NewImageRecord::from_stored(stored.clone(), filename, description);

        let record = match self.metadata.insert_record(new_record).await {
            Ok(record) => record,
            Err(MetadataError::AlreadyExists(_)) => {
                warn!(
                    key = %stored.storage_key,
                    backend = %kind,
                    "Backend reissued an existing storage key, keeping the original record"
                );
                discard(backend.as_ref(), &stored).await;
                self.metadata
                    .get_record_by_storage_key(&stored.storage_key)
                    .await?
                    .ok_or_else(|| GatewayError::not_found(stored.storage_key.clone()))?
            }
            Err(e) => {
                discard(backend.as_ref(), &stored).await;
                return Err(e.into());
            }
        };

        info!(
            id = record.id,
            key = %record.storage_key,
            backend = %kind,
            size,
            filename,
            source = source.label(),
            "Upload recorded"
        );

        Ok(UploadOutcome {
            url: ctx.image_url(&record.storage_key, &extension),
            file_id: record.storage_key.clone(),
            record,
        })
    }
}

async fn discard(backend: &dyn ImageBackend, stored: &StoredObject) {
    if let Err(e) = backend.delete(stored).await {
        warn!(key = %stored.storage_key, error = %e, "Failed to remove unrecorded object");
    }
}
