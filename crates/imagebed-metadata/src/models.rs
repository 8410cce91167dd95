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
//! Database models mapping to the metadata schema.

use crate::error::MetadataError;
use chrono::{DateTime, Utc};
use imagebed_storage::{BackendKind, StoredObject};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Gateway settings as stored: key to value.
pub type SettingsMap = BTreeMap<String, String>;

/// Raw `images` row.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub storage_key: String,
    pub backend: String,
    pub relay_message_id: Option<i64>,
    pub filename: String,
    pub description: String,
    pub upload_time: DateTime<Utc>,
}

/// One uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Surrogate key, never reused
    pub id: i64,

    /// Key issued by the backend that holds the bytes
    pub storage_key: String,

    /// Backend that holds the bytes
    pub backend: BackendKind,

    /// Relay message carrying the attachment
    pub relay_message_id: Option<i64>,

    /// Original upload name
    pub filename: String,

    /// Free-text annotation
    pub description: String,

    /// Creation time
    pub upload_time: DateTime<Utc>,
}

impl ImageRecord {
    /// Handle for the backend's `delete`.
    pub fn stored_object(&self) -> StoredObject {
        StoredObject {
            storage_key: self.storage_key.clone(),
            backend: self.backend,
            relay_message_id: self.relay_message_id,
        }
    }
}

impl TryFrom<ImageRow> for ImageRecord {
    type Error = MetadataError;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        let backend = row.backend.parse::<BackendKind>().map_err(|_| {
            MetadataError::Internal(format!(
                "image {} has unknown backend tag '{}'",
                row.id, row.backend
            ))
        })?;

        Ok(ImageRecord {
            id: row.id,
            storage_key: row.storage_key,
            backend,
            relay_message_id: row.relay_message_id,
            filename: row.filename,
            description: row.description,
            upload_time: row.upload_time,
        })
    }
}

/// Fields supplied when inserting a record; `id` and `upload_time` are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImageRecord {
    pub storage_key: String,
    pub backend: BackendKind,
    pub relay_message_id: Option<i64>,
    pub filename: String,
    pub description: String,
}

impl NewImageRecord {
    /// Record for an object a backend has just stored.
    pub fn from_stored(
        stored: StoredObject,
        filename: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        NewImageRecord {
            storage_key: stored.storage_key,
            backend: stored.backend,
            relay_message_id: stored.relay_message_id,
            filename: filename.into(),
            description: description.into(),
        }
    }
}

/// Mutable fields of a record. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageUpdate {
    pub filename: Option<String>,
    pub description: Option<String>,
}

impl ImageUpdate {
    /// True if the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.description.is_none()
    }
}
