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
//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{ImageRecord, ImageRow, ImageUpdate, NewImageRecord, SettingsMap};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Persistence for image records and gateway settings.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All records, newest first.
    async fn list_records(&self) -> MetadataResult<Vec<ImageRecord>>;

    /// Record by surrogate id.
    async fn get_record(&self, id: i64) -> MetadataResult<Option<ImageRecord>>;

    /// Newest record carrying `storage_key`.
    async fn get_record_by_storage_key(&self, storage_key: &str) -> MetadataResult<Option<ImageRecord>>;

    /// Insert a record for an object that is already stored.
    async fn insert_record(&self, record: NewImageRecord) -> MetadataResult<ImageRecord>;

    /// Apply `update` to the records carrying `storage_key`. Returns whether
    /// any row matched.
    async fn update_record(&self, storage_key: &str, update: ImageUpdate) -> MetadataResult<bool>;

    /// Remove a record. Returns whether it existed.
    async fn delete_record(&self, id: i64) -> MetadataResult<bool>;

    /// Every settings entry.
    async fn get_settings(&self) -> MetadataResult<SettingsMap>;

    /// Upsert settings entries.
    async fn set_settings(&self, settings: &SettingsMap) -> MetadataResult<()>;

    /// Insert settings entries whose key is absent. Returns how many were written.
    async fn seed_settings(&self, settings: &SettingsMap) -> MetadataResult<u64>;

    /// Check database connectivity.
    async fn health_check(&self) -> MetadataResult<()>;
}

const IMAGE_COLUMNS: &str =
    "id, storage_key, backend, relay_message_id, filename, description, upload_time";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        storage_key TEXT NOT NULL,
        backend TEXT NOT NULL,
        relay_message_id INTEGER,
        filename TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        upload_time TEXT NOT NULL,
        UNIQUE(backend, storage_key)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_images_storage_key
    ON images(storage_key)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_images_upload_time
    ON images(upload_time DESC, id DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// SQLite-based metadata store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> MetadataResult<Self> {
        let path = path.as_ref();
        if max_connections == 0 {
            return Err(MetadataError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        info!(path = %path.display(), max_connections, "Opened metadata store");
        Ok(store)
    }

    /// In-memory database, for tests.
    pub async fn new_in_memory() -> MetadataResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to `:memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn migrate(&self) -> MetadataResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Metadata schema up to date");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn list_records(&self) -> MetadataResult<Vec<ImageRecord>> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {} FROM images ORDER BY upload_time DESC, id DESC",
            IMAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ImageRecord::try_from).collect()
    }

    async fn get_record(&self, id: i64) -> MetadataResult<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {} FROM images WHERE id = ?1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ImageRecord::try_from).transpose()
    }

    async fn get_record_by_storage_key(&self, storage_key: &str) -> MetadataResult<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {} FROM images WHERE storage_key = ?1 ORDER BY id DESC LIMIT 1",
            IMAGE_COLUMNS
        ))
        .bind(storage_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ImageRecord::try_from).transpose()
    }

    async fn insert_record(&self, record: NewImageRecord) -> MetadataResult<ImageRecord> {
        let upload_time = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO images (storage_key, backend, relay_message_id, filename, description, upload_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&record.storage_key)
        .bind(record.backend.as_str())
        .bind(record.relay_message_id)
        .bind(&record.filename)
        .bind(&record.description)
        .bind(upload_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            MetadataError::from_insert(e, format!("{}/{}", record.backend, record.storage_key))
        })?;

        debug!(id, key = %record.storage_key, backend = %record.backend, "Inserted image record");

        Ok(ImageRecord {
            id,
            storage_key: record.storage_key,
            backend: record.backend,
            relay_message_id: record.relay_message_id,
            filename: record.filename,
            description: record.description,
            upload_time,
        })
    }

    async fn update_record(&self, storage_key: &str, update: ImageUpdate) -> MetadataResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET filename = COALESCE(?1, filename),
                description = COALESCE(?2, description)
            WHERE storage_key = ?3
            "#,
        )
        .bind(update.filename)
        .bind(update.description)
        .bind(storage_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_record(&self, id: i64) -> MetadataResult<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_settings(&self) -> MetadataResult<SettingsMap> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn set_settings(&self, settings: &SettingsMap) -> MetadataResult<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in settings {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(count = settings.len(), "Updated settings");
        Ok(())
    }

    async fn seed_settings(&self, settings: &SettingsMap) -> MetadataResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for (key, value) in settings {
            let result = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        Ok(written)
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use imagebed_storage::BackendKind;

    fn new_record(key: &str, backend: BackendKind) -> NewImageRecord {
        NewImageRecord {
            storage_key: key.to_string(),
            backend,
            relay_message_id: match backend {
                BackendKind::Relay => Some(10),
                BackendKind::ObjectStore => None,
            },
            filename: format!("{}.png", key),
            description: "API Upload (Telegram)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        let inserted = store
            .insert_record(new_record("abc", BackendKind::Relay))
            .await
            .unwrap();
        assert!(inserted.id > 0);

        let by_id = store.get_record(inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id, inserted);

        let by_key = store.get_record_by_storage_key("abc").await.unwrap().unwrap();
        assert_eq!(by_key.id, inserted.id);
        assert_eq!(by_key.relay_message_id, Some(10));

        assert!(store.get_record(9999).await.unwrap().is_none());
        assert!(store.get_record_by_storage_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_within_backend() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        store.insert_record(new_record("dup", BackendKind::Relay)).await.unwrap();
        let err = store
            .insert_record(new_record("dup", BackendKind::Relay))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::AlreadyExists(_)));

        // Same key under another backend is a different object.
        store
            .insert_record(new_record("dup", BackendKind::ObjectStore))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        for key in ["first", "second", "third"] {
            store.insert_record(new_record(key, BackendKind::ObjectStore)).await.unwrap();
        }

        let keys: Vec<String> = store
            .list_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.storage_key)
            .collect();
        assert_eq!(keys, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let record = store
            .insert_record(new_record("edit-me", BackendKind::ObjectStore))
            .await
            .unwrap();

        let changed = store
            .update_record(
                "edit-me",
                ImageUpdate {
                    filename: None,
                    description: Some("holiday".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(changed);

        let updated = store.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(updated.filename, "edit-me.png");
        assert_eq!(updated.description, "holiday");

        assert!(!store.update_record("missing", ImageUpdate::default()).await.unwrap());

        assert!(store.delete_record(record.id).await.unwrap());
        assert!(!store.delete_record(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_settings_upsert_and_seed() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        let mut seed = SettingsMap::new();
        seed.insert("storage_backend".to_string(), "telegram".to_string());
        seed.insert("tg_chat_id".to_string(), "-100".to_string());
        assert_eq!(store.seed_settings(&seed).await.unwrap(), 2);

        let mut update = SettingsMap::new();
        update.insert("storage_backend".to_string(), "object_store".to_string());
        store.set_settings(&update).await.unwrap();

        // Seeding again never overwrites.
        assert_eq!(store.seed_settings(&seed).await.unwrap(), 0);

        let settings = store.get_settings().await.unwrap();
        assert_eq!(settings["storage_backend"], "object_store");
        assert_eq!(settings["tg_chat_id"], "-100");
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store.health_check().await.unwrap();
    }
}
