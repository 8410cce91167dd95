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
use anyhow::{Context, Result};
use imagebed_config::{Config, ObjectStoreConfig};
use imagebed_gateway::{BackendRegistry, Gateway};
use imagebed_metadata::{MetadataStore, SqliteStore};
use imagebed_storage::{BlobStore, LocalBlobStore, MemoryBlobStore, S3BlobStore, S3Config, UpstreamPolicy};
use std::sync::Arc;

use crate::state::AppState;

/// Upstream timeout and retry budget from the `upstream` section
pub fn upstream_policy(config: &Config) -> UpstreamPolicy {
    UpstreamPolicy {
        timeout: config.upstream.timeout(),
        max_attempts: config.upstream.retry_attempts,
        initial_backoff: config.upstream.initial_backoff(),
    }
}

/// Open the blob store named by the `object_store` section
pub async fn build_blob_store(config: &ObjectStoreConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config {
        ObjectStoreConfig::Memory => {
            tracing::warn!("Object store is in-memory; uploaded bytes are lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
        ObjectStoreConfig::FileSystem(fs) => Arc::new(
            LocalBlobStore::new(&fs.base_path)
                .await
                .with_context(|| format!("Failed to open object store at {}", fs.base_path.display()))?,
        ),
        ObjectStoreConfig::S3(s3) => Arc::new(
            S3BlobStore::with_config(S3Config {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                prefix: s3.prefix.clone(),
            })
            .await
            .with_context(|| format!("Failed to initialize S3 bucket {}", s3.bucket))?,
        ),
    };
    Ok(store)
}

/// Open every dependency named by `config` and assemble the shared state
pub async fn build_state(config: &Config) -> Result<AppState> {
    let metadata = SqliteStore::new(&config.database.path, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open metadata store at {}", config.database.path.display()))?;
    metadata
        .health_check()
        .await
        .context("Metadata store failed its health check")?;

    let seeded = metadata
        .seed_settings(&config.settings_seed)
        .await
        .context("Failed to seed settings")?;
    if seeded > 0 {
        tracing::info!("Seeded {} settings", seeded);
    }

    let policy = upstream_policy(config);
    let http = reqwest::Client::builder()
        .connect_timeout(policy.timeout)
        .read_timeout(policy.timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let mut backends = BackendRegistry::new(http, config.relay.api_base.clone(), policy);

    match &config.object_store {
        Some(object_store) => {
            tracing::info!("Object store backend: {}", object_store.name());
            backends = backends.with_blob_store(build_blob_store(object_store).await?);
        }
        None => tracing::info!("No object store configured"),
    }

    let gateway = Gateway::new(Arc::new(metadata), backends);
    Ok(AppState::new(gateway).with_body_limit(config.server.body_limit_bytes))
}
