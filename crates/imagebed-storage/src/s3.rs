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
//! S3-compatible blob store
//!
//! Provides a [`BlobStore`](crate::BlobStore) implementation for AWS S3 and
//! S3-compatible services (Cloudflare R2, MinIO, ...):
//! - AWS SDK configuration using credential chains (environment, IAM, profiles)
//! - Optional custom endpoint and key prefix
//! - Content type written as object metadata and read back on `get`
//! - Streamed downloads
//!
//! # Configuration
//!
//! Credentials come from the AWS SDK's credential chain:
//! 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, etc.)
//! 2. IAM role credentials
//! 3. AWS profiles (~/.aws/credentials and ~/.aws/config)
//!
//! # Examples
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use imagebed_storage::{BlobStore, S3BlobStore, S3Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), imagebed_storage::StorageError> {
//!     let store = S3BlobStore::with_config(S3Config {
//!         bucket: "images".to_string(),
//!         endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     store.put("0b7c3e9e", Bytes::from_static(b"GIF89a"), Some("image/gif")).await?;
//!     Ok(())
//! }
//! ```

use crate::blob::{validate_key, Blob, BlobStore};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Configuration for the S3 blob store
#[derive(Clone, Debug, Default)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// Optional region override (otherwise detected by the SDK)
    pub region: Option<String>,

    /// Optional custom S3 endpoint (for S3-compatible services)
    pub endpoint: Option<String>,

    /// Key prefix prepended to every object key
    pub prefix: String,
}

/// S3-compatible blob store
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    config: Arc<S3Config>,
}

/// Map an SDK failure: transport problems are transient, anything the
/// service answered is an upstream error.
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
    R: fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StorageError::transient(format!("{} failed: {}", operation, err))
        }
        _ => StorageError::upstream(format!("{} failed: {}", operation, err)),
    }
}

impl S3BlobStore {
    /// Create a store for `bucket` with default configuration
    pub async fn new(bucket: impl Into<String>) -> StorageResult<Self> {
        Self::with_config(S3Config {
            bucket: bucket.into(),
            ..Default::default()
        })
        .await
    }

    /// Create a store with custom configuration
    ///
    /// Verifies bucket access with a `HeadBucket` call.
    pub async fn with_config(config: S3Config) -> StorageResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::config("S3 bucket name cannot be empty"));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let client = if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint.clone())
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        };

        client
            .head_bucket()
            .bucket(&config.bucket)
            .send()
            .await
            .map_err(|e| classify(&format!("verify bucket {}", config.bucket), e))?;

        debug!(
            "Connected to S3 bucket: {} with region: {:?}",
            config.bucket,
            sdk_config.region()
        );

        Ok(S3BlobStore {
            client,
            config: Arc::new(config),
        })
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }
}

impl fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("bucket", &self.config.bucket)
            .field("endpoint", &self.config.endpoint)
            .field("prefix", &self.config.prefix)
            .finish()
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        validate_key(key)?;

        let size = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(self.object_key(key))
            .body(ByteStream::from(data));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| classify("put_object", e))?;

        debug!(key, size, "Uploaded blob to S3");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Blob> {
        validate_key(key)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::not_found(key)
                } else {
                    classify("get_object", e)
                }
            })?;

        let content_type = response.content_type().map(str::to_string);
        let content_length = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok());
        let reader = response.body.into_async_read();

        Ok(Blob {
            body: ReaderStream::new(reader).map_err(StorageError::from).boxed(),
            content_type,
            content_length,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;

        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(self.object_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(classify("head_object", e)),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;

        // S3 DeleteObject already succeeds for missing keys.
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| classify("delete_object", e))?;

        debug!(key, "Deleted blob from S3");
        Ok(())
    }
}
