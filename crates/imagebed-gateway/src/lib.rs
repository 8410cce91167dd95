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
//! Image gateway core for imagebed
//!
//! Ties the metadata store and the storage backends together:
//!
//! - [`Gateway::handle_upload`]: store bytes on the backend selected by the
//!   request settings, then record them
//! - [`Gateway::resolve`]: turn a public identifier back into a byte stream
//!   through the backend that owns the record
//! - catalog operations: listing, editing, best-effort deletion and
//!   settings management
//!
//! Settings are read from the metadata store for every request
//! ([`Gateway::context`]) and passed explicitly to each operation, so a
//! configuration change applies to the next request without a restart.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use imagebed_gateway::{BackendRegistry, Gateway, UploadSource};
//! use imagebed_metadata::SqliteStore;
//! use imagebed_storage::{MemoryBlobStore, UpstreamPolicy};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = Arc::new(SqliteStore::new_in_memory().await?);
//! let backends = BackendRegistry::new(reqwest::Client::new(), "https://api.telegram.org", UpstreamPolicy::default())
//!     .with_blob_store(Arc::new(MemoryBlobStore::new()));
//! let gateway = Gateway::new(metadata, backends);
//!
//! let ctx = gateway.context("http://localhost:8080").await?;
//! let outcome = gateway
//!     .handle_upload(&ctx, Bytes::from_static(b"GIF89a"), Some("cat.gif"), UploadSource::Api)
//!     .await?;
//! println!("{}", outcome.url);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod resolve;
pub mod settings;
pub mod upload;

pub use backends::BackendRegistry;
pub use catalog::{AdminImage, PublicImage};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, RequestContext};
pub use resolve::{ResolvedImage, CACHE_CONTROL, CONTENT_DISPOSITION};
pub use settings::GatewaySettings;
pub use upload::{UploadOutcome, UploadSource};
