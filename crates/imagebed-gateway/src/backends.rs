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
//! Per-request backend construction

use crate::error::{GatewayError, GatewayResult};
use crate::settings::GatewaySettings;
use imagebed_storage::{
    BackendKind, BlobStore, ImageBackend, ObjectStoreBackend, RelayBackend, RelayConfig,
    UpstreamPolicy,
};
use std::fmt;
use std::sync::Arc;

/// Process-wide handles the backends are built from
///
/// Relay credentials come from request settings, so relay backends are
/// assembled per request around the shared HTTP client.
#[derive(Clone)]
pub struct BackendRegistry {
    http: reqwest::Client,
    relay_api_base: String,
    blobs: Option<Arc<dyn BlobStore>>,
    policy: UpstreamPolicy,
}

impl BackendRegistry {
    pub fn new(http: reqwest::Client, relay_api_base: impl Into<String>, policy: UpstreamPolicy) -> Self {
        BackendRegistry {
            http,
            relay_api_base: relay_api_base.into(),
            blobs: None,
            policy,
        }
    }

    /// Bind the blob store used by the object-store backend
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn has_object_store(&self) -> bool {
        self.blobs.is_some()
    }

    /// Backend for `kind` under the given settings.
    pub fn backend_for(
        &self,
        kind: BackendKind,
        settings: &GatewaySettings,
    ) -> GatewayResult<Arc<dyn ImageBackend>> {
        match kind {
            BackendKind::Relay => {
                let creds = settings.relay_credentials()?;
                let config = RelayConfig::new(creds.bot_token, creds.chat_id)
                    .with_api_base(self.relay_api_base.as_str());
                let backend = RelayBackend::new(self.http.clone(), config, self.policy)?;
                Ok(Arc::new(backend))
            }
            BackendKind::ObjectStore => {
                let blobs = self.blobs.as_ref().ok_or_else(|| {
                    GatewayError::config("no object store is bound to this gateway")
                })?;
                Ok(Arc::new(ObjectStoreBackend::new(Arc::clone(blobs), self.policy)))
            }
        }
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("relay_api_base", &self.relay_api_base)
            .field("blobs", &self.blobs)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
