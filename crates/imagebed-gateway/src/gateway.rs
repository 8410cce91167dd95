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
//! Gateway entry point and per-request context

use crate::backends::BackendRegistry;
use crate::error::GatewayResult;
use crate::settings::GatewaySettings;
use imagebed_metadata::MetadataStore;
use std::sync::Arc;

/// Shared handles behind every gateway operation
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Gateway {
    pub(crate) metadata: Arc<dyn MetadataStore>,
    pub(crate) backends: BackendRegistry,
}

impl Gateway {
    pub fn new(metadata: Arc<dyn MetadataStore>, backends: BackendRegistry) -> Self {
        Gateway { metadata, backends }
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Load fresh settings for a request that arrived on `request_origin`.
    pub async fn context(&self, request_origin: &str) -> GatewayResult<RequestContext> {
        let settings = GatewaySettings::from_map(self.metadata.get_settings().await?);
        let origin = settings.origin(request_origin);
        Ok(RequestContext { settings, origin })
    }
}

/// Settings and origin for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub settings: GatewaySettings,
    pub origin: String,
}

impl RequestContext {
    /// Build a context from already-loaded settings.
    pub fn new(settings: GatewaySettings, request_origin: &str) -> Self {
        let origin = settings.origin(request_origin);
        RequestContext { settings, origin }
    }

    /// Public direct link for a stored image
    pub fn image_url(&self, storage_key: &str, extension: &str) -> String {
        format!("{}/image/{}{}", self.origin, storage_key, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PUBLIC_BASE_URL;

    #[test]
    fn test_image_url() {
        let ctx = RequestContext::new(GatewaySettings::default(), "http://localhost:8080/");
        assert_eq!(ctx.image_url("abc", ".png"), "http://localhost:8080/image/abc.png");

        let ctx = RequestContext::new(
            GatewaySettings::from_map([(PUBLIC_BASE_URL.to_string(), "https://img.example.com".to_string())].into()),
            "http://localhost:8080",
        );
        assert_eq!(ctx.image_url("abc", ".gif"), "https://img.example.com/image/abc.gif");
    }
}
