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
use imagebed_gateway::Gateway;

/// Default request body limit (20 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    /// Upload, resolve and catalog operations
    pub gateway: Gateway,

    /// Largest request body accepted, uploads included
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Create new app state with the default body limit
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the request body limit
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }
}
