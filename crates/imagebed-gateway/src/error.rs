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
//! Gateway error types and their HTTP classification

use imagebed_metadata::MetadataError;
use imagebed_storage::StorageError;
use thiserror::Error;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced by the upload, resolve and catalog paths
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required setting or backend binding is missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage backend refused the operation
    #[error("upstream error: {0}")]
    Upstream(String),

    /// No bytes exist for the requested identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// The storage backend could not be reached in time
    #[error("upstream unavailable: {0}")]
    Transient(String),

    /// The request itself is unusable
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The metadata store failed
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl GatewayError {
    /// Create a Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GatewayError::Config(msg.into())
    }

    /// Create an InvalidRequest error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        GatewayError::InvalidRequest(msg.into())
    }

    /// Create a NotFound error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        GatewayError::NotFound(what.into())
    }

    /// Stable machine-readable name, used as `kind` in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "config",
            GatewayError::Upstream(_) => "upstream",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Transient(_) => "transient",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::Metadata(_) => "metadata",
        }
    }

    /// HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Config(_) => 500,
            GatewayError::Upstream(_) => 502,
            GatewayError::NotFound(_) => 404,
            GatewayError::Transient(_) => 504,
            GatewayError::InvalidRequest(_) => 400,
            GatewayError::Metadata(_) => 500,
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => GatewayError::NotFound(key),
            StorageError::Upstream(msg) => GatewayError::Upstream(msg),
            StorageError::Transient(msg) => GatewayError::Transient(msg),
            StorageError::Config(msg) => GatewayError::Config(msg),
            StorageError::InvalidKey(msg) => GatewayError::InvalidRequest(msg),
            other @ (StorageError::Io(_) | StorageError::Other(_)) => {
                GatewayError::Upstream(other.to_string())
            }
        }
    }
}
