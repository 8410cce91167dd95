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
//! Storage error types and utilities

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found in the backend
    #[error("object not found: {0}")]
    NotFound(String),

    /// The upstream answered, but refused or returned something unusable
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The upstream could not be reached or did not answer in time
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// A required binding or credential is missing
    #[error("backend misconfigured: {0}")]
    Config(String),

    /// Invalid key format (empty, contains path separators, etc.)
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transparent error delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    /// Create a NotFound error with the given key
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        StorageError::NotFound(key.into())
    }

    /// Create an Upstream error with context
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        StorageError::Upstream(msg.into())
    }

    /// Create a Transient error with context
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        StorageError::Transient(msg.into())
    }

    /// Create a Config error with context
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StorageError::Config(msg.into())
    }

    /// Create an InvalidKey error with context
    pub fn invalid_key<S: Into<String>>(msg: S) -> Self {
        StorageError::InvalidKey(msg.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Check if this error is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            StorageError::Transient(err.to_string())
        } else {
            StorageError::Upstream(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StorageError::not_found("test_key");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object not found: test_key");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(StorageError::transient("reset by peer").is_transient());
        assert!(!StorageError::upstream("bad request").is_transient());
        assert!(!StorageError::not_found("k").is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::other("read failed");
        let storage_err = StorageError::from(io_err);
        assert!(matches!(storage_err, StorageError::Io(_)));
    }
}
