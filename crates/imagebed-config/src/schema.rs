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
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Metadata database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Object store binding; absent means uploads cannot select it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store: Option<ObjectStoreConfig>,

    /// Bot relay endpoint
    #[serde(default)]
    pub relay: RelayConfig,

    /// Timeouts and retries for relay and object store calls
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Gateway settings written on first start when the key is absent
    #[serde(default)]
    pub settings_seed: BTreeMap<String, String>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    /// Get the full bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// SQLite metadata database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Object store binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend")]
pub enum ObjectStoreConfig {
    /// Process-local map, lost on restart
    #[serde(rename = "memory")]
    Memory,

    /// Local directory
    #[serde(rename = "filesystem")]
    FileSystem(FileSystemStore),

    /// S3 or an S3-compatible service (R2, MinIO)
    #[serde(rename = "s3")]
    S3(S3Store),
}

impl ObjectStoreConfig {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ObjectStoreConfig::Memory => "memory",
            ObjectStoreConfig::FileSystem(_) => "filesystem",
            ObjectStoreConfig::S3(_) => "s3",
        }
    }
}

/// Filesystem object store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSystemStore {
    /// Base directory path
    pub base_path: PathBuf,
}

/// S3 object store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Store {
    /// S3 bucket name
    pub bucket: String,

    /// Region; detected by the SDK when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// S3 endpoint (for S3-compatible services)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Object prefix
    #[serde(default)]
    pub prefix: String,
}

/// Bot relay endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Bot API base URL
    #[serde(default = "default_relay_api_base")]
    pub api_base: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            api_base: default_relay_api_base(),
        }
    }
}

/// Upstream call budget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Timeout for a single upstream call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts for fetch and delete
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    20 * 1024 * 1024
}

fn default_database_path() -> PathBuf {
    PathBuf::from("imagebed.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_relay_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
