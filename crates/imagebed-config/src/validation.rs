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
use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;

/// Validator for configuration settings
pub trait Validator {
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        if let Some(object_store) = &self.object_store {
            object_store.validate()?;
        }
        self.relay.validate()?;
        self.upstream.validate()?;
        self.observability.validate()?;

        if self.settings_seed.keys().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "settings_seed",
                "setting keys must not be empty",
            ));
        }

        Ok(())
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired("server.host".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                format!("port must be between 1 and 65535, got {}", self.port),
            ));
        }

        if self.body_limit_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.body_limit_bytes",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validator for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database.path".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "database.max_connections",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

impl Validator for ObjectStoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            ObjectStoreConfig::Memory => Ok(()),
            ObjectStoreConfig::FileSystem(fs) => fs.validate(),
            ObjectStoreConfig::S3(s3) => s3.validate(),
        }
    }
}

impl Validator for FileSystemStore {
    fn validate(&self) -> ConfigResult<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired(
                "object_store.base_path".to_string(),
            ));
        }
        Ok(())
    }
}

impl Validator for S3Store {
    fn validate(&self) -> ConfigResult<()> {
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingRequired("object_store.bucket".to_string()));
        }

        // S3 bucket names must be 3-63 characters long
        if self.bucket.len() < 3 || self.bucket.len() > 63 {
            return Err(ConfigError::invalid_value(
                "object_store.bucket",
                "bucket name must be 3-63 characters long",
            ));
        }

        if !self
            .bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        {
            return Err(ConfigError::invalid_value(
                "object_store.bucket",
                "bucket name must contain only lowercase letters, digits, hyphens, and dots",
            ));
        }

        if let Some(endpoint) = &self.endpoint {
            if !is_http_url(endpoint) {
                return Err(ConfigError::invalid_value(
                    "object_store.endpoint",
                    format!("must be an http(s) URL, got {}", endpoint),
                ));
            }
        }

        Ok(())
    }
}

impl Validator for RelayConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !is_http_url(&self.api_base) {
            return Err(ConfigError::invalid_value(
                "relay.api_base",
                format!("must be an http(s) URL, got {}", self.api_base),
            ));
        }
        Ok(())
    }
}

impl Validator for UpstreamConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "upstream.timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.retry_attempts == 0 || self.retry_attempts > 10 {
            return Err(ConfigError::invalid_value(
                "upstream.retry_attempts",
                format!("must be between 1 and 10, got {}", self.retry_attempts),
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["debug", "info", "warn", "error", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pool_size() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bucket_naming() {
        let mut config = Config::default();
        config.object_store = Some(ObjectStoreConfig::S3(S3Store {
            bucket: "Images_Bucket".to_string(),
            region: None,
            endpoint: None,
            prefix: String::new(),
        }));
        assert!(config.validate().is_err());

        config.object_store = Some(ObjectStoreConfig::S3(S3Store {
            bucket: "images".to_string(),
            region: Some("auto".to_string()),
            endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
            prefix: "img/".to_string(),
        }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_filesystem_path() {
        let mut config = Config::default();
        config.object_store = Some(ObjectStoreConfig::FileSystem(FileSystemStore {
            base_path: Default::default(),
        }));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relay_base_must_be_url() {
        let mut config = Config::default();
        config.relay.api_base = "api.telegram.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_attempts_bounds() {
        let mut config = Config::default();
        config.upstream.retry_attempts = 0;
        assert!(config.validate().is_err());
        config.upstream.retry_attempts = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.observability.log_format = "text".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_seed_key() {
        let mut config = Config::default();
        config.settings_seed.insert(" ".to_string(), "x".to_string());
        assert!(config.validate().is_err());
    }
}
