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
use crate::schema::Config;
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "IMAGEBED_";

/// Prefix for settings seeded from the environment, e.g.
/// `IMAGEBED_SETTING_TG_BOT_TOKEN` seeds `tg_bot_token`.
pub const ENV_SETTING_PREFIX: &str = "IMAGEBED_SETTING_";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let format = ConfigFormat::from_path(path)?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        debug!("Configuration loaded from {}", format.name());

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// With no path, `imagebed.toml` in the working directory is used when it
    /// exists and defaults otherwise.
    pub async fn load_with_overrides(&self, path: Option<&Path>) -> ConfigResult<Config> {
        let mut config = match path {
            Some(path) => self.load_file(path).await?,
            None => {
                let default_path = PathBuf::from("imagebed.toml");
                if default_path.exists() {
                    self.load_file(&default_path).await?
                } else {
                    info!("No config file found, using defaults");
                    Config::default()
                }
            }
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply `IMAGEBED_*` overrides from the process environment
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides(config, std::env::vars())
    }

    /// Apply `IMAGEBED_*` overrides from `vars`
    pub fn apply_overrides<I>(&self, config: &mut Config, vars: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(key) = name.strip_prefix(ENV_SETTING_PREFIX) {
                if !key.is_empty() {
                    config.settings_seed.insert(key.to_ascii_lowercase(), value);
                }
                continue;
            }

            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match key {
                "HOST" => config.server.host = value,
                "PORT" => {
                    config.server.port =
                        parse_var(&name, &value, "expected valid port number (1-65535)")?
                }
                "BODY_LIMIT_BYTES" => {
                    config.server.body_limit_bytes =
                        parse_var(&name, &value, "expected a byte count")?
                }
                "DATABASE_PATH" => config.database.path = PathBuf::from(value),
                "DATABASE_MAX_CONNECTIONS" => {
                    config.database.max_connections =
                        parse_var(&name, &value, "expected valid integer")?
                }
                "RELAY_API_BASE" => config.relay.api_base = value,
                "UPSTREAM_TIMEOUT_SECS" => {
                    config.upstream.timeout_secs =
                        parse_var(&name, &value, "expected a number of seconds")?
                }
                "UPSTREAM_RETRY_ATTEMPTS" => {
                    config.upstream.retry_attempts =
                        parse_var(&name, &value, "expected valid integer")?
                }
                "LOG_LEVEL" => config.observability.log_level = value,
                "LOG_FORMAT" => config.observability.log_format = value,
                _ => {}
            }
        }

        if self.validate {
            config.validate()?;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str, reason: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_var_parsing_error(name, value, reason))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("config.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("config.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.json").unwrap(), ConfigFormat::Json);
    }

    #[test]
    fn test_format_detection_error() {
        assert!(ConfigFormat::from_path("config.xml").is_err());
        assert!(ConfigFormat::from_path("config").is_err());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let loader = ConfigLoader::new();
        let config = loader.load_from_string("", ConfigFormat::Toml).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.object_store.is_none());
    }

    #[test]
    fn test_overrides() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();

        loader
            .apply_overrides(
                &mut config,
                vars(&[
                    ("IMAGEBED_PORT", "9000"),
                    ("IMAGEBED_HOST", "0.0.0.0"),
                    ("IMAGEBED_LOG_FORMAT", "json"),
                    ("IMAGEBED_UPSTREAM_TIMEOUT_SECS", "5"),
                    ("IMAGEBED_SETTING_TG_BOT_TOKEN", "123:abc"),
                    ("PATH", "/usr/bin"),
                ]),
            )
            .unwrap();

        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.observability.log_format, "json");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.settings_seed["tg_bot_token"], "123:abc");
    }

    #[test]
    fn test_bad_override() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();

        let err = loader
            .apply_overrides(&mut config, vars(&[("IMAGEBED_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParsingError { .. }));
    }

    #[test]
    fn test_override_revalidates() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();

        let err = loader
            .apply_overrides(&mut config, vars(&[("IMAGEBED_LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
