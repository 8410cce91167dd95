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
use imagebed_config::{ConfigError, ConfigFormat, ConfigLoader, ObjectStoreConfig};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_load_toml_config() {
    let loader = ConfigLoader::new();
    let toml_content = r#"
[server]
host = "0.0.0.0"
port = 8787

[database]
path = "/var/lib/imagebed/imagebed.db"
max_connections = 4

[object_store]
backend = "s3"
bucket = "images"
region = "auto"
endpoint = "https://account.r2.cloudflarestorage.com"

[upstream]
timeout_secs = 10
retry_attempts = 2

[settings_seed]
storage_backend = "object_store"
"#;

    let config = loader
        .load_from_string(toml_content, ConfigFormat::Toml)
        .unwrap();

    assert_eq!(config.server.port, 8787);
    assert_eq!(config.database.max_connections, 4);
    match config.object_store {
        Some(ObjectStoreConfig::S3(s3)) => {
            assert_eq!(s3.bucket, "images");
            assert_eq!(s3.region.as_deref(), Some("auto"));
            assert!(s3.prefix.is_empty());
        }
        other => panic!("unexpected object store: {:?}", other),
    }
    assert_eq!(config.upstream.retry_attempts, 2);
    assert_eq!(config.upstream.initial_backoff_ms, 100);
    assert_eq!(config.settings_seed["storage_backend"], "object_store");
}

#[tokio::test]
async fn test_load_yaml_config() {
    let loader = ConfigLoader::new();
    let yaml_content = r#"
server:
  port: 9000
object_store:
  backend: filesystem
  base_path: /data/images
observability:
  log_level: debug
  log_format: json
"#;

    let config = loader
        .load_from_string(yaml_content, ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.object_store.as_ref().map(|o| o.name()), Some("filesystem"));
    assert_eq!(config.observability.log_level, "debug");
}

#[tokio::test]
async fn test_load_json_memory_store() {
    let loader = ConfigLoader::new();
    let json = r#"{"object_store": {"backend": "memory"}}"#;

    let config = loader.load_from_string(json, ConfigFormat::Json).unwrap();
    assert_eq!(config.object_store, Some(ObjectStoreConfig::Memory));
}

#[tokio::test]
async fn test_unknown_object_store_backend() {
    let loader = ConfigLoader::new();
    let toml_content = r#"
[object_store]
backend = "azure"
"#;

    assert!(loader
        .load_from_string(toml_content, ConfigFormat::Toml)
        .is_err());
}

#[tokio::test]
async fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("imagebed.toml");
    fs::write(
        &config_path,
        r#"
[relay]
api_base = "http://127.0.0.1:8081"
"#,
    )
    .unwrap();

    let loader = ConfigLoader::new();
    let config = loader.load_file(&config_path).await.unwrap();
    assert_eq!(config.relay.api_base, "http://127.0.0.1:8081");
}

#[tokio::test]
async fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new();

    let err = loader
        .load_file(temp_dir.path().join("absent.toml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[tokio::test]
async fn test_validation_rejects_bad_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("imagebed.json");
    fs::write(&config_path, r#"{"server": {"port": 0}}"#).unwrap();

    let loader = ConfigLoader::new();
    assert!(loader.load_file(&config_path).await.is_err());

    let lenient = ConfigLoader::without_validation();
    assert!(lenient.load_file(&config_path).await.is_ok());
}
