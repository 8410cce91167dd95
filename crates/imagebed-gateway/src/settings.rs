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
//! Request-scoped gateway settings
//!
//! Settings live in the metadata store and are read at the start of every
//! request. Nothing here falls back to a default: a key the current
//! operation needs but cannot find is a [`GatewayError::Config`].

use crate::error::{GatewayError, GatewayResult};
use imagebed_metadata::SettingsMap;
use imagebed_storage::BackendKind;

/// Backend selector for new uploads
pub const STORAGE_BACKEND: &str = "storage_backend";

/// Relay bot token
pub const RELAY_BOT_TOKEN: &str = "tg_bot_token";

/// Relay destination chat
pub const RELAY_CHAT_ID: &str = "tg_chat_id";

/// Externally visible origin used in generated URLs
pub const PUBLIC_BASE_URL: &str = "public_base_url";

/// Relay credentials resolved from settings
#[derive(Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for RelayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Snapshot of the settings table for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewaySettings {
    values: SettingsMap,
}

impl GatewaySettings {
    pub fn from_map(values: SettingsMap) -> Self {
        GatewaySettings { values }
    }

    /// Trimmed, non-empty value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Backend new uploads go to.
    pub fn selected_backend(&self) -> GatewayResult<BackendKind> {
        let raw = self
            .get(STORAGE_BACKEND)
            .ok_or_else(|| GatewayError::config(format!("setting '{}' is not set", STORAGE_BACKEND)))?;
        raw.parse::<BackendKind>().map_err(GatewayError::from)
    }

    /// Relay credentials, independent of the backend selector so that
    /// relay-held records stay reachable after switching uploads elsewhere.
    pub fn relay_credentials(&self) -> GatewayResult<RelayCredentials> {
        let bot_token = self
            .get(RELAY_BOT_TOKEN)
            .ok_or_else(|| GatewayError::config(format!("setting '{}' is not set", RELAY_BOT_TOKEN)))?;
        let chat_id = self
            .get(RELAY_CHAT_ID)
            .ok_or_else(|| GatewayError::config(format!("setting '{}' is not set", RELAY_CHAT_ID)))?;

        Ok(RelayCredentials {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Origin for generated URLs: `public_base_url` when set, otherwise the
    /// origin the request arrived on.
    pub fn origin(&self, request_origin: &str) -> String {
        self.get(PUBLIC_BASE_URL)
            .unwrap_or(request_origin)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Reject settings updates that would make the selector unusable.
pub fn validate_update(update: &SettingsMap) -> GatewayResult<()> {
    if let Some(value) = update.get(STORAGE_BACKEND).map(|v| v.trim()) {
        if !value.is_empty() {
            value.parse::<BackendKind>().map_err(|e| GatewayError::invalid_request(e.to_string()))?;
        }
    }

    if let Some(key) = update.keys().find(|key| key.trim().is_empty()) {
        return Err(GatewayError::invalid_request(format!(
            "setting key '{}' is empty",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> GatewaySettings {
        GatewaySettings::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_selected_backend() {
        assert_eq!(
            settings(&[(STORAGE_BACKEND, "telegram")]).selected_backend().unwrap(),
            BackendKind::Relay
        );
        assert_eq!(
            settings(&[(STORAGE_BACKEND, " r2 ")]).selected_backend().unwrap(),
            BackendKind::ObjectStore
        );
    }

    #[test]
    fn test_missing_selector_is_config_error() {
        assert!(matches!(
            settings(&[]).selected_backend(),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            settings(&[(STORAGE_BACKEND, "  ")]).selected_backend(),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            settings(&[(STORAGE_BACKEND, "floppy")]).selected_backend(),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_relay_credentials_need_both_keys() {
        let creds = settings(&[(RELAY_BOT_TOKEN, "t"), (RELAY_CHAT_ID, "-1")])
            .relay_credentials()
            .unwrap();
        assert_eq!(creds.bot_token, "t");
        assert_eq!(creds.chat_id, "-1");

        assert!(matches!(
            settings(&[(RELAY_BOT_TOKEN, "t")]).relay_credentials(),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = RelayCredentials {
            bot_token: "secret".into(),
            chat_id: "-1".into(),
        };
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn test_origin_prefers_public_base_url() {
        assert_eq!(settings(&[]).origin("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(
            settings(&[(PUBLIC_BASE_URL, "https://img.example.com/")]).origin("http://localhost:8080"),
            "https://img.example.com"
        );
    }

    #[test]
    fn test_validate_update() {
        let ok: SettingsMap = [(STORAGE_BACKEND.to_string(), "object_store".to_string())].into();
        assert!(validate_update(&ok).is_ok());

        let cleared: SettingsMap = [(STORAGE_BACKEND.to_string(), String::new())].into();
        assert!(validate_update(&cleared).is_ok());

        let bad: SettingsMap = [(STORAGE_BACKEND.to_string(), "floppy".to_string())].into();
        assert!(matches!(validate_update(&bad), Err(GatewayError::InvalidRequest(_))));

        let blank_key: SettingsMap = [(" ".to_string(), "x".to_string())].into();
        assert!(matches!(validate_update(&blank_key), Err(GatewayError::InvalidRequest(_))));
    }
}
