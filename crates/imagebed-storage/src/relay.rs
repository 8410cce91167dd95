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
//! Bot-relay image backend
//!
//! Uses a Telegram-style bot API as blob storage:
//!
//! - **store**: `sendDocument` to a fixed chat. Images always go up as a
//!   generic document, never as `photo`, so the relay keeps the original
//!   bytes instead of re-encoding them (animated GIFs survive).
//! - **fetch**: two steps, `getFile` resolves the attachment id to a
//!   relative path, then the bytes are streamed from `/file/bot<token>/<path>`.
//! - **delete**: `deleteMessage` on the message that carried the attachment.
//!
//! The relay only populates the result field matching the media type it
//! inferred, so the attachment is taken from the first present field of
//! [`ATTACHMENT_RULES`].

use crate::error::{StorageError, StorageResult};
use crate::retry::{with_idle_timeout, with_retry, with_timeout, UpstreamPolicy};
use crate::{BackendKind, FetchedObject, ImageBackend, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Default bot API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// `deleteMessage` refusals meaning the message itself is already gone.
/// Anything else, such as an unknown chat, is a real failure.
const MESSAGE_GONE: [&str; 2] = ["message to delete not found", "message not found"];

/// Relay credentials and endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// API base URL without trailing slash
    pub api_base: String,

    /// Bot token
    pub bot_token: String,

    /// Destination chat or channel id
    pub chat_id: String,
}

impl RelayConfig {
    /// Config against the public bot API
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        RelayConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,

    /// Payload on success
    pub result: Option<T>,

    /// Error text on failure
    pub description: Option<String>,

    /// Error code on failure
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn failure(&self) -> String {
        match (&self.error_code, &self.description) {
            (Some(code), Some(desc)) => format!("{} ({})", desc, code),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => format!("error code {}", code),
            (None, None) => "no description".to_string(),
        }
    }
}

/// Attachment descriptor inside a sent message
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Handle accepted by `getFile`
    pub file_id: String,
}

/// The subset of a sent message the backend reads
#[derive(Debug, Default, Deserialize)]
pub struct SentMessage {
    /// Message reference used for deletion
    pub message_id: i64,

    /// Generic file attachment
    #[serde(default)]
    pub document: Option<Attachment>,

    /// GIF or silent MP4
    #[serde(default)]
    pub animation: Option<Attachment>,

    /// Video attachment
    #[serde(default)]
    pub video: Option<Attachment>,

    /// Photo sizes, smallest first
    #[serde(default)]
    pub photo: Option<Vec<Attachment>>,
}

/// One way of finding the attachment in a [`SentMessage`]
pub struct AttachmentRule {
    /// Result field the rule reads
    pub field: &'static str,

    /// Extractor
    pub select: fn(&SentMessage) -> Option<&Attachment>,
}

fn select_document(message: &SentMessage) -> Option<&Attachment> {
    message.document.as_ref()
}

fn select_animation(message: &SentMessage) -> Option<&Attachment> {
    message.animation.as_ref()
}

fn select_video(message: &SentMessage) -> Option<&Attachment> {
    message.video.as_ref()
}

fn select_photo(message: &SentMessage) -> Option<&Attachment> {
    message.photo.as_ref().and_then(|sizes| sizes.last())
}

/// Extraction rules in priority order; the first match wins.
pub const ATTACHMENT_RULES: [AttachmentRule; 4] = [
    AttachmentRule {
        field: "document",
        select: select_document,
    },
    AttachmentRule {
        field: "animation",
        select: select_animation,
    },
    AttachmentRule {
        field: "video",
        select: select_video,
    },
    AttachmentRule {
        field: "photo",
        select: select_photo,
    },
];

/// Find the attachment in a sent message.
///
/// Returns the matching field name together with the attachment, or
/// [`StorageError::Upstream`] if no rule matches.
pub fn extract_attachment(message: &SentMessage) -> StorageResult<(&'static str, &Attachment)> {
    ATTACHMENT_RULES
        .iter()
        .find_map(|rule| (rule.select)(message).map(|attachment| (rule.field, attachment)))
        .ok_or_else(|| {
            StorageError::upstream(format!(
                "relay message {} carries no document, animation, video or photo",
                message.message_id
            ))
        })
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest<'a> {
    chat_id: &'a str,
    message_id: i64,
}

/// Image backend backed by a bot relay
#[derive(Clone)]
pub struct RelayBackend {
    http: Client,
    config: RelayConfig,
    policy: UpstreamPolicy,
}

impl RelayBackend {
    /// Create a relay backend sharing `http` with the rest of the process
    pub fn new(http: Client, config: RelayConfig, policy: UpstreamPolicy) -> StorageResult<Self> {
        if config.bot_token.is_empty() {
            return Err(StorageError::config("relay bot token is empty"));
        }
        if config.chat_id.is_empty() {
            return Err(StorageError::config("relay chat id is empty"));
        }
        Ok(RelayBackend {
            http,
            config,
            policy,
        })
    }

    /// Decode a bot API envelope, whatever the HTTP status.
    async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> StorageResult<ApiResponse<T>> {
        let status = response.status();
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            if status.is_server_error() {
                StorageError::transient(format!("{} returned {}", method, status))
            } else {
                StorageError::upstream(format!(
                    "{} returned {} with an unreadable body: {}",
                    method, status, e
                ))
            }
        })
    }

    /// Resolve an attachment id to the relay's relative file path
    async fn resolve_file_path(&self, file_id: &str) -> StorageResult<String> {
        let response = self
            .http
            .get(self.config.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?;
        let envelope: ApiResponse<RemoteFile> = Self::decode("getFile", response).await?;

        if !envelope.ok {
            return Err(StorageError::not_found(format!(
                "{}: {}",
                file_id,
                envelope.failure()
            )));
        }

        envelope
            .result
            .and_then(|file| file.file_path)
            .ok_or_else(|| StorageError::not_found(format!("{}: relay returned no file path", file_id)))
    }

    async fn open(&self, file_id: &str) -> StorageResult<FetchedObject> {
        let file_path = self.resolve_file_path(file_id).await?;
        debug!(file_id, file_path = %file_path, "Resolved relay file path");

        let response = self.http.get(self.config.file_url(&file_path)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::not_found(file_id)),
            status if status.is_server_error() => {
                return Err(StorageError::transient(format!("file download returned {}", status)))
            }
            status if !status.is_success() => {
                return Err(StorageError::upstream(format!("file download returned {}", status)))
            }
            _ => {}
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        let body = response.bytes_stream().map_err(StorageError::from).boxed();
        Ok(FetchedObject {
            body: with_idle_timeout(body, self.policy.timeout, "relay file download"),
            content_type,
            content_length,
        })
    }

    async fn send_document(&self, data: Bytes, filename: &str) -> StorageResult<SentMessage> {
        let size = data.len() as u64;
        let part = Part::stream_with_length(data, size).file_name(filename.to_string());
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("document", part);

        let response = self
            .http
            .post(self.config.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiResponse<SentMessage> = Self::decode("sendDocument", response).await?;

        if !envelope.ok {
            return Err(StorageError::upstream(format!(
                "sendDocument rejected: {}",
                envelope.failure()
            )));
        }
        envelope
            .result
            .ok_or_else(|| StorageError::upstream("sendDocument returned ok without a message"))
    }

    async fn delete_message(&self, message_id: i64) -> StorageResult<()> {
        let response = self
            .http
            .post(self.config.method_url("deleteMessage"))
            .json(&DeleteMessageRequest {
                chat_id: &self.config.chat_id,
                message_id,
            })
            .send()
            .await?;
        let envelope: ApiResponse<bool> = Self::decode("deleteMessage", response).await?;

        if envelope.ok {
            return Ok(());
        }

        let failure = envelope.failure();
        let lowered = failure.to_ascii_lowercase();
        if MESSAGE_GONE.iter().any(|text| lowered.contains(text)) {
            warn!(message_id, "Relay message already gone: {}", failure);
            Ok(())
        } else {
            Err(StorageError::upstream(format!("deleteMessage rejected: {}", failure)))
        }
    }
}

impl fmt::Debug for RelayBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayBackend")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl ImageBackend for RelayBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relay
    }

    async fn store(&self, data: Bytes, filename: &str) -> StorageResult<StoredObject> {
        let size = data.len();
        let message = with_timeout(
            &self.policy,
            "relay sendDocument",
            self.send_document(data, filename),
        )
        .await?;

        let (field, attachment) = extract_attachment(&message)?;
        info!(
            message_id = message.message_id,
            field,
            size,
            filename,
            "Stored image on relay"
        );

        Ok(StoredObject {
            storage_key: attachment.file_id.clone(),
            backend: BackendKind::Relay,
            relay_message_id: Some(message.message_id),
        })
    }

    async fn fetch(&self, storage_key: &str) -> StorageResult<FetchedObject> {
        if storage_key.is_empty() {
            return Err(StorageError::invalid_key("key cannot be empty"));
        }
        with_retry(&self.policy, "relay fetch", || self.open(storage_key)).await
    }

    async fn delete(&self, object: &StoredObject) -> StorageResult<()> {
        let Some(message_id) = object.relay_message_id else {
            warn!(
                key = %object.storage_key,
                "Relay record has no message reference, nothing to retract"
            );
            return Ok(());
        };

        with_retry(&self.policy, "relay deleteMessage", || self.delete_message(message_id)).await?;
        info!(message_id, "Retracted relay message");
        Ok(())
    }
}
