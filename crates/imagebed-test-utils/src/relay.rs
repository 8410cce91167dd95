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
//! In-process fake of the bot relay API
//!
//! Serves `sendDocument`, `getFile`, `deleteMessage` and file downloads on an
//! ephemeral localhost port. Uploads whose name ends in `.gif` are reported as
//! an `animation` (the real relay does the same for GIFs), everything else as
//! a `document`. Unknown file ids and message ids answer `ok: false`.
//! `deleteMessage` for any chat other than [`CHAT_ID`] answers
//! `chat not found`.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Bot token the fake accepts
pub const TOKEN: &str = "123456:test-token";

/// Chat id the fake expects
pub const CHAT_ID: &str = "-1001234";

#[derive(Default)]
struct RelayState {
    files: Mutex<HashMap<String, (String, Bytes)>>,
    messages: Mutex<HashMap<i64, String>>,
    next_id: AtomicU32,
    get_file_failures: AtomicU32,
    stall_downloads: AtomicBool,
    reject_uploads: Mutex<Option<String>>,
    last_chat_id: Mutex<Option<String>>,
}

type Shared = Arc<RelayState>;

/// Handle to a running fake relay
#[derive(Clone)]
pub struct FakeRelay {
    base_url: String,
    state: Shared,
}

impl FakeRelay {
    /// Start the fake on `127.0.0.1:0`
    pub async fn spawn() -> Self {
        let state = Shared::default();
        let app = Router::new()
            .route("/{bot}/sendDocument", post(send_document))
            .route("/{bot}/getFile", get(get_file))
            .route("/{bot}/deleteMessage", post(delete_message))
            .route("/file/{bot}/{*path}", get(download))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake relay");
        let addr = listener.local_addr().expect("fake relay address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake relay server");
        });

        FakeRelay {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Base URL to use as the relay API base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Messages currently held by the fake
    pub fn message_count(&self) -> usize {
        self.state.messages.lock().expect("lock").len()
    }

    /// Number of accepted uploads so far
    pub fn upload_count(&self) -> u32 {
        self.state.next_id.load(Ordering::SeqCst)
    }

    /// `chat_id` of the last upload
    pub fn last_chat_id(&self) -> Option<String> {
        self.state.last_chat_id.lock().expect("lock").clone()
    }

    /// Answer the next `times` getFile calls with 502
    pub fn fail_get_file(&self, times: u32) {
        self.state.get_file_failures.store(times, Ordering::SeqCst);
    }

    /// getFile failures still pending
    pub fn pending_get_file_failures(&self) -> u32 {
        self.state.get_file_failures.load(Ordering::SeqCst)
    }

    /// Send download headers and the first half of the body, then hang
    pub fn stall_downloads(&self) {
        self.state.stall_downloads.store(true, Ordering::SeqCst);
    }

    /// Refuse every upload with `description`
    pub fn reject_uploads(&self, description: impl Into<String>) {
        *self.state.reject_uploads.lock().expect("lock") = Some(description.into());
    }
}

async fn send_document(
    State(relay): State<Shared>,
    Path(bot): Path<String>,
    mut multipart: Multipart,
) -> Json<Value> {
    if bot != format!("bot{}", TOKEN) {
        return Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"}));
    }

    let mut document: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        match field.name() {
            Some("chat_id") => {
                let chat_id = field.text().await.expect("chat_id text");
                *relay.last_chat_id.lock().expect("lock") = Some(chat_id);
            }
            Some("document") => {
                let name = field.file_name().unwrap_or("unnamed").to_string();
                document = Some((name, field.bytes().await.expect("document bytes")));
            }
            _ => {}
        }
    }

    if let Some(description) = relay.reject_uploads.lock().expect("lock").clone() {
        return Json(json!({"ok": false, "error_code": 400, "description": description}));
    }

    let Some((name, data)) = document else {
        return Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: there is no document in the request"
        }));
    };

    let n = relay.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let message_id = i64::from(n) + 100;
    let file_id = format!("FILE-{}", n);
    relay
        .files
        .lock()
        .expect("lock")
        .insert(file_id.clone(), (format!("documents/file_{}_{}", n, name), data));
    relay
        .messages
        .lock()
        .expect("lock")
        .insert(message_id, file_id.clone());

    let descriptor = json!({"file_id": file_id, "file_unique_id": format!("U{}", n)});
    let result = if name.ends_with(".gif") {
        json!({"message_id": message_id, "animation": descriptor})
    } else {
        json!({"message_id": message_id, "document": descriptor})
    };
    Json(json!({"ok": true, "result": result}))
}

async fn get_file(
    State(relay): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if relay
        .get_file_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
    {
        return StatusCode::BAD_GATEWAY.into_response();
    }

    let file_id = params.get("file_id").cloned().unwrap_or_default();
    let path = relay
        .files
        .lock()
        .expect("lock")
        .get(&file_id)
        .map(|(path, _)| path.clone());

    match path {
        Some(path) => {
            Json(json!({"ok": true, "result": {"file_id": file_id, "file_path": path}})).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: invalid file_id"})),
        )
            .into_response(),
    }
}

async fn download(
    State(relay): State<Shared>,
    Path((_bot, path)): Path<(String, String)>,
) -> Response {
    let data = relay
        .files
        .lock()
        .expect("lock")
        .values()
        .find(|(file_path, _)| *file_path == path)
        .map(|(_, data)| data.clone());

    match data {
        Some(data) if relay.stall_downloads.load(Ordering::SeqCst) => {
            let head = data.slice(..data.len() / 2);
            let body = stream::once(async move { Ok::<_, std::io::Error>(head) }).chain(stream::pending());
            ([(header::CONTENT_TYPE, "application/octet-stream")], Body::from_stream(body)).into_response()
        }
        Some(data) => ([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_message(State(relay): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    if body["chat_id"] != CHAT_ID {
        return Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}));
    }
    let message_id = body["message_id"].as_i64().unwrap_or_default();

    let removed = relay.messages.lock().expect("lock").remove(&message_id);
    match removed {
        Some(file_id) => {
            relay.files.lock().expect("lock").remove(&file_id);
            Json(json!({"ok": true, "result": true}))
        }
        None => Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message to delete not found"
        })),
    }
}
