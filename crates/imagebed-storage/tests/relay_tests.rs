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
//! Integration tests for the relay backend against an in-process fake bot API

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use imagebed_storage::{
    BackendKind, ImageBackend, RelayBackend, RelayConfig, StorageError, StoredObject, UpstreamPolicy,
};
use imagebed_test_utils::{fixtures, FakeRelay, CHAT_ID, TOKEN};
use std::time::Duration;

fn fast_policy() -> UpstreamPolicy {
    UpstreamPolicy {
        timeout: Duration::from_secs(5),
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
    }
}

async fn backend() -> (RelayBackend, FakeRelay) {
    let relay = FakeRelay::spawn().await;
    let config = RelayConfig::new(TOKEN, CHAT_ID).with_api_base(relay.base_url());
    let backend = RelayBackend::new(reqwest::Client::new(), config, fast_policy()).unwrap();
    (backend, relay)
}

#[tokio::test]
async fn test_store_and_fetch_document() {
    let (backend, relay) = backend().await;

    let stored = backend
        .store(Bytes::from_static(fixtures::PNG), "logo.png")
        .await
        .unwrap();

    assert_eq!(stored.backend, BackendKind::Relay);
    assert_eq!(stored.storage_key, "FILE-1");
    assert_eq!(stored.relay_message_id, Some(101));
    assert_eq!(relay.last_chat_id().as_deref(), Some(CHAT_ID));

    let fetched = backend.fetch(&stored.storage_key).await.unwrap();
    assert_eq!(fetched.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(fetched.content_length, Some(fixtures::PNG.len() as u64));
    assert_eq!(fetched.into_bytes().await.unwrap(), Bytes::from_static(fixtures::PNG));
}

#[tokio::test]
async fn test_gif_reported_as_animation_is_still_stored() {
    let (backend, _) = backend().await;

    let stored = backend
        .store(Bytes::from_static(fixtures::GIF), "dance.gif")
        .await
        .unwrap();
    assert_eq!(stored.storage_key, "FILE-1");

    let fetched = backend.fetch(&stored.storage_key).await.unwrap();
    assert_eq!(fetched.into_bytes().await.unwrap(), Bytes::from_static(fixtures::GIF));
}

#[tokio::test]
async fn test_unknown_file_id_is_not_found() {
    let (backend, _) = backend().await;

    let err = backend.fetch("FILE-404").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_fetch_retries_gateway_errors() {
    let (backend, relay) = backend().await;

    let stored = backend.store(Bytes::from_static(b"x"), "x.png").await.unwrap();
    relay.fail_get_file(2);

    let fetched = backend.fetch(&stored.storage_key).await.unwrap();
    assert_eq!(fetched.into_bytes().await.unwrap(), Bytes::from_static(b"x"));
    assert_eq!(relay.pending_get_file_failures(), 0);
}

#[tokio::test]
async fn test_fetch_gives_up_after_retry_budget() {
    let (backend, relay) = backend().await;

    let stored = backend.store(Bytes::from_static(b"x"), "x.png").await.unwrap();
    relay.fail_get_file(10);

    let err = backend.fetch(&stored.storage_key).await.unwrap_err();
    assert!(err.is_transient(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_delete_retracts_message() {
    let (backend, relay) = backend().await;

    let stored = backend.store(Bytes::from_static(b"x"), "x.webp").await.unwrap();
    backend.delete(&stored).await.unwrap();

    assert_eq!(relay.message_count(), 0);
    assert!(backend.fetch(&stored.storage_key).await.unwrap_err().is_not_found());

    // Already gone on the relay side.
    backend.delete(&stored).await.unwrap();
}

#[tokio::test]
async fn test_delete_in_unknown_chat_is_an_error() {
    let relay = FakeRelay::spawn().await;
    let config = RelayConfig::new(TOKEN, "-999").with_api_base(relay.base_url());
    let backend = RelayBackend::new(reqwest::Client::new(), config, fast_policy()).unwrap();

    let stored = backend.store(Bytes::from_static(b"x"), "x.png").await.unwrap();
    let err = backend.delete(&stored).await.unwrap_err();

    assert!(matches!(err, StorageError::Upstream(ref msg) if msg.contains("chat not found")), "unexpected error: {err}");
    assert_eq!(relay.message_count(), 1);
}

#[tokio::test]
async fn test_stalled_download_is_transient() {
    let relay = FakeRelay::spawn().await;
    let config = RelayConfig::new(TOKEN, CHAT_ID).with_api_base(relay.base_url());
    let backend = RelayBackend::new(
        reqwest::Client::new(),
        config,
        UpstreamPolicy::no_retry(Duration::from_millis(200)),
    )
    .unwrap();

    let stored = backend
        .store(Bytes::from_static(fixtures::PNG), "logo.png")
        .await
        .unwrap();
    relay.stall_downloads();

    let fetched = backend.fetch(&stored.storage_key).await.unwrap();
    let err = tokio::time::timeout(Duration::from_secs(5), fetched.into_bytes())
        .await
        .expect("stalled body was never cut off")
        .unwrap_err();
    assert!(err.is_transient(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_delete_without_message_reference_is_noop() {
    let (backend, relay) = backend().await;

    let stored = backend.store(Bytes::from_static(b"x"), "x.png").await.unwrap();
    let legacy = StoredObject {
        relay_message_id: None,
        ..stored.clone()
    };

    backend.delete(&legacy).await.unwrap();
    assert_eq!(relay.message_count(), 1);
}

#[tokio::test]
async fn test_unreachable_relay_is_transient() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = RelayConfig::new(TOKEN, CHAT_ID).with_api_base(format!("http://{}", addr));
    let backend = RelayBackend::new(
        reqwest::Client::new(),
        config,
        UpstreamPolicy::no_retry(Duration::from_secs(2)),
    )
    .unwrap();

    let err = backend.store(Bytes::from_static(b"x"), "x.png").await.unwrap_err();
    assert!(matches!(err, StorageError::Transient(_)), "unexpected error: {err}");
}
