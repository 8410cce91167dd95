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
use axum::{
    body::Body,
    extract::{FromRequestParts, Multipart, Path, State},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use imagebed_gateway::{
    AdminImage, GatewayError, PublicImage, UploadOutcome, UploadSource, CACHE_CONTROL,
    CONTENT_DISPOSITION,
};
use imagebed_metadata::{ImageUpdate, SettingsMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Scheme and authority the request arrived on, e.g. `http://localhost:8080`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl<S: Send + Sync> FromRequestParts<S> for RequestOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");

        Ok(RequestOrigin(format!("{}://{}", scheme, host)))
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_id: String,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        UploadResponse {
            success: true,
            url: outcome.url,
            file_id: outcome.file_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub file_id: String,
    pub filename: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: i64,
}

/// GET / - Liveness probe and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "Image Bed API is running smoothly.",
        "endpoints": {
            "public_gallery": "/api/public/images",
            "admin_api": "/api/admin/*",
            "external_api": "/api/external/*",
        }
    }))
}

/// GET /image/{identifier} - Stream an image through its owning backend
pub async fn get_image(
    Path(identifier): Path<String>,
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
) -> ApiResult<Response> {
    let ctx = state.gateway.context(&origin).await?;
    let image = state.gateway.resolve(&ctx, &identifier).await?;

    let content_type = HeaderValue::from_str(&image.content_type).unwrap_or_else(|_| {
        tracing::warn!("Unusable content type {:?} for {}", image.content_type, identifier);
        HeaderValue::from_static(imagebed_storage::media::DEFAULT_CONTENT_TYPE)
    });

    let mut response = Body::from_stream(image.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static(CONTENT_DISPOSITION));
    if let Some(length) = image.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// GET /api/public/images - Gallery listing, newest first
pub async fn list_public_images(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
) -> ApiResult<Json<Vec<PublicImage>>> {
    let ctx = state.gateway.context(&origin).await?;
    Ok(Json(state.gateway.list_public(&ctx).await?))
}

/// POST /api/external/upload - Multipart upload from API clients
pub async fn external_upload(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(&state, &origin, multipart, UploadSource::Api).await
}

/// POST /api/admin/upload - Multipart upload from the admin console
pub async fn admin_upload(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(&state, &origin, multipart, UploadSource::Admin).await
}

async fn upload(
    state: &AppState,
    origin: &str,
    multipart: Multipart,
    source: UploadSource,
) -> ApiResult<Json<UploadResponse>> {
    let (data, filename) = read_file_field(multipart).await?;
    tracing::info!(
        "{} of {:?} ({} bytes)",
        source.label(),
        filename.as_deref().unwrap_or(source.default_filename()),
        data.len()
    );

    let ctx = state.gateway.context(origin).await?;
    let outcome = state
        .gateway
        .handle_upload(&ctx, data, filename.as_deref(), source)
        .await?;
    Ok(Json(outcome.into()))
}

/// Pull the `file` part out of a multipart body
async fn read_file_field(mut multipart: Multipart) -> ApiResult<(Bytes, Option<String>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            return Ok((data, filename));
        }
    }

    Err(GatewayError::invalid_request("multipart field 'file' is missing").into())
}

/// POST /api/external/edit - Rename or re-describe an image
pub async fn external_edit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EditRequest>,
) -> ApiResult<Json<Value>> {
    let update = ImageUpdate {
        filename: request.filename,
        description: request.description,
    };
    state.gateway.edit(&request.file_id, update).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/admin/images - Full records with links
pub async fn list_admin_images(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
) -> ApiResult<Json<Vec<AdminImage>>> {
    let ctx = state.gateway.context(&origin).await?;
    Ok(Json(state.gateway.list_admin(&ctx).await?))
}

/// POST /api/admin/delete - Best-effort delete by record id
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    let ctx = state.gateway.context(&origin).await?;
    let deleted = state.gateway.delete(&ctx, request.id).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// GET /api/admin/settings - Current settings table
pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SettingsMap>> {
    Ok(Json(state.gateway.settings().await?))
}

/// POST /api/admin/settings - Upsert settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(updates): Json<SettingsMap>,
) -> ApiResult<Json<Value>> {
    state.gateway.update_settings(&updates).await?;
    Ok(Json(json!({ "success": true })))
}
