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
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagebed_gateway::GatewayError;
use serde_json::json;

/// Handler error rendered as `{"error": ..., "kind": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by the gateway
    Gateway(GatewayError),

    /// Malformed or oversized multipart body
    Multipart(MultipartError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Gateway(err) => (
                StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.kind(),
                err.to_string(),
            ),
            ApiError::Multipart(err) => (err.status(), "invalid_request", err.body_text()),
        };

        if status.is_server_error() {
            tracing::error!(kind, "Request failed: {}", message);
        } else {
            tracing::debug!(kind, "Request rejected: {}", message);
        }

        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}
