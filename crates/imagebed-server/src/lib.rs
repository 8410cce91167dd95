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
// Library exports for imagebed-server
// This allows integration tests to use server components

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/image/{identifier}", get(handlers::get_image))
        // Public gallery
        .route("/api/public/images", get(handlers::list_public_images))
        // External API
        .route("/api/external/upload", post(handlers::external_upload))
        .route("/api/external/edit", post(handlers::external_edit))
        // Admin API
        .route("/api/admin/images", get(handlers::list_admin_images))
        .route("/api/admin/upload", post(handlers::admin_upload))
        .route("/api/admin/delete", post(handlers::admin_delete))
        .route(
            "/api/admin/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
