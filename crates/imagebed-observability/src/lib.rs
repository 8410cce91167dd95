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
//! Structured logging for imagebed
//!
//! Wraps `tracing-subscriber` setup behind a small builder so the server
//! binary can switch between human-readable and JSON output from config.
//!
//! # Example
//!
//! ```ignore
//! use imagebed_observability::{init_tracing_with_config, LogConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LogConfig::from_settings("info", "json").unwrap();
//!     init_tracing_with_config(config).unwrap();
//!
//!     tracing::info!("Gateway started");
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput, NOISY_TARGETS};
pub use initialization::{init_tracing, init_tracing_with_config};
