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
use anyhow::{Context, Result};
use clap::Parser;
use imagebed_config::ConfigLoader;
use imagebed_observability::{init_tracing_with_config, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;

use imagebed_server::config::build_state;
use imagebed_server::create_router;

/// Image hosting gateway
#[derive(Parser, Debug)]
#[command(name = "imagebed-server", version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON); defaults to ./imagebed.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = ConfigLoader::new()
        .load_with_overrides(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Setup tracing
    let log_config = LogConfig::from_settings(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;
    init_tracing_with_config(log_config)?;

    tracing::debug!("Server configuration: {:?}", config.server);

    // Setup shared state
    let state = Arc::new(build_state(&config).await?);

    // Build router using library function
    let app = create_router(state);

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("imagebed listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
