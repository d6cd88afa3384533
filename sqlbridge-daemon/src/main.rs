// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use prometheus::{Encoder, TextEncoder};
use sqlbridge_daemon::config::Config;
use sqlbridge_daemon::error::{DaemonError, IoContext};
use sqlbridge_daemon::handler::DatabaseHandler;
use sqlbridge_daemon::metrics::DispatchMetrics;
use sqlbridge_daemon::permission::StaticPermissions;
use sqlbridge_daemon::server::DaemonServer;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let config = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| DaemonError::config(format!("invalid log_level: {e}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting sqlbridge-daemon");
    info!("Socket path: {}", config.socket_path.display());
    info!("Databases path: {}", config.databases_path.display());
    info!("Storage access: {:?}", config.storage_access);

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(DispatchMetrics::new("sqlbridge", &registry)?);

    let handler = DatabaseHandler::new(StaticPermissions(config.storage_access), &config)
        .with_metrics(metrics);

    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent).io_context(|| {
            format!("Failed to create socket directory {}", parent.display())
        })?;
    }
    let server = DaemonServer::new(handler, config.socket_path.clone());

    let shutdown = shutdown_signal();

    tokio::select! {
        result = server.serve() => {
            if let Err(e) = result {
                error!("Server error: {e}");
                return Err(e);
            }
        }
        _ = shutdown => {
            info!("Received shutdown signal");
        }
    }
    server.shutdown().await;

    // Clean up: remove socket file
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path).io_context(|| {
            format!(
                "Failed to remove socket file at {}",
                config.socket_path.display()
            )
        })?;
    }

    let mut buffer = Vec::new();
    if TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .is_ok()
    {
        debug!("Final metrics:\n{}", String::from_utf8_lossy(&buffer));
    }

    info!("sqlbridge-daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
