// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Unix socket server.
//!
//! Each connection carries newline-delimited JSON: one [`MethodCall`] per
//! line in, one [`MethodResponse`] per line out, in request order.

pub mod connection;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use sqlbridge_protocol::{MethodCall, MethodResponse};
use tokio::net::UnixListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{DaemonError, IoContext};

/// Answers decoded method calls.
pub trait MethodHandler: Send + Sync {
    fn handle(&self, call: MethodCall) -> impl Future<Output = MethodResponse> + Send;
}

pub struct DaemonServer<H: MethodHandler> {
    handler: H,
    socket_path: PathBuf,
    connection_handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<H: MethodHandler + Clone + 'static> DaemonServer<H> {
    pub fn new(handler: H, socket_path: PathBuf) -> Self {
        Self {
            handler,
            socket_path,
            connection_handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn serve(&self) -> Result<(), DaemonError> {
        let listener = UnixListener::bind(&self.socket_path).io_context(|| {
            format!("Failed to bind to socket path: {}", self.socket_path.display())
        })?;
        debug!("Listening on {}", self.socket_path.display());

        loop {
            let (stream, _) = listener
                .accept()
                .await
                .io_context(|| "Failed to accept connection".to_string())?;
            let handler = self.handler.clone();

            let handle = tokio::spawn(async move {
                if let Err(e) = connection::handle_connection(stream, handler).await {
                    error!("Connection error: {e}");
                }
            });

            let mut handles = self.connection_handles.lock().await;
            handles.push(handle);
            handles.retain(|h| !h.is_finished());
        }
    }

    /// Shutdown all active connections
    pub async fn shutdown(&self) {
        let handles = self.connection_handles.lock().await;
        for handle in handles.iter() {
            handle.abort();
        }
    }
}
