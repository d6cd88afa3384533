// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Client side of the daemon socket.

use std::path::Path;

use futures::{SinkExt, StreamExt};
use sqlbridge_protocol::{MethodCall, MethodResponse, ProtocolError, Value};
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LinesCodec};

use crate::error::{DaemonError, IoContext};
use crate::server::connection::MAX_LINE_LENGTH;

/// One connection to a running daemon. Calls are answered in order.
pub struct DaemonClient {
    framed: Framed<UnixStream, LinesCodec>,
}

impl DaemonClient {
    pub async fn connect(socket_path: &Path) -> Result<Self, DaemonError> {
        let stream = UnixStream::connect(socket_path).await.io_context(|| {
            format!("Failed to connect to daemon at {}", socket_path.display())
        })?;
        Ok(Self {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
        })
    }

    pub async fn call(
        &mut self,
        method: &str,
        arguments: impl Into<Value>,
    ) -> Result<MethodResponse, DaemonError> {
        self.send(&MethodCall::new(method, arguments)).await
    }

    pub async fn send(&mut self, call: &MethodCall) -> Result<MethodResponse, DaemonError> {
        let line = serde_json::to_string(call).map_err(ProtocolError::from)?;
        self.framed.send(line).await?;

        let reply = self
            .framed
            .next()
            .await
            .ok_or(DaemonError::ConnectionClosed)??;
        Ok(serde_json::from_str(&reply).map_err(ProtocolError::from)?)
    }
}
