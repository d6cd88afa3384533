// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use futures::{SinkExt, StreamExt};
use sqlbridge_protocol::names::error_code;
use sqlbridge_protocol::{MethodCall, MethodError, MethodResponse, ProtocolError};
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, trace};

use crate::error::DaemonError;
use crate::server::MethodHandler;

/// Upper bound on one request line.
pub const MAX_LINE_LENGTH: usize = 64 * 1024 * 1024;

pub async fn handle_connection<H: MethodHandler>(
    stream: UnixStream,
    handler: H,
) -> Result<(), DaemonError> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    while let Some(line) = framed.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        trace!("request: {line}");

        let response = match serde_json::from_str::<MethodCall>(&line) {
            Ok(call) => handler.handle(call).await,
            Err(e) => {
                debug!("Rejecting malformed request: {e}");
                MethodResponse::Error(MethodError::new(
                    error_code::INVALID_REQUEST,
                    format!("malformed request: {e}"),
                ))
            }
        };

        let encoded = serde_json::to_string(&response).map_err(ProtocolError::from)?;
        trace!("response: {encoded}");
        framed.send(encoded).await?;
    }

    debug!("Client disconnected");
    Ok(())
}
