//! Authentication handshake.
//!
//! Before a socket is trusted the hub reads exactly one data frame, which must
//! be an `auth` envelope with a valid token. Any failure, including silence
//! past the deadline, is fatal: a best-effort `error` envelope is written and
//! the socket is closed without the connection ever being registered.

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use tokio::time::{timeout, Duration};

use pixio_core::error::{PixioError, Result};
use pixio_core::protocol::{self, messages::WsError, MessageType};

use crate::realtime::Hub;
use crate::transport::codec::{classify, Inbound};

/// Upper bound for writing the rejection before giving up on the socket.
const REJECT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait for the `auth` frame and return the authenticated user id.
pub async fn await_auth(
    hub: &Hub,
    socket: &mut WebSocket,
    expected_user: Option<&str>,
    limit: Duration,
) -> Result<String> {
    let frame = timeout(limit, first_frame(socket))
        .await
        .map_err(|_| PixioError::HandshakeTimeout)??;
    hub.authenticate(&frame, expected_user)
}

async fn first_frame(socket: &mut WebSocket) -> Result<Bytes> {
    loop {
        let msg = socket
            .recv()
            .await
            .ok_or_else(|| PixioError::Transport("closed before auth".into()))?
            .map_err(|e| PixioError::Transport(format!("recv failed: {e}")))?;

        match classify(msg) {
            Inbound::Frame(b) => return Ok(b),
            Inbound::Text(_) => {
                return Err(PixioError::UnexpectedMessageType {
                    expected: MessageType::Auth.as_str().to_string(),
                    found: "text frame".into(),
                })
            }
            Inbound::Ping | Inbound::Pong => continue,
            Inbound::Close => return Err(PixioError::Transport("closed before auth".into())),
        }
    }
}

/// Best-effort `error` envelope followed by a close frame.
pub async fn reject(mut socket: WebSocket, err: &PixioError) {
    let payload = WsError {
        message: err.error_code().as_str().to_string(),
        request_type: String::new(),
    };
    match protocol::encode(MessageType::Error, &payload) {
        Ok(frame) => {
            let _ = timeout(REJECT_WRITE_TIMEOUT, socket.send(Message::Binary(frame.to_vec()))).await;
        }
        Err(e) => tracing::error!(error = %e, "encode handshake rejection failed"),
    }
    let _ = timeout(REJECT_WRITE_TIMEOUT, socket.send(Message::Close(None))).await;
}
