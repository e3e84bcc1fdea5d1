//! WebSocket session handling.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (origin checked before the upgrade)
//! - Auth handshake on the first frame
//! - Writer task: drains the connection's outbound queue, pings, enforces the
//!   write deadline
//! - Reader loop: idle timeout, binary frames -> `Hub::dispatch`
//! - Teardown through `Hub::remove_connection`

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration, Instant, MissedTickBehavior};
use tracing::Instrument;

use pixio_core::error::{PixioError, Result};

use crate::app_state::AppState;
use crate::config::HubSection;
use crate::realtime::{Connection, Hub};
use crate::transport::codec::{classify, Inbound};
use crate::transport::handshake;

/// Per-session timers, derived from `hub.*` config.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub handshake_timeout: Duration,
    pub write_timeout: Duration,
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
}

impl SessionTimings {
    pub fn from_config(hub: &HubSection) -> Self {
        Self {
            handshake_timeout: Duration::from_millis(hub.handshake_timeout_ms),
            write_timeout: Duration::from_millis(hub.write_timeout_ms),
            ping_interval: Duration::from_millis(hub.ping_interval_ms),
            idle_timeout: Duration::from_millis(hub.idle_timeout_ms),
        }
    }
}

// --------------------
// Entry
// --------------------

/// `GET /ws`: identity comes from the token alone.
pub async fn ws_upgrade(
    State(app): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    upgrade(app, None, &headers, ws)
}

/// `GET /ws/:id`: the token must belong to `id`.
pub async fn ws_upgrade_as(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    upgrade(app, Some(user_id), &headers, ws)
}

fn upgrade(
    app: AppState,
    expected_user: Option<String>,
    headers: &HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if !app.origin_policy().allows(origin) {
        tracing::warn!(origin = ?origin, "upgrade refused: origin not allowed");
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    ws.on_upgrade(move |socket| run_session(app, expected_user, socket))
}

// --------------------
// Session
// --------------------

async fn run_session(app: AppState, expected_user: Option<String>, mut socket: WebSocket) {
    let hub = app.hub();
    let timings = app.timings();

    let user_id = match handshake::await_auth(
        &hub,
        &mut socket,
        expected_user.as_deref(),
        timings.handshake_timeout,
    )
    .await
    {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::info!(error = %e, code = e.error_code().as_str(), "handshake rejected");
            handshake::reject(socket, &e).await;
            return;
        }
    };

    let (conn, rx) = hub.open_connection(&user_id).await;
    let span = tracing::info_span!(
        "session",
        user_id = %conn.user_id(),
        connection_id = %conn.connection_id()
    );
    serve_connection(hub, conn, rx, socket, timings)
        .instrument(span)
        .await;
}

async fn serve_connection(
    hub: Arc<Hub>,
    conn: Arc<Connection>,
    rx: mpsc::Receiver<Bytes>,
    socket: WebSocket,
    timings: SessionTimings,
) {
    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(
        write_loop(ws_tx, rx, timings.write_timeout, timings.ping_interval)
            .instrument(tracing::Span::current()),
    );

    let writer_finished = read_loop(&hub, &conn, ws_rx, &mut writer, timings.idle_timeout).await;

    hub.remove_connection(&conn).await;

    // The queue is closed now; the writer flushes what is left and sends Close.
    if !writer_finished {
        let grace = timings.write_timeout + timings.write_timeout;
        match timeout(grace, &mut writer).await {
            Ok(_) => {}
            Err(_) => {
                tracing::debug!("writer did not finish in time, aborting");
                writer.abort();
            }
        }
    }
}

/// Returns true if the loop ended because the writer task finished.
async fn read_loop(
    hub: &Hub,
    conn: &Arc<Connection>,
    mut ws_rx: SplitStream<WebSocket>,
    writer: &mut tokio::task::JoinHandle<Result<()>>,
    idle_timeout: Duration,
) -> bool {
    loop {
        tokio::select! {
            res = &mut *writer => {
                match res {
                    Ok(Ok(())) => tracing::debug!("writer finished"),
                    Ok(Err(e)) => tracing::warn!(error = %e, "writer failed"),
                    Err(e) => tracing::error!(error = %e, "writer task panicked"),
                }
                return true;
            }

            incoming = timeout(idle_timeout, ws_rx.next()) => {
                let msg = match incoming {
                    Err(_) => {
                        tracing::info!(idle_ms = idle_timeout.as_millis() as u64, "idle timeout");
                        return false;
                    }
                    Ok(None) => return false,
                    Ok(Some(Err(e))) => {
                        tracing::debug!(error = %e, "recv failed");
                        return false;
                    }
                    Ok(Some(Ok(msg))) => msg,
                };

                match classify(msg) {
                    Inbound::Frame(frame) => hub.dispatch(conn, &frame).await,
                    Inbound::Text(len) => tracing::debug!(len, "text frame ignored"),
                    Inbound::Ping | Inbound::Pong => {}
                    Inbound::Close => return false,
                }
            }
        }
    }
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Bytes>,
    write_timeout: Duration,
    ping_every: Duration,
) -> Result<()> {
    let mut ping_tick = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            out = rx.recv() => match out {
                Some(frame) => send_with_deadline(&mut ws_tx, Message::Binary(frame.to_vec()), write_timeout).await?,
                None => break,
            },
            _ = ping_tick.tick() => {
                send_with_deadline(&mut ws_tx, Message::Ping(Vec::new()), write_timeout).await?;
            }
        }
    }

    // Queue closed by teardown or shutdown.
    let _ = send_with_deadline(&mut ws_tx, Message::Close(None), write_timeout).await;
    Ok(())
}

async fn send_with_deadline(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    msg: Message,
    deadline: Duration,
) -> Result<()> {
    match timeout(deadline, ws_tx.send(msg)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(PixioError::Transport(format!("send failed: {e}"))),
        Err(_) => Err(PixioError::Transport("write deadline exceeded".into())),
    }
}
