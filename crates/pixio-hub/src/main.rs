//! pixio hub server.
//!
//! - WebSocket endpoints: /ws and /ws/:id
//! - Auth handshake on the first frame, then join/leave/cursor traffic
//! - Config from $PIXIO_CONFIG (default `pixio.yaml`)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use pixio_core::error::{PixioError, Result};
use pixio_hub::access::{JwtTokenValidator, MemoryCanvasStore, ZlibPixelCodec};
use pixio_hub::{app_state::AppState, config, router};

const DEFAULT_CONFIG_PATH: &str = "pixio.yaml";
const SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "pixio-hub failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("PIXIO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .hub
        .listen
        .parse()
        .map_err(|e| PixioError::InvalidConfig(format!("hub.listen must be a valid SocketAddr: {e}")))?;

    let secret = match cfg.auth.access_token_secret.clone() {
        Some(s) => s,
        None => std::env::var(SECRET_ENV).map_err(|_| {
            PixioError::InvalidConfig(format!("auth.access_token_secret or ${SECRET_ENV} must be set"))
        })?,
    };
    let tokens = JwtTokenValidator::new(&secret)?;

    let codec = ZlibPixelCodec::new();
    let store = MemoryCanvasStore::from_seed(&cfg.seed, &codec)?;
    tracing::info!(canvases = cfg.seed.canvases.len(), "canvas store seeded");

    let state = AppState::new(&cfg, Arc::new(store), Arc::new(tokens), Arc::new(codec));
    let hub = state.hub();
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| PixioError::Transport(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, config = %path, "pixio-hub starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl-c handler failed");
            }
            hub.shutdown().await;
        })
        .await
        .map_err(|e| PixioError::Transport(format!("server failed: {e}")))?;

    tracing::info!("pixio-hub stopped");
    Ok(())
}
