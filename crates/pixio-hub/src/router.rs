//! Axum router wiring (HTTP -> WS upgrade).
//!
//! `/ws` authenticates by token alone; `/ws/:id` additionally pins the
//! identity the token must carry.

use axum::{routing::get, Router};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/ws/:id", get(transport::ws::ws_upgrade_as))
        .with_state(state)
}
