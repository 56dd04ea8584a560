// routes/mod.rs
// Route handlers and router wiring.

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod health;
pub mod ws;

pub use health::health;
pub use ws::ws_handler;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}
