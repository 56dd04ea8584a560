// routes/health.rs
// GET /health -> { "ok": true, "<collection>": <count>, ... }

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::state::AppState;

pub async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let store = st.store().await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "clients": store.clients.len(),
            "periods": store.periods.len(),
            "consumption": store.consumption.len(),
            "prorations": store.prorations.len(),
            "groups": store.groups.len(),
        })),
    )
}
