use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /healthz
/// Liveness of the dashboard itself; does not call the backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "margin-hunter-dashboard",
        "api_base_url": state.config.api_base_url,
    }))
}
