use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::debug;

use crate::AppState;

pub async fn ping_handler() -> Json<Value> {
    debug!("Ping endpoint called");
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let fanout = state.fanout();
    let subscriptions = fanout.subscriptions();

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "registry": {
                "incidents": fanout.registry().len(),
            },
            "subscriptions": {
                "watched_incidents": subscriptions.watched_incidents(),
                "watchers": subscriptions.total_watchers(),
            }
        }
    }))
}
