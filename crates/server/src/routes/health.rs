use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use decoupage::EntityKind;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Health check endpoint (liveness)
///
/// Reports the sizes of the snapshot currently being served.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let engine = state.engine.current();

    Json(json!({
        "status": "healthy",
        "service": "decoupage-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "dataset": {
            "regions": engine.len(EntityKind::Region),
            "departements": engine.len(EntityKind::Departement),
            "communes": engine.len(EntityKind::Commune),
        }
    }))
}
