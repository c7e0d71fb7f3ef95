use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub reachable: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health report. Probes the datastore through the status board,
/// which always has at least the seeded rows.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let reachable = state.store.statuses.list(true).await.is_ok();
    let latency_ms = started.elapsed().as_millis() as u64;

    let status = if reachable { "healthy" } else { "degraded" };
    let code = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: StoreHealth {
                reachable,
                latency_ms,
            },
        }),
    )
}

/// Liveness: the process is up.
pub async fn liveness() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// Readiness: the datastore answers.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    match state.store.statuses.list(true).await {
        Ok(_) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "ready".to_string(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse {
                status: "not ready".to_string(),
            }),
        ),
    }
}
