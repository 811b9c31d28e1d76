// crates/server/src/routes/health.rs
//! Liveness and metrics endpoints. Kept out of the interceptor's
//! monitored path set (see `AppConfig::monitoring.ignored_paths`) so
//! scrapers never trip the slow-request/error alerting path.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
pub async fn liveness(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn metrics() -> (StatusCode, String) {
    match crate::metrics::render_metrics() {
        Some(body) => (StatusCode::OK, body),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized".to_string()),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(liveness)).route("/metrics", get(metrics))
}
