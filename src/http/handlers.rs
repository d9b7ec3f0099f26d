//! Infrastructure endpoints.
//!
//! - `GET /`        → plain-text banner
//! - `GET /health`  → 200 while live, 500 otherwise
//! - `GET /ready`   → 200 while accepting traffic, 503 otherwise
//! - `GET /info`    → `{service, version, buildTime}`
//! - `GET /metrics` → Prometheus text exposition

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::health::{LivenessState, ReadinessState};
use crate::http::server::AppState;

pub const ROOT_PATH: &str = "/";
pub const LIVENESS_PATH: &str = "/health";
pub const READINESS_PATH: &str = "/ready";
pub const INFO_PATH: &str = "/info";
pub const METRICS_PATH: &str = "/metrics";

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub service: String,
    pub version: String,
    pub build_time: String,
}

pub async fn root(State(state): State<AppState>) -> String {
    format!("{} is running\n", state.service.name)
}

pub async fn liveness(State(state): State<AppState>) -> StatusCode {
    match state.liveness.current() {
        LivenessState::Correct => StatusCode::OK,
        LivenessState::Broken => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.readiness.current() {
        ReadinessState::AcceptingTraffic => StatusCode::OK,
        ReadinessState::RefusingTraffic => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        service: state.service.name.clone(),
        version: state.service.version.clone(),
        build_time: state.service.build_time.clone(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
