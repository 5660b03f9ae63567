use crate::dtos::{HealthStatus, PingResponse, RootResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};

/// Backend reachability. Always 200; the body carries the verdict.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.reporter.health_status().await)
}

pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.reporter.ping())
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} is running!", state.config.app.name),
        version: state.config.app.version.clone(),
        docs: "/docs".to_string(),
        health: "/api/v1/health".to_string(),
    })
}
