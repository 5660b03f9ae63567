//! HTTP handlers for chat-gateway.

pub mod chat;
pub mod health;
pub mod models;

use axum::response::IntoResponse;

pub async fn metrics() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        crate::services::metrics::get_metrics(),
    )
}
