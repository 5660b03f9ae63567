use crate::dtos::{ModelsHealthReport, ModelsResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};

pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.chat.get_available_models().await,
    })
}

pub async fn models_health(State(state): State<AppState>) -> Json<ModelsHealthReport> {
    Json(state.reporter.models_report().await)
}
