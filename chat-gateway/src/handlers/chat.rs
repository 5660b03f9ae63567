use crate::dtos::{ChatRequest, ChatResponse, ModelsResponse};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};
use service_core::error::AppError;

pub async fn chat_with_ai(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    tracing::info!(model = %request.model, "Received chat request");

    state
        .chat
        .process_chat_message(request)
        .await
        .map(Json)
        .map_err(|e| e.to_app_error(&state.config.messages))
}

pub async fn list_chat_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.chat.get_available_models().await,
    })
}
