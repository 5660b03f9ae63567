//! Chat orchestration: resolve the model, generate, normalize the answer.

use crate::config::MessageConfig;
use crate::dtos::{ChatRequest, ChatResponse};
use crate::services::backend::InferenceBackend;
use crate::services::error::ChatError;
use crate::services::metrics;
use crate::services::resolver::ModelResolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct ChatService {
    backend: Arc<dyn InferenceBackend>,
    resolver: ModelResolver,
    empty_response: String,
}

impl ChatService {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        resolver: ModelResolver,
        messages: &MessageConfig,
    ) -> Self {
        Self {
            backend,
            resolver,
            empty_response: messages.empty_response.clone(),
        }
    }

    /// Answer one chat message.
    ///
    /// Backend failures during generation are returned as-is; there is no
    /// retry. An empty generation is a success carrying the placeholder text.
    pub async fn process_chat_message(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        tracing::info!(model = %request.model, "Processing chat message");

        let catalog = self.backend.list_models().await;
        let model = self.resolver.resolve(&request.model, catalog.models());

        let generated = match self.backend.generate(&model, &request.message, false).await {
            Ok(generated) => generated,
            Err(e) => {
                let err = ChatError::from(e)
                    .with_detail("operation", "generate")
                    .with_detail("model", model.clone());
                metrics::record_chat_request(&model, err.kind.label());
                tracing::error!(
                    model = %model,
                    kind = %err.kind,
                    details = ?err.details,
                    "Error processing chat message"
                );
                return Err(err);
            }
        };

        let response = match generated.generated_text() {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!(model = %model, "Empty response from Ollama");
                self.empty_response.clone()
            }
        };

        metrics::record_chat_request(&model, "ok");

        Ok(ChatResponse { response, model })
    }

    /// Live catalog, or the configured fallback list. Never fails.
    pub async fn get_available_models(&self) -> Vec<String> {
        self.backend.list_models().await.into_models()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::services::backend::mock::MockGeneration;
    use crate::services::backend::{GenerateResponse, MockBackend, ModelCatalog};
    use crate::services::error::ChatErrorKind;

    fn service(backend: Arc<MockBackend>) -> ChatService {
        let config = GatewayConfig::default();
        ChatService::new(
            backend,
            ModelResolver::new(config.models.default_models),
            &config.messages,
        )
    }

    fn request(message: &str, model: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            model: model.to_string(),
        }
    }

    #[tokio::test]
    async fn known_model_is_used_as_requested() {
        let backend = Arc::new(MockBackend::new(&["llama3.2"], "Hi there"));
        let response = service(backend.clone())
            .process_chat_message(request("Hello", "llama3.2"))
            .await
            .unwrap();

        assert_eq!(response.response, "Hi there");
        assert_eq!(response.model, "llama3.2");
        assert_eq!(
            backend.generate_calls(),
            vec![("llama3.2".to_string(), "Hello".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_model_falls_back_to_first_default() {
        let backend = Arc::new(MockBackend::new(&["mistral"], "Hi there"));
        let response = service(backend.clone())
            .process_chat_message(request("Hello", "unknown-model"))
            .await
            .unwrap();

        assert_eq!(response.model, "llama3.2");
        assert_eq!(backend.generate_calls()[0].0, "llama3.2");
    }

    #[tokio::test]
    async fn empty_catalog_skips_validation() {
        let backend = Arc::new(
            MockBackend::new(&[], "ok").with_catalog(ModelCatalog::Live(Vec::new())),
        );
        let response = service(backend)
            .process_chat_message(request("Hello", "whatever"))
            .await
            .unwrap();

        assert_eq!(response.model, "whatever");
    }

    #[tokio::test]
    async fn empty_generation_becomes_placeholder() {
        let backend = Arc::new(
            MockBackend::new(&["llama3.2"], "")
                .with_generation(MockGeneration::Respond(GenerateResponse::default())),
        );
        let response = service(backend)
            .process_chat_message(request("Hello", "llama3.2"))
            .await
            .unwrap();

        assert_eq!(
            response.response,
            "I apologize, but I couldn't generate a response. Please try again."
        );
        assert_eq!(response.model, "llama3.2");
    }

    #[tokio::test]
    async fn unreachable_backend_fails_as_unavailable() {
        let fallback = GatewayConfig::default().models.default_models;
        let backend = Arc::new(MockBackend::unreachable(fallback));
        let err = service(backend)
            .process_chat_message(request("Hello", "llama3.2"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ChatErrorKind::BackendUnavailable);
        assert_eq!(err.details.get("model").map(String::as_str), Some("llama3.2"));
    }

    #[tokio::test]
    async fn timeout_and_status_failures_propagate() {
        let timeout = Arc::new(
            MockBackend::new(&["llama3.2"], "").with_generation(MockGeneration::Timeout),
        );
        let err = service(timeout)
            .process_chat_message(request("Hello", "llama3.2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::BackendTimeout);

        let status = Arc::new(
            MockBackend::new(&["llama3.2"], "").with_generation(MockGeneration::Status(500)),
        );
        let err = service(status)
            .process_chat_message(request("Hello", "llama3.2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::BackendError { status: Some(500) });
    }

    #[tokio::test]
    async fn available_models_use_fallback_when_degraded() {
        let fallback = vec!["llama3.2".to_string(), "mistral".to_string()];
        let backend = Arc::new(MockBackend::unreachable(fallback.clone()));

        assert_eq!(service(backend).get_available_models().await, fallback);
    }
}
