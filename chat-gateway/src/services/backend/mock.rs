//! Scripted backend for testing.

use super::{BackendError, BackendHealth, GenerateResponse, InferenceBackend, ModelCatalog};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock answers to generate calls.
#[derive(Debug, Clone)]
pub enum MockGeneration {
    Respond(GenerateResponse),
    Unavailable,
    Timeout,
    Status(u16),
}

/// Mock backend with a fixed catalog and generate outcome.
pub struct MockBackend {
    catalog: ModelCatalog,
    generation: MockGeneration,
    health: BackendHealth,
    generate_calls: Mutex<Vec<(String, String)>>,
}

impl MockBackend {
    /// A running backend advertising `models` and answering with `text`.
    pub fn new(models: &[&str], text: &str) -> Self {
        Self {
            catalog: ModelCatalog::Live(models.iter().map(|m| m.to_string()).collect()),
            generation: MockGeneration::Respond(GenerateResponse::text(text)),
            health: BackendHealth::running(),
            generate_calls: Mutex::new(Vec::new()),
        }
    }

    /// A backend that cannot be reached: listing degrades to `fallback`,
    /// generation fails as unavailable.
    pub fn unreachable(fallback: Vec<String>) -> Self {
        Self {
            catalog: ModelCatalog::Degraded(fallback),
            generation: MockGeneration::Unavailable,
            health: BackendHealth::not_running(),
            generate_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_generation(mut self, generation: MockGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// `(model, prompt)` pairs passed to `generate`, in call order.
    pub fn generate_calls(&self) -> Vec<(String, String)> {
        self.generate_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        _stream: bool,
    ) -> Result<GenerateResponse, BackendError> {
        if let Ok(mut calls) = self.generate_calls.lock() {
            calls.push((model.to_string(), prompt.to_string()));
        }

        match &self.generation {
            MockGeneration::Respond(payload) => Ok(payload.clone()),
            MockGeneration::Unavailable => Err(BackendError::Unavailable(
                "connection refused".to_string(),
            )),
            MockGeneration::Timeout => Err(BackendError::Timeout("deadline elapsed".to_string())),
            MockGeneration::Status(status) => Err(BackendError::Status {
                status: *status,
                body: String::new(),
            }),
        }
    }

    async fn list_models(&self) -> ModelCatalog {
        self.catalog.clone()
    }

    async fn check_health(&self) -> BackendHealth {
        self.health.clone()
    }
}
