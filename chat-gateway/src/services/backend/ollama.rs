//! Ollama HTTP client.
//!
//! Calls `/api/generate` for completions and `/api/tags` for the model
//! catalog and health probes.

use super::{
    distinct_models, BackendError, BackendHealth, GenerateResponse, InferenceBackend, ModelCatalog,
};
use crate::config::OllamaConfig;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    generate_timeout: Duration,
    models_timeout: Duration,
    default_models: Vec<String>,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, default_models: Vec<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generate_timeout: config.generate_timeout(),
            models_timeout: config.models_timeout(),
            default_models,
        })
    }

    /// Override both timeouts.
    pub fn with_timeouts(mut self, generate: Duration, models: Duration) -> Self {
        self.generate_timeout = generate;
        self.models_timeout = models;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_tags(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.models_timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let tags: TagsResponse = response.json().await.map_err(classify_body_error)?;
        Ok(distinct_models(tags.models.into_iter().map(|m| m.name)))
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        stream: bool,
    ) -> Result<GenerateResponse, BackendError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream,
        };

        tracing::info!(
            model = %model,
            prompt_len = prompt.len(),
            "Generating response"
        );

        let started = Instant::now();
        let result: Result<GenerateResponse, BackendError> = async {
            let response = self
                .client
                .post(self.url("/api/generate"))
                .timeout(self.generate_timeout)
                .json(&request)
                .send()
                .await
                .map_err(classify_transport_error)?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(BackendError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<GenerateResponse>()
                .await
                .map_err(classify_body_error)
        }
        .await;

        metrics::observe_backend_latency("generate", started.elapsed());

        match &result {
            Ok(payload) => tracing::debug!(
                model = %model,
                eval_count = payload.eval_count.unwrap_or(0),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Generation finished"
            ),
            Err(BackendError::Unavailable(cause)) => {
                metrics::record_backend_error("generate", "unavailable");
                tracing::error!(model = %model, cause = %cause, "Cannot connect to Ollama");
            }
            Err(BackendError::Timeout(cause)) => {
                metrics::record_backend_error("generate", "timeout");
                tracing::error!(
                    model = %model,
                    cause = %cause,
                    timeout_secs = self.generate_timeout.as_secs_f64(),
                    "Ollama request timeout"
                );
            }
            Err(BackendError::Status { status, .. }) => {
                metrics::record_backend_error("generate", "status");
                tracing::error!(model = %model, upstream_status = status, "Ollama API error");
            }
            Err(err) => {
                metrics::record_backend_error("generate", "other");
                tracing::error!(model = %model, error = %err, "Unexpected Ollama failure");
            }
        }

        result
    }

    async fn list_models(&self) -> ModelCatalog {
        let started = Instant::now();
        let result = self.fetch_tags().await;
        metrics::observe_backend_latency("list_models", started.elapsed());

        match result {
            Ok(models) => {
                tracing::debug!(count = models.len(), "Fetched models from Ollama");
                ModelCatalog::Live(models)
            }
            Err(e) => {
                metrics::record_backend_error("list_models", "degraded");
                tracing::warn!(
                    error = %e,
                    fallback_count = self.default_models.len(),
                    "Could not fetch models from Ollama, using fallback list"
                );
                ModelCatalog::Degraded(self.default_models.clone())
            }
        }
    }

    async fn check_health(&self) -> BackendHealth {
        let result = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.models_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => BackendHealth::running(),
            Ok(response) => {
                tracing::warn!(upstream_status = %response.status(), "Ollama health probe failed");
                BackendHealth::not_running()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ollama health probe failed");
                BackendHealth::not_running()
            }
        }
    }
}

/// Connect errors win over timeouts so a connect timeout reads as "not running".
fn classify_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_connect() {
        BackendError::Unavailable(e.to_string())
    } else if e.is_timeout() {
        BackendError::Timeout(e.to_string())
    } else if e.is_request() {
        BackendError::Unavailable(e.to_string())
    } else {
        BackendError::Internal(e.to_string())
    }
}

fn classify_body_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(e.to_string())
    } else {
        BackendError::Protocol(e.to_string())
    }
}

// ============================================================================
// Ollama API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}
