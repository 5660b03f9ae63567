//! Inference backend abstraction.
//!
//! `OllamaClient` talks to a real server; `MockBackend` is a scripted
//! stand-in for tests.

pub mod mock;
pub mod ollama;

pub use mock::MockBackend;
pub use ollama::OllamaClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for generate calls. Catalog and health probes never fail.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot connect to inference backend: {0}")]
    Unavailable(String),

    #[error("Inference backend request timed out: {0}")]
    Timeout(String),

    #[error("Inference backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from inference backend: {0}")]
    Protocol(String),

    #[error("Backend client error: {0}")]
    Internal(String),
}

/// Payload of a successful generate call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    /// Generated text. Absent and empty are treated alike.
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl GenerateResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            done: Some(true),
            ..Default::default()
        }
    }

    /// The generated text, if any was produced.
    pub fn generated_text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}

/// Outcome of a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCatalog {
    /// The backend answered; its list may legitimately be empty.
    Live(Vec<String>),
    /// The backend could not be asked; this is the configured fallback list.
    Degraded(Vec<String>),
}

impl ModelCatalog {
    pub fn models(&self) -> &[String] {
        match self {
            ModelCatalog::Live(models) | ModelCatalog::Degraded(models) => models,
        }
    }

    pub fn into_models(self) -> Vec<String> {
        match self {
            ModelCatalog::Live(models) | ModelCatalog::Degraded(models) => models,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ModelCatalog::Degraded(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Healthy => f.write_str("healthy"),
            HealthState::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

/// Result of a backend health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendHealth {
    pub status: HealthState,
    /// Human-readable backend state, e.g. "running".
    pub state: String,
}

impl BackendHealth {
    pub fn running() -> Self {
        Self {
            status: HealthState::Healthy,
            state: "running".to_string(),
        }
    }

    pub fn not_running() -> Self {
        Self {
            status: HealthState::Unhealthy,
            state: "not running".to_string(),
        }
    }
}

/// Operations the gateway needs from an inference server.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run a single non-streaming generation.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        stream: bool,
    ) -> Result<GenerateResponse, BackendError>;

    /// Advertised models, or the fallback list when the backend is unreachable.
    async fn list_models(&self) -> ModelCatalog;

    /// Probe reachability. Every failure collapses to `not_running`.
    async fn check_health(&self) -> BackendHealth;
}

/// Drop repeated names, keeping the first occurrence and the original order.
pub fn distinct_models<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_text_are_both_absent() {
        assert_eq!(GenerateResponse::default().generated_text(), None);
        assert_eq!(GenerateResponse::text("").generated_text(), None);
        assert_eq!(GenerateResponse::text("hi").generated_text(), Some("hi"));
    }

    #[test]
    fn generate_payload_tolerates_unknown_fields() {
        let payload: GenerateResponse = serde_json::from_str(
            r#"{"model":"llama3.2","created_at":"2024-01-01T00:00:00Z","response":"Hi there","done":true,"context":[1,2,3]}"#,
        )
        .unwrap();

        assert_eq!(payload.generated_text(), Some("Hi there"));
        assert_eq!(payload.model.as_deref(), Some("llama3.2"));
    }

    #[test]
    fn catalog_outcomes_share_the_list_view() {
        let live = ModelCatalog::Live(vec!["a".into()]);
        let degraded = ModelCatalog::Degraded(vec!["a".into()]);

        assert_eq!(live.models(), degraded.models());
        assert!(!live.is_degraded());
        assert!(degraded.is_degraded());
    }

    #[test]
    fn distinct_models_keeps_first_occurrence() {
        let names = vec!["b", "a", "b", "c", "a"].into_iter().map(String::from);
        assert_eq!(distinct_models(names), vec!["b", "a", "c"]);
    }
}
