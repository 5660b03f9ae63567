//! Health and model-catalog reports.

use crate::dtos::{HealthStatus, ModelsHealthReport, PingResponse};
use crate::services::backend::{HealthState, InferenceBackend};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct Reporter {
    backend: Arc<dyn InferenceBackend>,
}

impl Reporter {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    pub async fn health_status(&self) -> HealthStatus {
        let health = self.backend.check_health().await;
        HealthStatus {
            status: health.status,
            ollama: health.state,
            timestamp: timestamp(),
        }
    }

    /// Healthy iff at least one model is listed. A degraded catalog still
    /// lists the fallback models and therefore reports healthy.
    pub async fn models_report(&self) -> ModelsHealthReport {
        let models = self.backend.list_models().await.into_models();
        let status = if models.is_empty() {
            HealthState::Unhealthy
        } else {
            HealthState::Healthy
        };

        ModelsHealthReport {
            status,
            model_count: models.len(),
            models,
        }
    }

    pub fn ping(&self) -> PingResponse {
        PingResponse {
            message: "pong".to_string(),
            timestamp: timestamp(),
        }
    }
}

/// Current UTC instant in RFC 3339 form.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::{MockBackend, ModelCatalog};
    use chrono::DateTime;

    #[tokio::test]
    async fn health_wraps_backend_state_with_timestamp() {
        let reporter = Reporter::new(Arc::new(MockBackend::new(&["llama3.2"], "")));
        let status = reporter.health_status().await;

        assert_eq!(status.status, HealthState::Healthy);
        assert_eq!(status.ollama, "running");
        assert!(DateTime::parse_from_rfc3339(&status.timestamp).is_ok());
    }

    #[tokio::test]
    async fn unreachable_backend_is_unhealthy() {
        let reporter = Reporter::new(Arc::new(MockBackend::unreachable(vec!["a".into()])));
        let status = reporter.health_status().await;

        assert_eq!(status.status, HealthState::Unhealthy);
        assert_eq!(status.ollama, "not running");
    }

    #[tokio::test]
    async fn models_report_counts_models() {
        let reporter = Reporter::new(Arc::new(MockBackend::new(&["a", "b"], "")));
        let report = reporter.models_report().await;

        assert_eq!(report.status, HealthState::Healthy);
        assert_eq!(report.model_count, 2);
        assert_eq!(report.models, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_live_catalog_is_unhealthy() {
        let backend = MockBackend::new(&[], "").with_catalog(ModelCatalog::Live(Vec::new()));
        let report = Reporter::new(Arc::new(backend)).models_report().await;

        assert_eq!(report.status, HealthState::Unhealthy);
        assert_eq!(report.model_count, 0);
    }

    #[test]
    fn ping_answers_pong() {
        let reporter = Reporter::new(Arc::new(MockBackend::new(&[], "")));
        assert_eq!(reporter.ping().message, "pong");
    }
}
