//! Picks the model a chat request is actually sent to.

use crate::services::metrics;

#[derive(Debug, Clone)]
pub struct ModelResolver {
    default_models: Vec<String>,
}

impl ModelResolver {
    pub fn new(default_models: Vec<String>) -> Self {
        Self { default_models }
    }

    /// Model substituted for requests naming an unadvertised model.
    pub fn fallback_model(&self) -> Option<&str> {
        self.default_models.first().map(String::as_str)
    }

    /// Effective model for `requested` given the backend's catalog.
    ///
    /// An empty catalog means nothing is known about the backend, so the
    /// request passes through unvalidated. Matching is exact and
    /// case-sensitive.
    pub fn resolve(&self, requested: &str, available: &[String]) -> String {
        if available.is_empty() || available.iter().any(|m| m == requested) {
            return requested.to_string();
        }

        match self.fallback_model() {
            Some(fallback) => {
                tracing::warn!(
                    requested = %requested,
                    fallback = %fallback,
                    "Model not available, using default"
                );
                metrics::record_model_fallback();
                fallback.to_string()
            }
            None => {
                tracing::warn!(
                    requested = %requested,
                    "Model not available and no default configured, passing through"
                );
                requested.to_string()
            }
        }
    }
}
