//! Prometheus metrics for chat-gateway.
//!
//! Recording helpers are no-ops until `init_metrics` has run, so library code
//! and tests never need a registry.

use axum::{extract::Request, middleware::Next, response::Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Chat metrics
pub static CHAT_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CHAT_MODEL_FALLBACKS_TOTAL: OnceLock<IntCounter> = OnceLock::new();

// Backend metrics
pub static BACKEND_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static BACKEND_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize all metrics. Call once at startup; later calls are ignored.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;

    let chat_requests = IntCounterVec::new(
        Opts::new("chat_requests_total", "Total chat requests by effective model"),
        &["model", "outcome"],
    )?;

    let model_fallbacks = IntCounter::new(
        "chat_model_fallbacks_total",
        "Chat requests whose model was replaced by the default model",
    )?;

    let backend_duration = HistogramVec::new(
        HistogramOpts::new(
            "backend_request_duration_seconds",
            "Inference backend call duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["operation"],
    )?;

    let backend_errors = IntCounterVec::new(
        Opts::new("backend_errors_total", "Inference backend failures"),
        &["operation", "kind"],
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration.clone()))?;
    registry.register(Box::new(chat_requests.clone()))?;
    registry.register(Box::new(model_fallbacks.clone()))?;
    registry.register(Box::new(backend_duration.clone()))?;
    registry.register(Box::new(backend_errors.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = CHAT_REQUESTS_TOTAL.set(chat_requests);
    let _ = CHAT_MODEL_FALLBACKS_TOTAL.set(model_fallbacks);
    let _ = BACKEND_REQUEST_DURATION_SECONDS.set(backend_duration);
    let _ = BACKEND_ERRORS_TOTAL.set(backend_errors);

    Ok(())
}

/// Text exposition of every registered metric.
pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_chat_request(model: &str, outcome: &str) {
    if let Some(counter) = CHAT_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[model, outcome]).inc();
    }
}

pub fn record_model_fallback() {
    if let Some(counter) = CHAT_MODEL_FALLBACKS_TOTAL.get() {
        counter.inc();
    }
}

pub fn observe_backend_latency(operation: &str, elapsed: Duration) {
    if let Some(histogram) = BACKEND_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_backend_error(operation: &str, kind: &str) {
    if let Some(counter) = BACKEND_ERRORS_TOTAL.get() {
        counter.with_label_values(&[operation, kind]).inc();
    }
}

/// Count and time every HTTP request.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), path.as_str(), status.as_str()];

    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&labels).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&labels)
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_includes_recorded_series() {
        init_metrics().unwrap();
        record_chat_request("llama3.2", "ok");
        record_model_fallback();

        let text = get_metrics();
        assert!(text.contains("chat_requests_total"));
        assert!(text.contains("chat_model_fallbacks_total"));
    }

    #[test]
    fn init_is_idempotent() {
        init_metrics().unwrap();
        init_metrics().unwrap();
    }
}
