//! Application startup and lifecycle management.
//!
//! Components are wired once here and shared read-only by every request.

use crate::config::{CorsConfig, GatewayConfig};
use crate::handlers;
use crate::services::{ChatService, InferenceBackend, ModelResolver, OllamaClient, Reporter};
use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{http_span, request_id_middleware};
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub chat: ChatService,
    pub reporter: Reporter,
}

impl AppState {
    pub fn new(config: GatewayConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        let resolver = ModelResolver::new(config.models.default_models.clone());
        let chat = ChatService::new(backend.clone(), resolver, &config.messages);
        let reporter = Reporter::new(backend);

        Self {
            config: Arc::new(config),
            chat,
            reporter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chat", post(handlers::chat::chat_with_ai))
        .route("/chat/", post(handlers::chat::chat_with_ai))
        .route("/chat/models", get(handlers::chat::list_chat_models))
        .route("/models", get(handlers::models::list_models))
        .route("/models/", get(handlers::models::list_models))
        .route("/models/health", get(handlers::models::models_health))
        .route("/health", get(handlers::health::health_check))
        .route("/health/", get(handlers::health::health_check))
        .route("/health/ping", get(handlers::health::ping));

    let cors = cors_layer(&state.config.cors);
    let internal_message = state.config.messages.internal.clone();

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, &internal_message)
        }))
        .layer(from_fn(crate::services::metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(http_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// A panicking handler still answers 500 with the configured internal message.
fn panic_response(panic: Box<dyn Any + Send + 'static>, message: &str) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    AppError::ServerError(message.to_string()).into_response()
}

/// Configured origins with credentials. Methods and headers are mirrored
/// since wildcards cannot be combined with credentials.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against the configured Ollama server.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let backend = OllamaClient::new(&config.ollama, config.models.default_models.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(base_url = %backend.base_url(), "Initialized Ollama client");

        Self::build_with_backend(config, Arc::new(backend)).await
    }

    /// Build the application around an existing backend.
    pub async fn build_with_backend(
        config: GatewayConfig,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            app = %config.app.name,
            version = %config.app.version,
            "HTTP listening on port {}",
            port
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, backend),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app_name = self.state.config.app.name.clone();
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })?;

        tracing::info!("Shutting down {}", app_name);
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
