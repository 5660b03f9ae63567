//! Chat failure taxonomy and its translation to HTTP outcomes.

use crate::config::MessageConfig;
use crate::services::backend::BackendError;
use axum::http::StatusCode;
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Category of a failed chat operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// The backend refused or dropped the connection.
    BackendUnavailable,
    /// The backend did not answer within the configured timeout.
    BackendTimeout,
    /// The backend answered, but not with a usable 200 payload.
    /// `status` is absent when the payload itself was malformed.
    BackendError { status: Option<u16> },
    /// Anything else that went wrong during orchestration.
    Internal,
}

impl ChatErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ChatErrorKind::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            ChatErrorKind::BackendError { .. } | ChatErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ChatErrorKind::BackendUnavailable => "backend_unavailable",
            ChatErrorKind::BackendTimeout => "backend_timeout",
            ChatErrorKind::BackendError { .. } => "backend_error",
            ChatErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ChatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failed chat operation: what kind of failure plus diagnostic context.
#[derive(Debug, Error)]
#[error("{kind}: {cause}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub cause: String,
    pub details: BTreeMap<String, String>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Map to the caller-facing error using the configured messages.
    pub fn to_app_error(&self, messages: &MessageConfig) -> AppError {
        match self.kind {
            ChatErrorKind::BackendUnavailable => {
                AppError::ServiceUnavailable(messages.ollama_not_running.clone())
            }
            ChatErrorKind::BackendTimeout => {
                AppError::GatewayTimeout(messages.ollama_timeout.clone())
            }
            ChatErrorKind::BackendError { .. } => AppError::ServerError(messages.ollama_api.clone()),
            ChatErrorKind::Internal => AppError::ServerError(messages.internal.clone()),
        }
    }
}

impl From<BackendError> for ChatError {
    fn from(err: BackendError) -> Self {
        let kind = match &err {
            BackendError::Unavailable(_) => ChatErrorKind::BackendUnavailable,
            BackendError::Timeout(_) => ChatErrorKind::BackendTimeout,
            BackendError::Status { status, .. } => ChatErrorKind::BackendError {
                status: Some(*status),
            },
            BackendError::Protocol(_) => ChatErrorKind::BackendError { status: None },
            BackendError::Internal(_) => ChatErrorKind::Internal,
        };

        let error = ChatError::new(kind, err.to_string());
        match err {
            BackendError::Status { status, .. } => {
                error.with_detail("upstream_status", status.to_string())
            }
            _ => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn messages() -> MessageConfig {
        GatewayConfig::default().messages
    }

    #[test]
    fn unavailable_becomes_503_with_not_running_message() {
        let err = ChatError::from(BackendError::Unavailable("connection refused".into()));
        let app_err = err.to_app_error(&messages());

        assert_eq!(app_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(app_err, AppError::ServiceUnavailable(msg) if msg == "Ollama not running"));
    }

    #[test]
    fn timeout_becomes_504() {
        let err = ChatError::from(BackendError::Timeout("deadline elapsed".into()));
        assert_eq!(err.kind, ChatErrorKind::BackendTimeout);

        let app_err = err.to_app_error(&messages());
        assert_eq!(app_err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(matches!(app_err, AppError::GatewayTimeout(msg) if msg == "Ollama request timeout"));
    }

    #[test]
    fn upstream_status_is_kept_in_kind_and_details() {
        let err = ChatError::from(BackendError::Status {
            status: 404,
            body: "model not found".into(),
        });

        assert_eq!(err.kind, ChatErrorKind::BackendError { status: Some(404) });
        assert_eq!(err.details.get("upstream_status").map(String::as_str), Some("404"));

        let app_err = err.to_app_error(&messages());
        assert_eq!(app_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            app_err,
            AppError::ServerError(msg) if msg == "Error communicating with Ollama API"
        ));
    }

    #[test]
    fn malformed_payload_is_a_backend_error_without_status() {
        let err = ChatError::from(BackendError::Protocol("expected value".into()));
        assert_eq!(err.kind, ChatErrorKind::BackendError { status: None });
    }

    #[test]
    fn internal_uses_internal_message() {
        let app_err = ChatError::new(ChatErrorKind::Internal, "boom").to_app_error(&messages());
        assert!(matches!(app_err, AppError::ServerError(msg) if msg == "Internal server error"));
    }
}
