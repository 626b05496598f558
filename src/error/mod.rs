//! Unified error handling for zendesk-auth

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure (DNS, connect, timeout) talking to Zendesk
    #[error("Network error: {0}")]
    Network(String),

    /// Zendesk answered with a non-2xx status
    #[error("Authentication rejected by Zendesk (status {status})")]
    AuthenticationRejected { status: u16 },

    /// Zendesk answered 2xx but the body broke the expected contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session read error: {0}")]
    SessionRead(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error means "the login attempt failed".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::AuthenticationRejected { .. }
                | AppError::MalformedResponse(_)
        )
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Network(msg) => {
                tracing::warn!("Zendesk unreachable: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication_failed",
                    "Authentication failed".to_string(),
                )
            }
            AppError::AuthenticationRejected { .. } => (
                StatusCode::UNAUTHORIZED,
                "authentication_failed",
                "Authentication failed".to_string(),
            ),
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed Zendesk response: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication_failed",
                    "Authentication failed".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg.clone())
            }
            AppError::SessionRead(msg) => {
                tracing::error!("Session read error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session_error",
                    "A session error occurred".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "config_error",
                    "A configuration error occurred".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session_error",
                    "A session error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
