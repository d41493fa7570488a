//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps protocol outcomes to HTTP status codes with a JSON body carrying a
//! machine-readable code and a message. Internal error details are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use zkauth_auth::AuthError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_PROOF").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body parsed but a field is invalid (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Proof failed verification (401).
    #[error("invalid proof")]
    InvalidProof,

    /// Claimed commitment does not match the stored one (403).
    #[error("wrong credentials")]
    WrongCredentials,

    /// Unknown user (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Username already registered (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// A dependency is not usable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// HTTP status and machine-readable code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::InvalidProof => (StatusCode::UNAUTHORIZED, "INVALID_PROOF"),
            Self::WrongCredentials => (StatusCode::FORBIDDEN, "WRONG_CREDENTIALS"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<zkauth_core::ValidationError> for AppError {
    fn from(err: zkauth_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(e) => Self::Validation(e.to_string()),
            AuthError::Conflict(user) => Self::Conflict(format!("user \"{user}\" already exists")),
            AuthError::NotFound(user) => Self::NotFound(format!("user \"{user}\"")),
            AuthError::Credential => Self::WrongCredentials,
            AuthError::Verification => Self::InvalidProof,
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}
