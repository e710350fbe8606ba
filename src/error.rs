//! Error types for Vendor Relay
//!
//! Every error is terminal for its request and renders as a JSON envelope
//! `{"error": "...", "code": "...", "details": ...}`. CORS headers are added
//! by the CORS middleware, so error responses stay readable cross-origin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{provider} API key is missing. Set {env_var} or send an Authorization header.")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{provider} API error: {status} - {body}")]
    Upstream {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to reach upstream: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    /// HTTP status for this error
    ///
    /// Upstream failures keep the upstream's own status code.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingApiKey { .. } | AppError::Unauthorized | AppError::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. }
                if status.is_client_error() || status.is_server_error() =>
            {
                *status
            }
            AppError::Upstream { .. } | AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AppError::JsonError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::MissingApiKey { .. } => "MISSING_API_KEY",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream { .. } => "UPSTREAM_ERROR",
            AppError::HttpError(_) => "UPSTREAM_UNREACHABLE",
            AppError::JsonError(_) => "INVALID_JSON",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Extra context for the envelope.
    ///
    /// Upstream errors always carry the raw status and body. Internal errors
    /// carry their source chain in debug builds only.
    fn details(&self) -> Option<Value> {
        match self {
            AppError::Upstream { status, body, .. } => Some(json!({
                "status": status.as_u16(),
                "body": body,
            })),
            AppError::HttpError(_) | AppError::JsonError(_) | AppError::Internal(_)
                if cfg!(debug_assertions) =>
            {
                Some(Value::from(error_chain(self)))
            }
            _ => None,
        }
    }
}

/// Collect an error and its sources, outermost first
fn error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
