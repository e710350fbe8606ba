//! Health check endpoints
//!
//! - `/health` - Service status and which upstreams have a server-side key
//! - `/health/live` - Liveness probe
//!
//! The relay holds no connections of its own, so there is nothing to probe;
//! a missing server key only means callers must bring their own.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{config::Config, AppState};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Server-side credentials present at startup
#[derive(Debug, Serialize, PartialEq)]
pub struct ProviderKeys {
    pub openai: bool,
    pub google: bool,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub providers: ProviderKeys,
    pub internal_token_configured: bool,
}

/// Simple health response for liveness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

impl ProviderKeys {
    pub fn from_config(config: &Config) -> Self {
        Self {
            openai: config.openai_api_key.is_some(),
            google: config.google_api_key.is_some(),
        }
    }
}

/// Full health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        providers: ProviderKeys::from_config(&state.config),
        internal_token_configured: state.config.internal_token.is_some(),
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe endpoint
///
/// Returns 200 OK if the application is alive.
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
