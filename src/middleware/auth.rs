//! Credential resolution and internal token gate
//!
//! Keyed routes resolve the upstream API key from the caller's bearer token,
//! falling back to the server-side secret. `/api/proxy` is instead gated by a
//! static internal token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    proxy::{logging::RequestContext, Provider},
    routes::{finish_request, internal::PROXY_PATH},
    AppState,
};

/// Where a resolved API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// `Authorization: Bearer` header on the inbound request
    Caller,
    /// Server-side configuration
    Server,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Caller => "caller",
            KeySource::Server => "server",
        }
    }
}

/// An upstream API key together with its origin
#[derive(Clone)]
pub struct ApiKey {
    value: String,
    pub source: KeySource,
}

impl ApiKey {
    pub fn new(value: impl Into<String>, source: KeySource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }
}

// Keys must never reach the logs.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Extract the Authorization header and return the bearer token
///
/// `Bearer ` with nothing after it carries no token.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Bearer token from a header map, if present and well-formed
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
}

/// Resolve the upstream key for a keyed route
///
/// The caller's bearer token wins verbatim; otherwise the configured secret
/// is used. Neither present is a terminal 401.
pub fn resolve_api_key(
    headers: &HeaderMap,
    configured: Option<&str>,
    provider: &'static str,
    env_var: &'static str,
) -> AppResult<ApiKey> {
    if let Some(token) = bearer_from_headers(headers) {
        return Ok(ApiKey::new(token, KeySource::Caller));
    }

    match configured {
        Some(value) => Ok(ApiKey::new(value, KeySource::Server)),
        None => {
            warn!(provider = %provider, "No API key from caller or configuration");
            Err(AppError::MissingApiKey { provider, env_var })
        }
    }
}

/// Compare a presented token with the expected one in time independent of
/// where they first differ
fn token_matches(presented: &str, expected: &str) -> bool {
    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// Internal token middleware
///
/// Rejects the request unless its bearer token equals `INTERNAL_TOKEN`.
/// An unconfigured token rejects everything. Preflights pass through
/// untouched, browsers never attach credentials to them. Rejections are
/// counted and logged like any other `/api/proxy` response.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn internal_token_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let accepted = match state.config.internal_token.as_deref() {
        None => {
            warn!("INTERNAL_TOKEN is not configured; rejecting request");
            false
        }
        Some(expected) => match bearer_from_headers(request.headers()) {
            Some(token) if token_matches(token, expected) => true,
            _ => {
                warn!("Unauthorized access attempt");
                false
            }
        },
    };

    if accepted {
        debug!("Internal token accepted");
        return next.run(request).await;
    }

    let ctx = RequestContext::new(Provider::OpenAI.name(), PROXY_PATH);
    finish_request(&state, &ctx, request.headers(), Err(AppError::Unauthorized))
}
