//! CORS handling
//!
//! The browser client lives on another origin and sends credentials, so the
//! wildcard `tower_http` layer does not fit: the caller's `Origin` is echoed
//! back together with `Access-Control-Allow-Credentials: true`, and
//! preflights answer with 204.
//!
//! Route handlers answer their own preflights with route-specific method
//! lists. The middleware below covers every `/api/*` response on top of that,
//! including error responses and preflights for paths no route handles.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{config::DEFAULT_CORS_ORIGIN, AppState};

/// Methods advertised by the router-wide preflight fallback
pub const ALL_METHODS: &str = "POST, GET, OPTIONS, DELETE, PUT, PATCH";

/// Headers the browser client may send
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Date, X-Api-Version";

/// Preflight cache lifetime (24h)
pub const MAX_AGE_SECONDS: &str = "86400";

/// Origin echoing policy
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    default_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(default_origin: &str) -> Self {
        let default_origin = HeaderValue::from_str(default_origin)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CORS_ORIGIN));
        Self { default_origin }
    }

    /// The caller's `Origin`, or the configured default.
    ///
    /// Any origin is accepted as-is.
    pub fn origin_for(&self, request_headers: &HeaderMap) -> HeaderValue {
        request_headers
            .get(ORIGIN)
            .cloned()
            .unwrap_or_else(|| self.default_origin.clone())
    }

    /// Set the origin and credentials headers on an outgoing response
    pub fn apply(&self, origin: HeaderValue, response_headers: &mut HeaderMap) {
        response_headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        response_headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    /// Attach CORS headers for the request that produced `response`
    pub fn decorate(&self, request_headers: &HeaderMap, mut response: Response) -> Response {
        self.apply(self.origin_for(request_headers), response.headers_mut());
        response
    }

    /// 204 preflight response advertising `allow_methods`
    pub fn preflight(&self, origin: HeaderValue, allow_methods: &'static str) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        self.apply(origin, headers);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(allow_methods),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECONDS),
        );
        response
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// CORS middleware for everything under `/api/*`
pub async fn cors_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_api_path(request.uri().path()) {
        return next.run(request).await;
    }

    let origin = state.cors.origin_for(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    debug!(method = %method, path = %path, origin = ?origin, "CORS middleware entry");

    let mut response = next.run(request).await;

    if method == Method::OPTIONS && response.status() != StatusCode::NO_CONTENT {
        debug!(path = %path, "No route preflight; answering with router-wide preflight");
        return state.cors.preflight(origin, ALL_METHODS);
    }

    state.cors.apply(origin, response.headers_mut());
    response
}
