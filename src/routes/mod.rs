//! HTTP routes for Vendor Relay
//!
//! This module defines all HTTP endpoints exposed by the relay.

pub mod chat;
pub mod google;
pub mod health;
pub mod internal;
pub mod metrics;
pub mod openai;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    error::{AppError, AppResult},
    middleware::{auth::internal_token_middleware, cors::cors_middleware},
    proxy::logging::RequestContext,
    AppState,
};

/// Methods advertised by the vendor passthrough preflights
pub const PASSTHROUGH_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Methods advertised by the `/api/proxy` preflight
pub const PROXY_METHODS: &str = "POST, GET, OPTIONS";

/// 204 preflight for a route that allows `methods`
pub fn preflight_response(state: &AppState, headers: &HeaderMap, methods: &'static str) -> Response {
    state.cors.preflight(state.cors.origin_for(headers), methods)
}

/// Turn a handler result into the outbound response
///
/// Errors become the JSON envelope. Every request is counted and logged
/// here, and leaves with CORS headers for its caller.
pub fn finish_request(
    state: &AppState,
    ctx: &RequestContext,
    headers: &HeaderMap,
    result: AppResult<Response>,
) -> Response {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            ctx.log_error(&e.to_string());
            e.into_response()
        }
    };

    let status = response.status().as_u16();
    metrics::record_request(&ctx.endpoint, status, ctx.elapsed_secs());
    ctx.log_request_complete(status);

    state.cors.decorate(headers, response)
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Internal token gate runs only on /api/proxy
    let internal_routes = Router::new().route(
        "/api/proxy",
        post(internal::proxy)
            .options(internal::preflight)
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                internal_token_middleware,
            )),
    );

    let vendor_routes = Router::new()
        .route(
            openai::OPENAI_PREFIX,
            post(openai::forward)
                .get(openai::forward)
                .options(openai::preflight),
        )
        .route(
            chat::CHAT_COMPLETIONS_PATH,
            post(chat::chat_completions).options(chat::preflight),
        )
        .route(
            google::GOOGLE_MODEL_PATH,
            post(google::generate).options(google::preflight),
        );

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(internal_routes)
        .merge(vendor_routes)
        // Remaining /api/openai.com/v1/* paths land here
        .fallback(api_fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fallback for paths without a dedicated route
///
/// GET and POST under the OpenAI prefix are forwarded as-is. Anything else
/// is a 404; the CORS middleware turns unmatched preflights into 204s.
async fn api_fallback(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if openai::is_passthrough_path(uri.path()) {
        if method == Method::GET || method == Method::POST {
            return openai::forward(State(state), method, uri, headers, body).await;
        }
        if method == Method::OPTIONS {
            return openai::preflight(State(state), headers).await;
        }
    }

    AppError::NotFound(uri.path().to_string()).into_response()
}
