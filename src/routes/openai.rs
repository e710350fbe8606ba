//! Generic OpenAI v1 passthrough
//!
//! `/api/openai.com/v1` and anything below it (via the router fallback) is
//! forwarded to the same suffix under the OpenAI base URL. POST bodies are
//! forwarded verbatim; a POST to `.../chat/completions` with `stream: true`
//! is relayed as a stream. GET keeps its query string.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use bytes::Bytes;

use crate::{
    error::AppResult,
    middleware::auth::resolve_api_key,
    proxy::{headers::build_upstream_headers, logging::RequestContext, Provider},
    routes::{chat::RequestSummary, finish_request, preflight_response, PASSTHROUGH_METHODS},
    AppState,
};

pub const OPENAI_PREFIX: &str = "/api/openai.com/v1";

/// Metrics/log label for every path under the prefix
const ENDPOINT_LABEL: &str = "/api/openai.com/v1/*";

/// Whether `path` is the passthrough prefix or below it
pub fn is_passthrough_path(path: &str) -> bool {
    path.strip_prefix(OPENAI_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Path below the OpenAI base for an inbound path
pub fn upstream_suffix(path: &str) -> &str {
    path.strip_prefix(OPENAI_PREFIX).unwrap_or_default()
}

/// Forward a GET or POST under the passthrough prefix
pub async fn forward(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::new(Provider::OpenAI.name(), ENDPOINT_LABEL);
    let result = forward_inner(&state, method, &uri, &headers, body, ctx.clone()).await;
    finish_request(&state, &ctx, &headers, result)
}

async fn forward_inner(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
    ctx: RequestContext,
) -> AppResult<Response> {
    let provider = Provider::OpenAI;
    let api_key = resolve_api_key(
        headers,
        state.config.openai_api_key.as_deref(),
        provider.display_name(),
        provider.key_env_var(),
    )?;
    let ctx = ctx.with_key_source(api_key.source);
    let suffix = upstream_suffix(uri.path());

    if method == Method::GET {
        let url = match uri.query() {
            Some(query) => state.openai.url(&format!("{}?{}", suffix, query)),
            None => state.openai.url(suffix),
        };
        ctx.log_request_start();

        let upstream_headers = build_upstream_headers(provider, &api_key, false, None)?;
        let response = state
            .openai
            .send(Method::GET, &url, upstream_headers, None, &ctx)
            .await?;
        return state.openai.forward_buffered(response, &ctx).await;
    }

    let summary = RequestSummary::from_body(&body)?;
    let streaming = suffix.ends_with("/chat/completions") && summary.stream;
    let mut ctx = ctx.with_streaming(streaming);
    if let Some(model) = summary.model {
        ctx = ctx.with_model(model);
    }
    ctx.log_request_start();

    let accept = streaming.then_some("text/event-stream");
    let upstream_headers = build_upstream_headers(provider, &api_key, true, accept)?;
    let url = state.openai.url(suffix);
    let response = state
        .openai
        .send(Method::POST, &url, upstream_headers, Some(body), &ctx)
        .await?;

    if streaming {
        state.openai.forward_stream(response, ctx).await
    } else {
        state.openai.forward_buffered(response, &ctx).await
    }
}

pub async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    preflight_response(&state, &headers, PASSTHROUGH_METHODS)
}
