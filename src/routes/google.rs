//! Google Generative Language passthrough
//!
//! `POST /api/generativelanguage.googleapis.com/v1beta/models/{model}` where
//! `{model}` is `MODEL` or `MODEL:ACTION`. Streams when the action is
//! `streamGenerateContent` or the query asks for `alt=sse`.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::AppResult,
    middleware::auth::resolve_api_key,
    proxy::{
        google::{GoogleAction, GoogleQuery, GoogleTarget},
        headers::build_upstream_headers,
        logging::RequestContext,
        Provider,
    },
    routes::{finish_request, preflight_response, PASSTHROUGH_METHODS},
    AppState,
};

pub const GOOGLE_MODEL_PATH: &str = "/api/generativelanguage.googleapis.com/v1beta/models/:model";

/// Body forwarded when the caller sent nothing usable
const EMPTY_OBJECT: &[u8] = b"{}";

/// The caller's body if it is JSON, otherwise `{}`
pub fn upstream_body(body: Bytes) -> Bytes {
    if serde_json::from_slice::<Value>(&body).is_ok() {
        body
    } else {
        debug!(body_len = body.len(), "Body is empty or not JSON; forwarding {{}}");
        Bytes::from_static(EMPTY_OBJECT)
    }
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::new(Provider::Google.name(), GOOGLE_MODEL_PATH);
    let result = forward_generate(&state, &model, query.as_deref(), &headers, body, ctx.clone()).await;
    finish_request(&state, &ctx, &headers, result)
}

async fn forward_generate(
    state: &AppState,
    segment: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
    ctx: RequestContext,
) -> AppResult<Response> {
    let provider = Provider::Google;
    let target = GoogleTarget::parse(segment)?;
    let query = GoogleQuery::from_raw(query);
    let streaming = target.action == GoogleAction::StreamGenerateContent || query.sse;

    info!(
        trace_id = %ctx.trace_id,
        model = %target.model,
        action = %target.action.as_str(),
        sse = %query.sse,
        "Processing Google AI request"
    );

    let api_key = resolve_api_key(
        headers,
        state.config.google_api_key.as_deref(),
        provider.display_name(),
        provider.key_env_var(),
    )?;
    let ctx = ctx
        .with_model(target.model.clone())
        .with_streaming(streaming)
        .with_key_source(api_key.source);
    ctx.log_request_start();

    let url = state
        .google
        .url(&format!("{}{}", target.upstream_path(), query.suffix()));
    let upstream_headers = build_upstream_headers(provider, &api_key, true, None)?;

    let response = state
        .google
        .send(Method::POST, &url, upstream_headers, Some(upstream_body(body)), &ctx)
        .await?;

    if streaming {
        state.google.forward_stream(response, ctx).await
    } else {
        state.google.forward_buffered(response, &ctx).await
    }
}

pub async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    preflight_response(&state, &headers, PASSTHROUGH_METHODS)
}
