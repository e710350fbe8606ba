//! OpenAI chat completions endpoint
//!
//! `POST /api/openai.com/v1/chat/completions`. The caller's body is forwarded
//! byte for byte; only `model`, `stream` and the message count are read from
//! it, for routing and logging.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::info;

use crate::{
    error::AppResult,
    middleware::auth::resolve_api_key,
    proxy::{headers::build_upstream_headers, logging::RequestContext, Provider},
    routes::{finish_request, preflight_response, PASSTHROUGH_METHODS},
    AppState,
};

pub const CHAT_COMPLETIONS_PATH: &str = "/api/openai.com/v1/chat/completions";

/// Read-only view of a chat-completion body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSummary {
    pub model: Option<String>,
    pub stream: bool,
    pub messages: usize,
}

impl RequestSummary {
    /// Parse the body as JSON and pick out the routing fields.
    ///
    /// Fails only when the body is not JSON; missing or oddly typed fields
    /// are left for the upstream to judge.
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self {
            model: value["model"].as_str().map(str::to_string),
            stream: value["stream"].as_bool() == Some(true),
            messages: value["messages"].as_array().map_or(0, Vec::len),
        })
    }
}

/// Handle chat completion requests
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::new(Provider::OpenAI.name(), CHAT_COMPLETIONS_PATH);
    let result = forward_chat(&state, &headers, body, ctx.clone()).await;
    finish_request(&state, &ctx, &headers, result)
}

async fn forward_chat(
    state: &AppState,
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

    let summary = RequestSummary::from_body(&body)?;
    let mut ctx = ctx
        .with_streaming(summary.stream)
        .with_key_source(api_key.source);
    if let Some(model) = &summary.model {
        ctx = ctx.with_model(model.clone());
    }

    info!(
        trace_id = %ctx.trace_id,
        model = ?summary.model,
        stream = %summary.stream,
        messages = %summary.messages,
        "Processing chat completion request"
    );
    ctx.log_request_start();

    let accept = summary.stream.then_some("text/event-stream");
    let upstream_headers = build_upstream_headers(provider, &api_key, true, accept)?;
    let url = state.openai.url("/chat/completions");

    let response = state
        .openai
        .send(Method::POST, &url, upstream_headers, Some(body), &ctx)
        .await?;

    if summary.stream {
        state.openai.forward_stream(response, ctx).await
    } else {
        state.openai.forward_buffered(response, &ctx).await
    }
}

pub async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    preflight_response(&state, &headers, PASSTHROUGH_METHODS)
}
