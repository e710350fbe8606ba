//! Internal chat proxy
//!
//! `POST /api/proxy` serves the first-party chat client. It always uses the
//! server-side OpenAI key, always streams, and answers in the AI SDK data
//! stream format instead of raw SSE.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{ApiKey, KeySource},
    proxy::{headers::build_upstream_headers, logging::RequestContext, Provider},
    routes::{finish_request, preflight_response, PROXY_METHODS},
    streaming::{data_stream::translate, spawn_relay},
    AppState,
};

pub const PROXY_PATH: &str = "/api/proxy";

const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

/// Body sent by the chat client
#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Extra client data; accepted and ignored
    #[serde(default)]
    pub data: Option<Value>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

/// Body sent to OpenAI on behalf of the chat client
#[derive(Debug, Serialize)]
pub struct UpstreamChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    stream_options: StreamOptions,
}

impl<'a> UpstreamChatRequest<'a> {
    pub fn from_proxy(request: &'a ProxyRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        }
    }
}

pub async fn proxy(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let ctx = RequestContext::new(Provider::OpenAI.name(), PROXY_PATH);
    let result = forward_proxy(&state, body, ctx.clone()).await;
    finish_request(&state, &ctx, &headers, result)
}

async fn forward_proxy(state: &AppState, body: Bytes, ctx: RequestContext) -> AppResult<Response> {
    let provider = Provider::OpenAI;
    // Caller's bearer is the internal token, never an upstream key.
    let api_key = state
        .config
        .openai_api_key
        .as_deref()
        .map(|key| ApiKey::new(key, KeySource::Server))
        .ok_or(AppError::MissingApiKey {
            provider: provider.display_name(),
            env_var: provider.key_env_var(),
        })?;

    let request: ProxyRequest = serde_json::from_slice(&body)?;
    let ctx = ctx
        .with_model(request.model.clone())
        .with_streaming(true)
        .with_key_source(api_key.source);

    info!(
        trace_id = %ctx.trace_id,
        model = %request.model,
        messages = %request.messages.len(),
        has_data = %request.data.is_some(),
        "Processing internal chat request"
    );
    ctx.log_request_start();

    let upstream_body = serde_json::to_vec(&UpstreamChatRequest::from_proxy(&request))?;
    let upstream_headers =
        build_upstream_headers(provider, &api_key, true, Some("text/event-stream"))?;
    let url = state.openai.url("/chat/completions");

    let response = state
        .openai
        .send(
            Method::POST,
            &url,
            upstream_headers,
            Some(Bytes::from(upstream_body)),
            &ctx,
        )
        .await?;
    let response = state.openai.ensure_success(response, &ctx).await?;

    let message_id = format!("msg-{}", Uuid::new_v4().simple());
    let translated = translate(Box::pin(response.bytes_stream()), message_id);
    let body = spawn_relay(Box::pin(translated), ctx);

    data_stream_response(body)
}

/// 200 response carrying a data stream body
fn data_stream_response(body: Body) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-vercel-ai-data-stream", "v1")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}

pub async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    preflight_response(&state, &headers, PROXY_METHODS)
}
