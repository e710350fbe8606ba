//! Upstream client
//!
//! Sends the rewritten request to a provider and turns its response into the
//! outbound response: a single buffered JSON body, or a relayed stream.

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    proxy::{logging::RequestContext, Provider},
    streaming::spawn_relay,
};

/// Client for one upstream provider
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    provider: Provider,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client, provider: Provider, config: &Config) -> Self {
        let base_url = match provider {
            Provider::OpenAI => &config.openai_api_url,
            Provider::Google => &config.google_api_url,
        };
        Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Full upstream URL for a path (and optional query) below the base
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request upstream. Transport failures become `AppError::HttpError`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
        ctx: &RequestContext,
    ) -> AppResult<reqwest::Response> {
        ctx.log_upstream_request(method.as_str(), url, body.as_ref().map(|b| b.len()));

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            ctx.log_connection_error(&e.to_string(), url);
            AppError::HttpError(e)
        })?;

        ctx.log_upstream_response(response.status().as_u16());
        Ok(response)
    }

    /// Fail with the upstream status and body text unless the response succeeded
    ///
    /// An unreadable error body is logged and reported as empty; the upstream
    /// status still decides the outcome.
    pub async fn ensure_success(
        &self,
        response: reqwest::Response,
        ctx: &RequestContext,
    ) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                ctx.log_error(&format!(
                    "Failed to read {} error body ({}): {}",
                    self.provider.display_name(),
                    status.as_u16(),
                    e
                ));
                String::new()
            }
        };
        Err(AppError::Upstream {
            provider: self.provider.display_name(),
            status,
            body,
        })
    }

    /// Buffered forwarding: read the whole body, parse it as JSON, re-emit it
    /// with the upstream status.
    pub async fn forward_buffered(
        &self,
        response: reqwest::Response,
        ctx: &RequestContext,
    ) -> AppResult<Response> {
        let response = self.ensure_success(response, ctx).await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let data: Value = serde_json::from_slice(&bytes)?;

        Ok((status, Json(data)).into_response())
    }

    /// Streaming forwarding: relay the body as-is on a detached task.
    ///
    /// A non-success status is reported as a JSON error before any byte is
    /// relayed.
    pub async fn forward_stream(
        &self,
        response: reqwest::Response,
        ctx: RequestContext,
    ) -> AppResult<Response> {
        let response = self.ensure_success(response, &ctx).await?;
        let body = spawn_relay(Box::pin(response.bytes_stream()), ctx);
        event_stream_response(body)
    }
}

/// 200 response carrying an event stream body
pub fn event_stream_response(body: Body) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}
