//! Upstream header construction
//!
//! Only the headers built here reach the provider. Client headers are never
//! copied, so the caller's `Authorization` value only travels upstream when
//! it was itself resolved as the upstream key.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::{
    error::{AppError, AppResult},
    middleware::auth::ApiKey,
    proxy::Provider,
};

/// Google's API key header
pub const GOOG_API_KEY: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Build the headers for one upstream request
///
/// `json_body` adds `Content-Type: application/json`; `accept` overrides the
/// `Accept` header (OpenAI streaming asks for `text/event-stream`).
pub fn build_upstream_headers(
    provider: Provider,
    api_key: &ApiKey,
    json_body: bool,
    accept: Option<&'static str>,
) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    match provider {
        Provider::OpenAI => {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose()))
                .map_err(|_| AppError::InvalidApiKey)?;
            headers.insert(AUTHORIZATION, value);
        }
        Provider::Google => {
            let mut value =
                HeaderValue::from_str(api_key.expose()).map_err(|_| AppError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(GOOG_API_KEY, value);
        }
    }

    if json_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(accept) = accept {
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
    }

    Ok(headers)
}
