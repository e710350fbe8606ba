//! Vendor Relay - HTTP relay in front of LLM vendor APIs
//!
//! Browser clients call the relay instead of OpenAI or Google directly. The
//! relay resolves the upstream API key, forwards the request, and either
//! returns the buffered JSON response or relays the upstream event stream
//! chunk by chunk.

pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod streaming;

use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
use crate::middleware::cors::CorsPolicy;
use crate::proxy::{Provider, UpstreamClient};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub cors: CorsPolicy,
    pub openai: UpstreamClient,
    pub google: UpstreamClient,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// The HTTP client has no request timeout: streams stay open for as long
    /// as the upstream keeps them open.
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        Ok(Self::with_client(config, http_client))
    }

    /// Create application state around an existing HTTP client
    pub fn with_client(config: Config, http_client: reqwest::Client) -> Self {
        let cors = CorsPolicy::new(&config.cors_default_origin);
        let openai = UpstreamClient::new(http_client.clone(), Provider::OpenAI, &config);
        let google = UpstreamClient::new(http_client.clone(), Provider::Google, &config);

        Self {
            config,
            http_client,
            cors,
            openai,
            google,
            start_time: Instant::now(),
        }
    }
}
