//! Configuration management for Vendor Relay
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards. Handlers receive it through `AppState`.

use anyhow::{Context, Result};
use std::env;

/// Default origin echoed in CORS headers when the caller sends none
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3001";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// OpenAI API base URL (including the `/v1` segment)
    pub openai_api_url: String,
    /// Server-side OpenAI key, used when the caller supplies none
    pub openai_api_key: Option<String>,

    /// Google Generative Language API base URL (including `/v1beta`)
    pub google_api_url: String,
    /// Server-side Google key, used when the caller supplies none
    pub google_api_key: Option<String>,

    /// Static bearer token guarding `/api/proxy`
    pub internal_token: Option<String>,

    /// Origin echoed when a request carries no `Origin` header
    pub cors_default_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),

            google_api_url: env::var("GOOGLE_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            google_api_key: non_empty_var("GOOGLE_GENERATIVE_AI_API_KEY"),

            internal_token: non_empty_var("INTERNAL_TOKEN"),

            cors_default_origin: env::var("CORS_DEFAULT_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    /// Configuration pointing both providers at the given base URLs, with no
    /// secrets set. Used by tests to aim the relay at mock upstreams.
    pub fn for_upstreams(openai_api_url: &str, google_api_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            openai_api_url: openai_api_url.trim_end_matches('/').to_string(),
            openai_api_key: None,
            google_api_url: google_api_url.trim_end_matches('/').to_string(),
            google_api_key: None,
            internal_token: None,
            cors_default_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

/// Read an environment variable, treating an empty value as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
