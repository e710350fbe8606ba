//! Proxy module
//!
//! Handles request forwarding to the upstream LLM providers.

pub mod google;
pub mod headers;
pub mod logging;
pub mod upstream;

pub use upstream::UpstreamClient;

/// Upstream LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Google,
}

impl Provider {
    /// Short name for logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Google => "google",
        }
    }

    /// Name used in user-facing error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Google => "Google AI",
        }
    }

    /// Environment variable holding the server-side key
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Google => "GOOGLE_GENERATIVE_AI_API_KEY",
        }
    }
}
