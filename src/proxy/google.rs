//! Google Generative Language route helpers
//!
//! The route's trailing segment is `MODEL` or `MODEL:ACTION`. Only the two
//! content-generation actions are recognised; anything else stays part of
//! the model name and the action defaults to `generateContent`.
//!
//! The model arrives percent-decoded, so it is checked against a plain name
//! pattern before it is placed in the upstream path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static MODEL_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+):(generateContent|streamGenerateContent)$").expect("valid regex")
});

/// A single path segment: no `/`, `?`, `#`, `%` or leading dot
static MODEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:-]*$").expect("valid regex"));

/// Google model action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleAction {
    GenerateContent,
    StreamGenerateContent,
}

impl GoogleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoogleAction::GenerateContent => "generateContent",
            GoogleAction::StreamGenerateContent => "streamGenerateContent",
        }
    }
}

/// Model and action parsed from the route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleTarget {
    pub model: String,
    pub action: GoogleAction,
}

impl GoogleTarget {
    /// Parse the decoded route segment, rejecting models that would leave
    /// the `/models/` path upstream
    pub fn parse(segment: &str) -> AppResult<Self> {
        let target = match MODEL_ACTION.captures(segment) {
            Some(caps) => {
                let action = if &caps[2] == "streamGenerateContent" {
                    GoogleAction::StreamGenerateContent
                } else {
                    GoogleAction::GenerateContent
                };
                Self {
                    model: caps[1].to_string(),
                    action,
                }
            }
            None => Self {
                model: segment.to_string(),
                action: GoogleAction::GenerateContent,
            },
        };

        if !MODEL_NAME.is_match(&target.model) {
            return Err(AppError::BadRequest(format!(
                "invalid model name: {:?}",
                target.model
            )));
        }

        Ok(target)
    }

    /// Path below the API base, e.g. `/models/gemini-pro:generateContent`
    pub fn upstream_path(&self) -> String {
        format!("/models/{}:{}", self.model, self.action.as_str())
    }
}

/// Inbound query string, reduced to what Google should see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleQuery {
    /// Query to forward, without `model` and without the leading `?`
    pub forwarded: Option<String>,
    /// `alt=sse` was requested
    pub sse: bool,
}

impl GoogleQuery {
    pub fn from_raw(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default();
        let mut sse = false;
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut kept = 0;

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            if key == "model" {
                continue;
            }
            if key == "alt" && value == "sse" {
                sse = true;
            }
            serializer.append_pair(&key, &value);
            kept += 1;
        }

        Self {
            forwarded: (kept > 0).then(|| serializer.finish()),
            sse,
        }
    }

    /// `?query` suffix for the upstream URL, or empty
    pub fn suffix(&self) -> String {
        self.forwarded
            .as_deref()
            .map(|q| format!("?{}", q))
            .unwrap_or_default()
    }
}
