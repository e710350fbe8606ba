//! OpenAI SSE → AI SDK data stream translation
//!
//! The browser chat client (`useChat`) reads the AI SDK data stream protocol:
//! one part per line, `<type>:<json>\n`. `/api/proxy` calls OpenAI with
//! `stream: true` and rewrites the SSE events into these parts:
//!
//! - `f:{"messageId":...}` once, before anything else
//! - `0:"<text>"` for every content delta
//! - `e:{...}` then `d:{...}` when the upstream finishes
//!
//! Upstream errors are passed through untouched so the relay still aborts.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::SseLineBuffer;

/// Token usage as reported in the finish parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStreamUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Incremental translator from OpenAI chat-completion chunks to data stream parts
#[derive(Debug)]
pub struct DataStreamTranslator {
    message_id: String,
    lines: SseLineBuffer,
    finish_reason: Option<String>,
    usage: DataStreamUsage,
    finished: bool,
}

impl DataStreamTranslator {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            lines: SseLineBuffer::new(),
            finish_reason: None,
            usage: DataStreamUsage::default(),
            finished: false,
        }
    }

    /// The `f:` part that opens the stream
    pub fn start(&self) -> Bytes {
        Bytes::from(part('f', &json!({ "messageId": self.message_id })))
    }

    /// Translate one upstream chunk; `None` when it completed no text part
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Bytes> {
        let mut out = String::new();
        for line in self.lines.feed(chunk) {
            self.handle_line(&line, &mut out);
        }
        (!out.is_empty()).then(|| Bytes::from(out))
    }

    /// Flush at end of upstream. Emits the finish parts unless `[DONE]` already did.
    pub fn finish(&mut self) -> Option<Bytes> {
        let mut out = String::new();
        if let Some(line) = self.lines.finish() {
            self.handle_line(&line, &mut out);
        }
        self.push_finish(&mut out);
        (!out.is_empty()).then(|| Bytes::from(out))
    }

    fn handle_line(&mut self, line: &str, out: &mut String) {
        if self.finished {
            return;
        }
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            // event:, id: and comment lines carry nothing for the client
            return;
        };
        if data == "[DONE]" {
            self.push_finish(out);
            return;
        }

        let event: Value = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping unparseable SSE data line");
                return;
            }
        };

        let choice = &event["choices"][0];
        if let Some(text) = choice["delta"]["content"].as_str() {
            if !text.is_empty() {
                out.push_str(&part('0', &Value::from(text)));
            }
        }
        if let Some(reason) = choice["finish_reason"].as_str() {
            self.finish_reason = Some(reason.to_string());
        }
        if let Some(usage) = event.get("usage").filter(|u| u.is_object()) {
            self.usage = DataStreamUsage {
                prompt_tokens: usage["prompt_tokens"].as_u64(),
                completion_tokens: usage["completion_tokens"].as_u64(),
            };
        }
    }

    fn push_finish(&mut self, out: &mut String) {
        if self.finished {
            return;
        }
        self.finished = true;

        let reason = map_finish_reason(self.finish_reason.as_deref());
        out.push_str(&part(
            'e',
            &json!({ "finishReason": reason, "usage": self.usage, "isContinued": false }),
        ));
        out.push_str(&part(
            'd',
            &json!({ "finishReason": reason, "usage": self.usage }),
        ));
    }
}

/// Map an OpenAI `finish_reason` onto the data stream vocabulary
pub fn map_finish_reason(reason: Option<&str>) -> &'static str {
    match reason {
        Some("stop") => "stop",
        Some("length") => "length",
        Some("content_filter") => "content-filter",
        Some("tool_calls") | Some("function_call") => "tool-calls",
        Some(_) => "other",
        None => "unknown",
    }
}

fn part(kind: char, value: &Value) -> String {
    format!("{}:{}\n", kind, value)
}

/// Wrap an upstream SSE byte stream into a data stream byte stream
pub fn translate<S, E>(upstream: S, message_id: String) -> impl Stream<Item = Result<Bytes, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Send,
{
    async_stream::stream! {
        let mut upstream = upstream;
        let mut translator = DataStreamTranslator::new(message_id);
        let mut failed = false;

        yield Ok(translator.start());

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(out) = translator.feed(&chunk) {
                        yield Ok(out);
                    }
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed {
            if let Some(out) = translator.finish() {
                yield Ok(out);
            }
        }
    }
}
