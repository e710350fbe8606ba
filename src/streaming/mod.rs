//! Streaming support
//!
//! - [`relay`]: the byte-transparent upstream → client copy loop
//! - [`data_stream`]: OpenAI SSE → AI SDK data stream translation for `/api/proxy`
//! - [`SseLineBuffer`]: reassembles SSE lines split across chunks

pub mod data_stream;
pub mod relay;

pub use relay::{spawn_relay, RelayError, RelaySink};

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// # Example
/// ```
/// use vendor_relay::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// let lines1 = buffer.feed(b"data: {\"content\":\"hel");
/// assert!(lines1.is_empty());
///
/// let lines2 = buffer.feed(b"lo\"}\n");
/// assert_eq!(lines2, vec!["data: {\"content\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    // Raw bytes, so a UTF-8 sequence split across chunks survives.
    incomplete: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every line completed by them.
    ///
    /// Lines are returned without their `\n` or `\r\n` terminator. Blank
    /// lines (SSE event separators) are dropped. Invalid UTF-8 is replaced.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.incomplete.extend_from_slice(bytes);

        let mut complete_lines = Vec::new();
        while let Some(newline_pos) = self.incomplete.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.incomplete.drain(..=newline_pos).collect();
            let line = decode_line(&raw[..newline_pos]);
            if !line.is_empty() {
                complete_lines.push(line);
            }
        }

        complete_lines
    }

    /// Take whatever is left without a terminator (end of stream).
    pub fn finish(&mut self) -> Option<String> {
        let rest = decode_line(&std::mem::take(&mut self.incomplete));
        (!rest.is_empty()).then_some(rest)
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
