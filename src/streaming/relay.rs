//! Byte-transparent streaming relay
//!
//! Copies an upstream body stream into the outbound response body chunk by
//! chunk. Chunks are written in order and never merged, since SSE clients
//! rely on chunk framing for token latency. A clean upstream end closes the
//! outbound body. An upstream read error aborts it, so the client sees a
//! failed stream instead of a truncated success.

use std::fmt::Display;

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::proxy::logging::RequestContext;
use crate::routes::metrics::record_stream;

/// Outbound channel depth between the relay task and the response body
const RELAY_CHANNEL_CAPACITY: usize = 16;

/// Why an outbound stream was aborted
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("upstream stream failed: {0}")]
    Upstream(String),

    #[error("downstream consumer went away")]
    DownstreamClosed,
}

/// How a relay run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    Closed,
    Aborted,
}

impl RelayEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayEnd::Closed => "closed",
            RelayEnd::Aborted => "aborted",
        }
    }
}

/// Summary of one relay run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    pub chunks: usize,
    pub bytes: usize,
    pub end: RelayEnd,
}

/// Writable end of an outbound stream
///
/// The relay calls exactly one of `close` or `abort`, once, after its last
/// `write`.
#[async_trait]
pub trait RelaySink: Send {
    /// Write one chunk. An error means the consumer is gone.
    async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError>;

    /// Terminate the stream normally
    async fn close(&mut self);

    /// Terminate the stream as failed
    async fn abort(&mut self, error: RelayError);
}

/// Sink backed by a bounded channel whose receiver feeds a response body
pub struct ChannelSink {
    tx: Option<mpsc::Sender<Result<Bytes, RelayError>>>,
}

impl ChannelSink {
    /// Create a sink and the receiving half of its channel
    pub fn channel() -> (Self, mpsc::Receiver<Result<Bytes, RelayError>>) {
        let (tx, rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        (Self { tx: Some(tx) }, rx)
    }
}

#[async_trait]
impl RelaySink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        let tx = self.tx.as_ref().ok_or(RelayError::DownstreamClosed)?;
        tx.send(Ok(chunk))
            .await
            .map_err(|_| RelayError::DownstreamClosed)
    }

    async fn close(&mut self) {
        // Dropping the sender ends the receiver stream.
        self.tx.take();
    }

    async fn abort(&mut self, error: RelayError) {
        if let Some(tx) = self.tx.take() {
            // Receiver may already be gone; nothing left to signal then.
            let _ = tx.send(Err(error)).await;
        }
    }
}

/// Copy `source` into `sink` until the source ends or fails
pub async fn relay<S, E, K>(mut source: S, sink: &mut K) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
    K: RelaySink + ?Sized,
{
    let mut chunks = 0;
    let mut bytes = 0;

    while let Some(item) = source.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                sink.abort(RelayError::Upstream(e.to_string())).await;
                return RelayOutcome {
                    chunks,
                    bytes,
                    end: RelayEnd::Aborted,
                };
            }
        };

        let len = chunk.len();
        if let Err(e) = sink.write(chunk).await {
            sink.abort(e).await;
            return RelayOutcome {
                chunks,
                bytes,
                end: RelayEnd::Aborted,
            };
        }
        chunks += 1;
        bytes += len;
    }

    sink.close().await;
    RelayOutcome {
        chunks,
        bytes,
        end: RelayEnd::Closed,
    }
}

/// Start relaying `source` on a detached task and return the outbound body
///
/// The body is handed back to the HTTP layer immediately and fills as the
/// task forwards chunks.
pub fn spawn_relay<S, E>(source: S, ctx: RequestContext) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    let (mut sink, rx) = ChannelSink::channel();
    let span = ctx.create_span();

    tokio::spawn(
        async move {
            ctx.log_stream_started();
            let outcome = relay(source, &mut sink).await;
            record_stream(&ctx.endpoint, outcome.end.as_str(), outcome.chunks as u64);

            match outcome.end {
                RelayEnd::Closed => ctx.log_stream_ended(outcome.chunks, outcome.bytes),
                RelayEnd::Aborted => ctx.log_stream_aborted(outcome.chunks, outcome.bytes),
            }
        }
        .instrument(span),
    );

    Body::from_stream(ReceiverStream::new(rx))
}
