//! Stream aggregator: accumulates completion fragments and renders throttled partial text.
//!
//! Consumption is sequential. After every `render_every_n`-th fragment the sink is awaited
//! before the next fragment is pulled, so a slow display slows the stream down instead of
//! buffering unrendered text. Stream failures never cross this boundary; they become text.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::StreamError;

/// Marker appended to partial renders while generation is still running.
pub const DEFAULT_PROGRESS_MARKER: &str = "*";
/// Render after every third fragment.
pub const DEFAULT_RENDER_EVERY_N: usize = 3;
/// Prefix of the result when the stream delivers a malformed chunk.
pub const PROTOCOL_ERROR_TAG: &str = "LLM Error: ";
/// Prefix of the result when the stream fails before producing any text.
pub const UNKNOWN_ERROR_TAG: &str = "LLM Unknown Error: ";

/// Live display for one pending message, e.g. a Telegram message edited in place.
#[async_trait]
pub trait RenderSink: Send + Sync {
    /// Replaces the displayed text with a partial render.
    async fn render(&self, text: &str) -> anyhow::Result<()>;

    /// Replaces the displayed text with the final text. Defaults to [`RenderSink::render`].
    async fn render_final(&self, text: &str) -> anyhow::Result<()> {
        self.render(text).await
    }
}

/// Throttling and marker settings for one or more aggregation passes.
#[derive(Debug, Clone)]
pub struct StreamAggregator {
    render_every_n: usize,
    marker: String,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_EVERY_N, DEFAULT_PROGRESS_MARKER)
    }
}

impl StreamAggregator {
    /// A `render_every_n` of zero is treated as one.
    pub fn new(render_every_n: usize, marker: impl Into<String>) -> Self {
        Self {
            render_every_n: render_every_n.max(1),
            marker: marker.into(),
        }
    }

    pub fn render_every_n(&self) -> usize {
        self.render_every_n
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Consumes `fragments` to the end and returns the accumulated text (no marker).
    ///
    /// - Protocol error: returns [`PROTOCOL_ERROR_TAG`] + message.
    /// - Transport error after some text arrived: returns the partial text.
    /// - Transport error before any text: returns [`UNKNOWN_ERROR_TAG`] + message.
    ///
    /// A failing sink is logged and does not stop consumption.
    pub async fn aggregate<S>(&self, fragments: S, sink: Option<&dyn RenderSink>) -> String
    where
        S: Stream<Item = Result<String, StreamError>>,
    {
        let mut fragments = std::pin::pin!(fragments);
        let mut accumulated = String::new();
        let mut fragment_count: usize = 0;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    fragment_count += 1;
                    accumulated.push_str(&fragment);
                    if fragment_count % self.render_every_n == 0 {
                        if let Some(sink) = sink {
                            let partial = format!("{}{}", accumulated, self.marker);
                            if let Err(e) = sink.render(&partial).await {
                                warn!(error = %e, fragment_count, "Partial render failed");
                            }
                        }
                    }
                }
                Err(StreamError::Protocol(message)) => {
                    warn!(error = %message, fragment_count, "Malformed completion chunk");
                    return format!("{PROTOCOL_ERROR_TAG}{message}");
                }
                Err(StreamError::Transport(message)) => {
                    if accumulated.is_empty() {
                        warn!(error = %message, fragment_count, "Completion stream failed before any text");
                        return format!("{UNKNOWN_ERROR_TAG}{message}");
                    }
                    warn!(
                        error = %message,
                        fragment_count,
                        partial_len = accumulated.len(),
                        "Completion stream failed; returning partial text"
                    );
                    return accumulated;
                }
            }
        }

        debug!(fragment_count, "Completion stream finished");
        accumulated
    }
}

/// [`StreamAggregator::aggregate`] with the default marker.
pub async fn aggregate<S>(fragments: S, sink: Option<&dyn RenderSink>, render_every_n: usize) -> String
where
    S: Stream<Item = Result<String, StreamError>>,
{
    StreamAggregator::new(render_every_n, DEFAULT_PROGRESS_MARKER)
        .aggregate(fragments, sink)
        .await
}
