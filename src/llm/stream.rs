//! Streaming protocol decoder for SSE chat completions.
//!
//! Turns a response byte stream into a lazy, single-pass sequence of
//! [`StreamEvent`]s. The framing is line-oriented: only lines prefixed
//! `data: ` carry events, `data: [DONE]` terminates, and anything else
//! (blank lines, comments, malformed JSON) is skipped without aborting the
//! decode.
//!
//! Tool calls arrive split across many fragments keyed by a positional
//! index; [`ToolCallAccumulator`] merges them and the decoder flushes the
//! merged calls when the provider signals a finish. Flushing drains the
//! accumulator so a call is never emitted twice.

use std::collections::BTreeMap;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{AccumulatedToolCall, StreamEvent, Usage};

/// Merges tool-call fragments keyed by positional index.
///
/// # Invariants
/// - An empty incoming `id` or `name` never overwrites a known value
/// - `arguments` fragments are always appended, never replaced
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, AccumulatedToolCall>,
}

impl ToolCallAccumulator {
    /// Merge one fragment into the call at `index`.
    pub fn apply(&mut self, index: u32, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) {
        let call = self.calls.entry(index).or_default();
        if let Some(id) = id {
            if !id.is_empty() {
                call.id = id.to_string();
            }
        }
        if let Some(name) = name {
            if !name.is_empty() {
                call.name = name.to_string();
            }
        }
        if let Some(arguments) = arguments {
            call.arguments.push_str(arguments);
        }
    }

    /// Take every accumulated call, in index order.
    pub fn drain(&mut self) -> Vec<AccumulatedToolCall> {
        std::mem::take(&mut self.calls).into_values().collect()
    }

    /// Take only the calls whose id and name both arrived, in index order.
    ///
    /// Used at stream end without a terminator, where a half-received call
    /// is garbage rather than a dispatchable request.
    pub fn drain_complete(&mut self) -> Vec<AccumulatedToolCall> {
        std::mem::take(&mut self.calls)
            .into_values()
            .filter(|c| !c.id.is_empty() && !c.name.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallChunk>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallChunk {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionChunk>,
}

#[derive(Debug, Deserialize)]
struct FunctionChunk {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Process one complete line, pushing decoded events into `out`.
///
/// Returns true when the line was the `[DONE]` terminator and the sequence
/// must end.
fn process_line(line: &str, accumulator: &mut ToolCallAccumulator, out: &mut Vec<StreamEvent>) -> bool {
    let trimmed = line.trim();
    let Some(payload) = trimmed.strip_prefix("data: ") else {
        // Blank lines, SSE comments, other fields: no event, keep going.
        return false;
    };

    if payload == "[DONE]" {
        for call in accumulator.drain() {
            out.push(StreamEvent::ToolCall(call));
        }
        out.push(StreamEvent::Done { usage: None });
        return true;
    }

    let chunk: ChunkResponse = match serde_json::from_str(payload) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream line");
            return false;
        }
    };

    let choice = chunk.choices.into_iter().next();
    if let Some(choice) = &choice {
        if let Some(delta) = &choice.delta {
            if let Some(content) = &delta.content {
                if !content.is_empty() {
                    out.push(StreamEvent::Content(content.clone()));
                }
            }
            if let Some(fragments) = &delta.tool_calls {
                for fragment in fragments {
                    accumulator.apply(
                        fragment.index.unwrap_or(0),
                        fragment.id.as_deref(),
                        fragment.function.as_ref().and_then(|f| f.name.as_deref()),
                        fragment.function.as_ref().and_then(|f| f.arguments.as_deref()),
                    );
                }
            }
        }
    }

    // Usage may ride on any chunk, including one with no choices at all.
    if let Some(usage) = chunk.usage {
        out.push(StreamEvent::Done { usage: Some(usage) });
    }

    if let Some(choice) = &choice {
        if choice.finish_reason.as_deref() == Some("tool_calls") {
            for call in accumulator.drain() {
                out.push(StreamEvent::ToolCall(call));
            }
        }
    }

    false
}

/// Decode an SSE body stream into [`StreamEvent`]s.
///
/// Single-pass and forward-only. Ends after the `[DONE]` terminator (or the
/// underlying stream's end), and stops within one read of `cancel` firing:
/// once the token is cancelled no further events are produced and nothing is
/// raised for the cancellation itself. A transport failure mid-body yields
/// one `Error` event and ends.
pub fn decode_sse_stream<S, E>(
    byte_stream: S,
    cancel: CancellationToken,
) -> impl Stream<Item = StreamEvent> + Send
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();
        let mut accumulator = ToolCallAccumulator::default();
        let mut events: Vec<StreamEvent> = Vec::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                next = byte_stream.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    // Drain every complete line currently buffered. The line
                    // boundary keeps multi-byte characters intact even when
                    // the transport splits them across reads.
                    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&line);
                        let terminated = process_line(&line, &mut accumulator, &mut events);
                        for event in events.drain(..) {
                            yield event;
                        }
                        if terminated {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    yield StreamEvent::Error(format!("Stream read failed: {}", e));
                    return;
                }
                None => break,
            }
        }

        // Stream ended without a [DONE] terminator: emit whatever calls are
        // whole, then the completion marker.
        if !buffer.is_empty() {
            let tail: Vec<u8> = std::mem::take(&mut buffer);
            let line = String::from_utf8_lossy(&tail);
            if !process_line(&line, &mut accumulator, &mut events) {
                for call in accumulator.drain_complete() {
                    events.push(StreamEvent::ToolCall(call));
                }
                events.push(StreamEvent::Done { usage: None });
            }
            for event in events.drain(..) {
                yield event;
            }
            return;
        }
        for call in accumulator.drain_complete() {
            yield StreamEvent::ToolCall(call);
        }
        yield StreamEvent::Done { usage: None };
    }
}
