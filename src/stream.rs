//! Responses event stream -> Chat Completions chunk stream.
//!
//! Every line is mapped on its own. No state is carried between lines, so a
//! transport may buffer, split or pipe lines however it likes.

use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::models::chat;
use crate::models::responses::{self as resp, Envelope, OutputItem, ResponsesUsage};

/// Stream terminator line; forwarded untouched.
pub const DONE_LINE: &str = "data: [DONE]";

/// Longest unterminated line [`SseLineBuffer`] will hold (1 MiB).
pub const MAX_PENDING_LINE: usize = 1024 * 1024;

/// Map one line of a Responses event stream to the equivalent Chat chunk line.
///
/// - `""` and `data: [DONE]` are returned as-is.
/// - Lines without a `data:` prefix are returned as-is.
/// - `data: null` is treated as an event with no fields.
/// - Any other payload that is not a JSON object is returned as-is (not an error).
/// - Otherwise the event is rewritten into a `chat.completion.chunk` and
///   re-framed as `data: <json>`.
///
/// Only encoding the rewritten chunk can fail.
pub fn map_stream_line(line: &str) -> Result<String> {
    if line.is_empty() || line == DONE_LINE {
        return Ok(line.to_string());
    }

    let Some(payload) = line
        .strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))
    else {
        return Ok(line.to_string());
    };

    let event: Value = match serde_json::from_str(payload) {
        Ok(v @ Value::Object(_)) => v,
        Ok(Value::Null) => Value::Object(Default::default()),
        Ok(_) | Err(_) => {
            tracing::debug!(line_len = line.len(), "forwarding unparseable stream line as-is");
            return Ok(line.to_string());
        }
    };

    let chunk = event_to_chunk(&event);
    let json = serde_json::to_string(&chunk).map_err(BridgeError::EncodeChunk)?;
    Ok(format!("data: {json}"))
}

/// Build the Chat chunk for one decoded Responses event.
pub fn event_to_chunk(event: &Value) -> chat::ChatCompletionChunk {
    let envelope = Envelope::decode(event);

    let mut delta = chat::ChatDelta::default();
    for item in resp::decode_output(event).unwrap_or_default() {
        match item {
            OutputItem::Message(message) => {
                if let Some(role) = message.role {
                    delta.role = Some(role);
                }
                // Last text part wins, across parts and across message items.
                if let Some(text) = message.texts.into_iter().last() {
                    delta.content = Some(text);
                }
            }
            OutputItem::FunctionCall(call) => {
                delta.tool_calls = Some(vec![chat::ToolCallDelta {
                    index: 0,
                    id: call.call_id,
                    call_type: "function".to_string(),
                    function: chat::FunctionCallDelta {
                        name: call.name,
                        arguments: call.arguments,
                    },
                }]);
            }
            OutputItem::FunctionCallOutput(_) | OutputItem::Ignored => {}
        }
    }

    let usage = ResponsesUsage::decode(event).map(|u| chat::ChunkUsage {
        prompt_tokens: u.input_tokens,
        completion_tokens: u.output_tokens,
        total_tokens: u.input_tokens.zip(u.output_tokens).map(|(p, c)| p.saturating_add(c)),
    });

    chat::ChatCompletionChunk {
        id: envelope.id,
        object: "chat.completion.chunk".to_string(),
        created: envelope.created,
        model: envelope.model,
        choices: vec![chat::ChatStreamChoice {
            index: 0,
            delta,
            finish_reason: envelope.finish_reason,
        }],
        usage,
    }
}

/// Map a fully buffered event-stream body line by line. Line order and a
/// trailing newline are preserved; `\r\n` endings are normalized to `\n`.
pub fn map_stream_body(body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        out.push_str(&map_stream_line(line)?);
    }
    Ok(out)
}

/// Incremental line splitter for an upstream byte stream.
///
/// Bytes are held until a full line is available; each complete line is mapped
/// with [`map_stream_line`] and emitted with a `\n` terminator. A partial line
/// longer than [`MAX_PENDING_LINE`] is an error.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Feed a chunk; returns the mapped output for every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Bytes> {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let decoded = String::from_utf8_lossy(&raw[..pos]);
            let line = decoded.strip_suffix('\r').unwrap_or(&decoded);
            out.push_str(&map_stream_line(line)?);
            out.push('\n');
        }
        if self.pending.len() > MAX_PENDING_LINE {
            self.pending.clear();
            return Err(BridgeError::LineTooLong {
                limit: MAX_PENDING_LINE,
            });
        }
        Ok(Bytes::from(out))
    }

    /// Flush a trailing unterminated line at end of stream.
    pub fn finish(&mut self) -> Result<Bytes> {
        if self.pending.is_empty() {
            return Ok(Bytes::new());
        }
        let raw = std::mem::take(&mut self.pending);
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.strip_suffix('\r').unwrap_or(&decoded);
        Ok(Bytes::from(map_stream_line(line)?))
    }
}

/// Remap an upstream Responses event stream into a Chat chunk stream.
///
/// Upstream errors, chunk encoding failures and oversized lines end the stream
/// with an `io::Error`.
pub fn remap_event_stream<S, E>(upstream: S) -> impl Stream<Item = io::Result<Bytes>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    futures_util::stream::unfold(
        (upstream, SseLineBuffer::default(), false),
        |(mut upstream, mut buffer, done)| async move {
            if done {
                return None;
            }
            let (mapped, done) = match upstream.next().await {
                Some(Ok(chunk)) => (buffer.push(&chunk), false),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "upstream stream failed");
                    let err = io::Error::other(e.to_string());
                    return Some((Err(err), (upstream, buffer, true)));
                }
                None => (buffer.finish(), true),
            };
            match mapped {
                Ok(bytes) => Some((Ok(bytes), (upstream, buffer, done))),
                Err(e) => Some((Err(io::Error::other(e)), (upstream, buffer, true))),
            }
        },
    )
}
