//! Typed events decoded from the chat stream.
//!
//! The backend streams newline-delimited frames whose payload is a JSON
//! object tagged by a `type` field:
//!
//! - `chunk` — incremental answer text; `data.response` is the *cumulative*
//!   text so far, not a delta to append.
//! - `node` — a workflow progress marker (`router`, `planner`, `executor`,
//!   ...) with node-specific data.
//! - `end` — terminal; the stream is logically complete. Carries the final
//!   response and the thread id to continue the conversation with.
//! - `error` — a backend-reported problem. Informational only: it does not
//!   by itself end the stream.
//!
//! The set of types is not closed. Anything unrecognized is forwarded to
//! the consumer unchanged as [`StreamEvent::Other`] rather than dropped.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A single parsed event from the chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Cumulative answer text so far. Replaces, never appends to, what was
    /// previously rendered.
    Chunk { response: String },
    /// Workflow node progress marker.
    Node { node: String, data: Value },
    /// Terminal event; the stream is complete.
    End { data: EndData },
    /// Backend-reported error. Non-terminal; carries diagnostic data.
    Error { message: String, data: Value },
    /// Unrecognized event type, forwarded as-is.
    Other { event_type: String, payload: Value },
}

/// Payload of the terminal `end` event.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EndData {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub memories: Vec<Value>,
}

/// A frame payload that could not be parsed as an event.
///
/// Swallowed at the decoder level: one bad frame never aborts the stream.
#[derive(Debug, Error)]
#[error("malformed frame payload: {reason}")]
pub struct DecodeError {
    pub reason: String,
}

impl StreamEvent {
    /// Parse a frame payload into a typed event.
    ///
    /// The payload must be a JSON object with a string `type` tag. Unknown
    /// tags are preserved in [`StreamEvent::Other`]; only invalid JSON or a
    /// missing/non-string tag is an error.
    pub fn parse(payload: &str) -> Result<StreamEvent, DecodeError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| DecodeError {
            reason: e.to_string(),
        })?;

        let event_type = match value.get("type").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None => {
                return Err(DecodeError {
                    reason: "missing `type` field".to_string(),
                })
            }
        };

        let event = match event_type.as_str() {
            "chunk" => StreamEvent::Chunk {
                response: extract_response(&value),
            },
            "node" => StreamEvent::Node {
                node: value
                    .get("node")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                data: value.get("data").cloned().unwrap_or(Value::Null),
            },
            "end" => {
                let data = match value.get("data") {
                    Some(d) if !d.is_null() => {
                        serde_json::from_value(d.clone()).map_err(|e| DecodeError {
                            reason: format!("bad end payload: {e}"),
                        })?
                    }
                    _ => EndData::default(),
                };
                StreamEvent::End { data }
            }
            "error" => StreamEvent::Error {
                message: extract_error_message(&value),
                data: value.get("data").cloned().unwrap_or(Value::Null),
            },
            _ => StreamEvent::Other {
                event_type,
                payload: value,
            },
        };

        Ok(event)
    }

    /// Whether this event logically ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End { .. })
    }
}

/// Pull the cumulative text out of a `chunk` event.
///
/// The backend nests it at `data.response`; older revisions put `response`
/// or `content` at the top level, so those are accepted too.
fn extract_response(value: &Value) -> String {
    value
        .get("data")
        .and_then(|d| d.get("response"))
        .or_else(|| value.get("response"))
        .or_else(|| value.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn extract_error_message(value: &Value) -> String {
    value
        .get("data")
        .and_then(|d| d.get("message").or_else(|| d.get("detail")))
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("unknown backend error")
        .to_string()
}
