//! Error types for the Wayfarer client.
//!
//! Three failure classes matter to callers:
//!
//! - [`ClientError::Server`] — the backend answered with a non-2xx status.
//!   The message is resolved from the response body (see
//!   [`resolve_error_message`]).
//! - [`ClientError::Http`] — the request never produced a usable response
//!   (connect failure, TLS, etc.).
//! - [`ClientError::Stream`] — the response started fine but reading the
//!   body stream failed afterwards.
//!
//! Malformed individual frames inside an otherwise healthy stream are *not*
//! errors at this level; the decoder logs and skips them (see
//! `crate::decoder`).

use thiserror::Error;

/// Errors surfaced by [`crate::client::AssistantClient`] and the stream
/// session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connection, DNS, TLS, ...).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-success status code.
    #[error("server error ({status}) at {url}: {message}")]
    Server {
        status: u16,
        url: String,
        message: String,
    },

    /// Reading the response byte stream failed after a successful start.
    #[error("stream read failed: {0}")]
    Stream(String),

    /// A non-streaming response body could not be deserialized.
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Resolve a human-readable message from an error response body.
///
/// The backend usually answers errors with a JSON object carrying one of
/// `detail` (FastAPI), `error`, or `message` — checked in that order. A
/// body that is not JSON, or JSON without any of those fields, is returned
/// verbatim.
pub fn resolve_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.to_string()
}
