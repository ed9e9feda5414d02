//! HTTP client for the travel assistant backend.
//!
//! [`AssistantClient`] owns a reusable `reqwest::Client` and exposes the
//! chat stream plus the conversation management endpoints. It performs no
//! buffering beyond frame reassembly and no retries: streams are
//! interactive and user-visible, so transient failures propagate
//! immediately.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::decoder::FrameDecoder;
use crate::error::{resolve_error_message, ClientError};
use crate::events::StreamEvent;
use crate::models::{ApiEnvelope, ChatMessage, ChatReply, ChatRequest, Conversation};

/// Default backend address; override with `WAYFARER_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Lazy, finite sequence of parsed events from one chat stream.
///
/// The sequence ends either at the server's terminal frame, at natural
/// end-of-stream, or right after the first `Err` item.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// Client for the assistant backend API.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    base_url: String,
    http: reqwest::Client,
}

impl AssistantClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Build a client from `WAYFARER_BASE_URL`, falling back to
    /// [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        match std::env::var("WAYFARER_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open the streaming chat endpoint and return the event stream.
    ///
    /// A non-2xx answer never yields a stream: the whole body is read,
    /// the message resolved per the `detail`/`error`/`message` rule, and a
    /// [`ClientError::Server`] returned. On success the response bytes are
    /// decoded incrementally; a read failure mid-stream surfaces as one
    /// final `Err(ClientError::Stream)` item, after which the stream ends.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream, ClientError> {
        let url = format!("{}/api/v1/chat", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = check_status(response, &url).await?;

        tracing::debug!(%url, thread_id = ?request.thread_id, "chat stream opened");

        let bytes_stream = response.bytes_stream();
        let events = stream::unfold(
            (bytes_stream, FrameDecoder::new(), VecDeque::new(), false),
            |(mut bytes, mut decoder, mut pending, failed)| async move {
                if failed {
                    return None;
                }
                loop {
                    if let Some(event) = pending.pop_front() {
                        return Some((Ok(event), (bytes, decoder, pending, false)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                        Some(Err(e)) => {
                            return Some((
                                Err(ClientError::Stream(e.to_string())),
                                (bytes, decoder, pending, true),
                            ));
                        }
                        None => {
                            decoder.finish();
                            return None;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(events))
    }

    /// One-shot chat: drive the stream to completion and return the final
    /// answer.
    ///
    /// The terminal frame carries the full response, so the non-streaming
    /// call of earlier client revisions is just the stream folded down.
    /// Falls back to the last cumulative chunk when the server closes
    /// without a terminal frame. In-stream `error` frames are logged, not
    /// fatal.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let mut events = self.chat_stream(request).await?;

        let mut last_chunk = String::new();
        while let Some(item) = events.next().await {
            match item? {
                StreamEvent::Chunk { response } => last_chunk = response,
                StreamEvent::End { data } => {
                    return Ok(ChatReply {
                        thread_id: data.thread_id,
                        response: data.response.unwrap_or(last_chunk),
                        route: data.route.unwrap_or_default(),
                        memories: data.memories,
                    });
                }
                StreamEvent::Error { message, .. } => {
                    tracing::warn!(%message, "backend reported an in-stream error");
                }
                _ => {}
            }
        }

        Ok(ChatReply {
            thread_id: request.thread_id.clone(),
            response: last_chunk,
            route: String::new(),
            memories: Vec::new(),
        })
    }

    /// List the caller's stored conversations.
    pub async fn conversation_list(&self, user_id: i64) -> Result<Vec<Conversation>, ClientError> {
        let envelope: ApiEnvelope<Vec<Conversation>> = self
            .post_json(
                "/api/v1/conversation/list",
                &serde_json::json!({ "user_id": user_id }),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Create a new conversation and return it (with its thread id).
    pub async fn conversation_add(&self, user_id: i64) -> Result<Conversation, ClientError> {
        let envelope: ApiEnvelope<Conversation> = self
            .post_json(
                "/api/v1/conversation/add",
                &serde_json::json!({ "user_id": user_id }),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Fetch the message history of one conversation.
    pub async fn conversation_select(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let envelope: ApiEnvelope<Vec<ChatMessage>> = self
            .post_json(
                "/api/v1/conversation/select",
                &serde_json::json!({ "thread_id": thread_id }),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Delete a conversation.
    pub async fn conversation_delete(&self, thread_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/v1/conversation/delete", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "thread_id": thread_id }))
            .send()
            .await?;
        check_status(response, &url).await?;
        Ok(())
    }

    /// Whether the backend answers its health endpoint.
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// POST a JSON body and decode a JSON response, with the shared
    /// non-2xx handling.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        let response = check_status(response, &url).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for AssistantClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a non-success response into [`ClientError::Server`], reading the
/// whole body to resolve a human-readable message.
async fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        resolve_error_message(&body)
    };

    Err(ClientError::Server {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url() {
        let client = AssistantClient::new();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn custom_base_url_loses_trailing_slash() {
        let client = AssistantClient::with_base_url("http://example.test:9000/");
        assert_eq!(client.base_url(), "http://example.test:9000");
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let client = AssistantClient::with_base_url("http://127.0.0.1:59999");
        let request = ChatRequest::new(1, "hello", None);
        let result = client.chat_stream(&request).await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}
