//! Request and response models for the assistant backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a chat request, streaming or not.
///
/// `thread_id` selects which conversation to continue; `None` serializes as
/// `null` and means "start or use the default thread". `user_id` is the
/// stable per-client identity carried by [`crate::context::ClientContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: i64,
    pub question: String,
    pub thread_id: Option<String>,
}

impl ChatRequest {
    pub fn new(user_id: i64, question: impl Into<String>, thread_id: Option<String>) -> Self {
        Self {
            user_id,
            question: question.into(),
            thread_id,
        }
    }
}

/// Final answer of a non-streaming chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub memories: Vec<Value>,
}

/// One message inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A stored conversation as returned by the conversation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub thread_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Generic `{ data, message }` wrapper the backend puts around
/// conversation responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_round_trips_through_json() {
        // A request built from a conversation's thread id must come back
        // out of the wire format as the identical triple.
        let request = ChatRequest::new(417233, "三日游求推荐", Some("thread-88".to_string()));
        let wire = serde_json::to_string(&request).unwrap();
        let parsed: ChatRequest = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed, request);
        assert_eq!(parsed.user_id, 417233);
        assert_eq!(parsed.question, "三日游求推荐");
        assert_eq!(parsed.thread_id.as_deref(), Some("thread-88"));
    }

    #[test]
    fn absent_thread_id_serializes_as_null() {
        let request = ChatRequest::new(1, "hi", None);
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire["thread_id"].is_null());
    }

    #[test]
    fn chat_reply_tolerates_missing_fields() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert_eq!(reply.response, "ok");
        assert!(reply.thread_id.is_none());
        assert!(reply.memories.is_empty());
    }

    #[test]
    fn conversation_deserializes_from_envelope() {
        let body = r#"{
            "data": [{
                "id": 3,
                "thread_id": "t-3",
                "title": "Kyoto",
                "created_at": "2026-08-01T10:00:00Z",
                "updated_at": "2026-08-02T11:30:00Z",
                "messages": [{"role": "user", "content": "hello"}]
            }],
            "message": "success"
        }"#;
        let envelope: ApiEnvelope<Vec<Conversation>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.message.as_deref(), Some("success"));
        let conversation = &envelope.data[0];
        assert_eq!(conversation.thread_id, "t-3");
        assert_eq!(conversation.title.as_deref(), Some("Kyoto"));
        assert_eq!(conversation.messages.len(), 1);
    }

    #[test]
    fn conversation_tolerates_sparse_rows() {
        let row: Conversation =
            serde_json::from_str(r#"{"id": 1, "thread_id": "t-1"}"#).unwrap();
        assert!(row.title.is_none());
        assert!(row.created_at.is_none());
        assert!(row.messages.is_empty());
    }
}
