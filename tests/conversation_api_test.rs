//! Conversation endpoint tests using wiremock.
//!
//! Verifies the list/add/select/delete calls, the `{data: ...}` envelope
//! unwrapping, and the error-body message resolution priority.

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wayfarer::error::ClientError;
use wayfarer::AssistantClient;

#[tokio::test]
async fn conversation_list_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/list"))
        .and(body_json(serde_json::json!({"user_id": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"id": 1, "thread_id": "t-1", "title": "Kyoto in May"},
                {"id": 2, "thread_id": "t-2"}
            ],
            "message": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    let conversations = client.conversation_list(7).await.unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].thread_id, "t-1");
    assert_eq!(conversations[0].title.as_deref(), Some("Kyoto in May"));
    assert!(conversations[1].title.is_none());
}

#[tokio::test]
async fn conversation_add_returns_the_new_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/add"))
        .and(body_json(serde_json::json!({"user_id": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"id": 9, "thread_id": "t-9"}
        })))
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    let conversation = client.conversation_add(7).await.unwrap();

    assert_eq!(conversation.id, 9);
    assert_eq!(conversation.thread_id, "t-9");
}

#[tokio::test]
async fn conversation_select_returns_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/select"))
        .and(body_json(serde_json::json!({"thread_id": "t-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi there"}
            ]
        })))
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    let messages = client.conversation_select("t-9").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, "assistant");
    assert_eq!(messages[1].content, "hi there");
}

#[tokio::test]
async fn conversation_delete_succeeds_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/delete"))
        .and(body_json(serde_json::json!({"thread_id": "t-9"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "success"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    assert!(client.conversation_delete("t-9").await.is_ok());
}

#[tokio::test]
async fn error_field_wins_over_message_when_detail_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/list"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "db down",
            "message": "ignored"
        })))
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    let err = client.conversation_list(7).await.unwrap_err();

    match err {
        ClientError::Server {
            status,
            message,
            url,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "db down");
            assert!(url.ends_with("/api/v1/conversation/list"));
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_text_error_body_is_used_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/delete"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    let err = client.conversation_delete("t-1").await.unwrap_err();

    match err {
        ClientError::Server {
            status, message, ..
        } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn health_check_reflects_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})),
        )
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn health_check_false_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = AssistantClient::with_base_url(server.uri());
    assert!(!client.health_check().await.unwrap());
}
