//! Moderation transport tests
//!
//! These tests point `OpenAiTransport` at a wiremock server so the full path
//! from HTTP response to `VerificationOutcome` runs without network access.

use postgate::{ModerationOrchestrator, ModerationRequest, ModerationTransport, OpenAiTransport, TransportError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Chat-completions mock server
struct ModerationApiMock {
    server: MockServer,
}

impl ModerationApiMock {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn transport(&self, api_key: Option<&str>) -> OpenAiTransport {
        OpenAiTransport::new(api_key.map(str::to_string), self.server.uri(), 600).unwrap()
    }

    fn orchestrator(&self, timeout: Duration) -> ModerationOrchestrator {
        ModerationOrchestrator::new(Arc::new(self.transport(Some("sk-test"))), timeout)
    }

    async fn reply_with_content(&self, content: &str) {
        self.reply_with_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .await;
    }

    async fn reply_with_json(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn reply_with_status(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_request_carries_fixed_contract_and_bearer_token() {
    let mock = ModerationApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "Заголовок: Hello\n\nСодержание: World"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "{\"approved\": true, \"reason\": \"Safe\"}"}}]
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let text = mock
        .transport(Some("sk-test"))
        .complete(&ModerationRequest::for_post("Hello", "World"))
        .await
        .unwrap();

    assert_eq!(text, r#"{"approved": true, "reason": "Safe"}"#);

    let received = mock.server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_approval_round_trip() {
    let mock = ModerationApiMock::new().await;
    mock.reply_with_content(r#"{"approved": true, "reason": "Safe"}"#)
        .await;

    let outcome = mock
        .orchestrator(Duration::from_secs(5))
        .verify("Title", "Body")
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "approved: Safe");
}

#[tokio::test]
async fn test_commentary_around_json_is_tolerated() {
    let mock = ModerationApiMock::new().await;
    mock.reply_with_content(
        "Вот результат проверки:\n```json\n{\"approved\": false, \"reason\": \"Реклама\"}\n```",
    )
    .await;

    let outcome = mock
        .orchestrator(Duration::from_secs(5))
        .verify("Title", "Body")
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "rejected: Реклама");
}

#[tokio::test]
async fn test_server_error_fails_closed() {
    let mock = ModerationApiMock::new().await;
    mock.reply_with_status(500, "internal error").await;

    let outcome = mock
        .orchestrator(Duration::from_secs(5))
        .verify("Title", "Body")
        .await;

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("verification failed:"));
    assert!(outcome.message.contains("HTTP 500"));
}

#[tokio::test]
async fn test_missing_content_is_malformed() {
    let mock = ModerationApiMock::new().await;
    mock.reply_with_json(json!({"choices": []})).await;

    let err = mock
        .transport(Some("sk-test"))
        .complete(&ModerationRequest::for_post("Title", "Body"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let mock = ModerationApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "choices": [{"message": {"content": "{\"approved\": true}"}}]
                }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock.server)
        .await;

    let outcome = mock
        .orchestrator(Duration::from_millis(100))
        .verify("Title", "Body")
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "verification failed: moderation request timed out after 100ms"
    );
}

#[tokio::test]
async fn test_missing_api_key_never_reaches_the_server() {
    let mock = ModerationApiMock::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock.server)
        .await;

    let orchestrator =
        ModerationOrchestrator::new(Arc::new(mock.transport(None)), Duration::from_secs(5));
    let outcome = orchestrator.verify("Title", "Body").await;

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("verification failed:"));
}
