//! Integration tests for `OpenAiClient` using wiremock HTTP mocks.

use rankinai_llm::{LlmError, LlmProvider, OpenAiClient, RetryPolicy};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenAiClient {
    OpenAiClient::with_base_url("test-key", "gpt-4o-mini", 5, base_url)
        .expect("client construction should not fail")
        .with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn send_returns_reply_text_and_usage() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "  1. Acme UltraMat Pro\n2. Manduka PRO  " } }
        ],
        "usage": { "prompt_tokens": 42, "completion_tokens": 17, "total_tokens": 59 }
    });

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "be helpful" },
                { "role": "user", "content": "best yoga mats?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/v1", server.uri()));
    let reply = client
        .send("be helpful", "best yoga mats?")
        .await
        .expect("should parse reply");

    assert_eq!(reply.text, "1. Acme UltraMat Pro\n2. Manduka PRO");
    let usage = reply.usage.expect("usage present");
    assert_eq!(usage.prompt_tokens, 42);
    assert_eq!(usage.completion_tokens, 17);
    assert_eq!(usage.total_tokens, 59);
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "Rate limit reached", "type": "requests" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.send("s", "u").await.unwrap_err();
    match err {
        LlmError::RateLimited(msg) => assert_eq!(msg, "Rate limit reached"),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_api_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url("bad-key", "gpt-4o-mini", 5, &server.uri())
        .expect("client construction should not fail")
        .with_retry(RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 0,
        });
    let err = client.send("s", "u").await.unwrap_err();
    assert!(
        matches!(err, LlmError::Api { status: 401, ref message } if message == "Incorrect API key provided"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "content": "Try the Acme UltraMat Pro." } } ]
        })))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url("test-key", "gpt-4o-mini", 5, &server.uri())
        .expect("client construction should not fail")
        .with_retry(RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 0,
        });
    let reply = client.send("s", "u").await.expect("should succeed after retries");
    assert_eq!(reply.text, "Try the Acme UltraMat Pro.");
    assert!(reply.usage.is_none());
}

#[tokio::test]
async fn empty_content_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "content": "   " } } ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.send("s", "u").await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse("openai")));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.send("s", "u").await.unwrap_err();
    assert!(matches!(err, LlmError::Deserialize { .. }));
}
