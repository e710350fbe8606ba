//! Internal chat proxy integration tests
//!
//! POST /api/proxy is gated by INTERNAL_TOKEN and answers in the AI SDK data
//! stream format.

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header as match_header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{bearer, constants::*, test_data, TestHarness};

fn proxy_request() -> Value {
    json!({
        "messages": [{"role": "user", "content": "Say hello"}],
        "data": {"sessionId": "abc"}
    })
}

async fn mount_chat_stream(harness: &TestHarness) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(match_header(
            "authorization",
            format!("Bearer {}", TEST_OPENAI_API_KEY).as_str(),
        ))
        .and(body_partial_json(json!({"model": "gpt-4", "stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(test_data::CHAT_STREAM),
        )
        .mount(&harness.openai)
        .await;
}

#[tokio::test]
async fn test_valid_token_streams_data_parts() {
    let harness = TestHarness::new().await;
    mount_chat_stream(&harness).await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(TEST_INTERNAL_TOKEN))
        .json(&proxy_request())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-vercel-ai-data-stream"), "v1");
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "text/plain; charset=utf-8"
    );

    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5, "unexpected parts: {text}");

    let start: Value = serde_json::from_str(lines[0].strip_prefix("f:").unwrap()).unwrap();
    assert!(start["messageId"].as_str().unwrap().starts_with("msg-"));
    assert_eq!(lines[1], "0:\"Hello\"");
    assert_eq!(lines[2], "0:\"!\"");

    let finish: Value = serde_json::from_str(lines[4].strip_prefix("d:").unwrap()).unwrap();
    assert_eq!(
        finish,
        json!({
            "finishReason": "stop",
            "usage": {"promptTokens": 12, "completionTokens": 2}
        })
    );
    assert!(lines[3].starts_with("e:"));
}

#[tokio::test]
async fn test_caller_token_never_reaches_upstream() {
    let harness = TestHarness::new().await;
    mount_chat_stream(&harness).await;

    harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(TEST_INTERNAL_TOKEN))
        .json(&proxy_request())
        .await
        .assert_status_ok();

    let requests = harness.openai.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let auth = requests[0].headers.get("authorization").unwrap();
    assert_eq!(auth.to_str().unwrap(), format!("Bearer {}", TEST_OPENAI_API_KEY));

    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("data").is_none());
    assert_eq!(sent["stream_options"]["include_usage"], true);
}

#[tokio::test]
async fn test_wrong_token_is_401() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer("not-the-token"))
        .json(&proxy_request())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Unauthorized");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let harness = TestHarness::new().await;

    let response = harness.server.post("/api/proxy").json(&proxy_request()).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unconfigured_token_rejects_everything() {
    let harness = TestHarness::with_config(|config| {
        config.openai_api_key = Some(TEST_OPENAI_API_KEY.to_string());
    })
    .await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(""))
        .json(&proxy_request())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upstream_failure_is_reported_before_streaming() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(TEST_INTERNAL_TOKEN))
        .json(&proxy_request())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_valid_token_without_openai_key_is_401() {
    let harness = TestHarness::with_config(|config| {
        config.internal_token = Some(TEST_INTERNAL_TOKEN.to_string());
    })
    .await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(TEST_INTERNAL_TOKEN))
        .json(&proxy_request())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_API_KEY");
    assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_empty_bearer_is_rejected_when_token_configured() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer(""))
        .json(&proxy_request())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_rejection_is_counted() {
    vendor_relay::routes::metrics::init_metrics();
    let harness = TestHarness::new().await;

    harness
        .server
        .post("/api/proxy")
        .add_header(header::AUTHORIZATION, bearer("not-the-token"))
        .json(&proxy_request())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let exposition = harness.server.get("/metrics").await.text();
    assert!(
        exposition.lines().any(|line| line.starts_with("relay_requests_total{")
            && line.contains("route=\"/api/proxy\"")
            && line.contains("status=\"401\"")),
        "no 401 sample for /api/proxy in:\n{exposition}"
    );
}
