//! Generic OpenAI passthrough integration tests
//!
//! Anything under /api/openai.com/v1 maps onto the same suffix upstream.

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header as match_header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{bearer, constants::*, TestHarness};

#[tokio::test]
async fn test_get_forwards_path_and_query() {
    let harness = TestHarness::new().await;
    let models = json!({"object": "list", "data": [{"id": "gpt-4o", "object": "model"}]});

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(query_param("limit", "2"))
        .and(match_header(
            "authorization",
            format!("Bearer {}", TEST_OPENAI_API_KEY).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(&models))
        .expect(1)
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .get("/api/openai.com/v1/models")
        .add_query_param("limit", "2")
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), models);
}

#[tokio::test]
async fn test_post_forwards_body_to_suffix() {
    let harness = TestHarness::new().await;
    let request = json!({"model": "text-embedding-3-small", "input": "hello"});
    let embedding = json!({"object": "list", "data": [{"embedding": [0.1, 0.2], "index": 0}]});

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(200).set_body_json(&embedding))
        .expect(1)
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .post("/api/openai.com/v1/embeddings")
        .add_header(header::AUTHORIZATION, bearer(TEST_CALLER_KEY))
        .json(&request)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), embedding);
}

#[tokio::test]
async fn test_stream_flag_outside_chat_is_buffered() {
    let harness = TestHarness::new().await;
    let completion = json!({"id": "resp_1", "output": []});

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&completion))
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .post("/api/openai.com/v1/responses")
        .json(&json!({"model": "gpt-4o", "input": "hi", "stream": true}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
    assert_eq!(response.json::<Value>(), completion);
}

#[tokio::test]
async fn test_upstream_404_is_forwarded() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/models/does-not-exist"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": {"message": "not found"}})),
        )
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .get("/api/openai.com/v1/models/does-not-exist")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_unsupported_method_is_not_forwarded() {
    let harness = TestHarness::new().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .delete("/api/openai.com/v1/files/file-123")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_key_is_401_for_get_and_post() {
    let harness = TestHarness::without_secrets().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.openai)
        .await;

    let get = harness.server.get("/api/openai.com/v1/models").await;
    get.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = get.json();
    assert_eq!(body["code"], "MISSING_API_KEY");
    assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));

    let post = harness
        .server
        .post("/api/openai.com/v1/embeddings")
        .json(&json!({"model": "text-embedding-3-small", "input": "hi"}))
        .await;
    post.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(post.json::<Value>()["code"], "MISSING_API_KEY");

    let root = harness.server.get("/api/openai.com/v1").await;
    root.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(root.json::<Value>()["code"], "MISSING_API_KEY");
}

#[tokio::test]
async fn test_empty_bearer_falls_back_to_server_key() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(match_header(
            "authorization",
            format!("Bearer {}", TEST_OPENAI_API_KEY).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&harness.openai)
        .await;

    let response = harness
        .server
        .get("/api/openai.com/v1/models")
        .add_header(header::AUTHORIZATION, bearer(""))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_empty_bearer_without_server_key_is_401() {
    let harness = TestHarness::without_secrets().await;

    let response = harness
        .server
        .get("/api/openai.com/v1/models")
        .add_header(header::AUTHORIZATION, bearer(""))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "MISSING_API_KEY");
}
