//! Health and metrics endpoint integration tests
//!
//! - GET /health - Service status and configured providers
//! - GET /health/live - Liveness probe
//! - GET /metrics - Prometheus exposition

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestHarness;

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["providers"], json!({"openai": true, "google": true}));
    assert_eq!(body["internal_token_configured"], true);
    assert!(body["timestamp"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_health_without_secrets_is_still_healthy() {
    let harness = TestHarness::without_secrets().await;

    let body: Value = harness.server.get("/health").await.json();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], json!({"openai": false, "google": false}));
    assert_eq!(body["internal_token_configured"], false);
}

#[tokio::test]
async fn test_liveness() {
    let harness = TestHarness::without_secrets().await;

    let response = harness.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    vendor_relay::routes::metrics::init_metrics();
    let harness = TestHarness::new().await;

    harness.server.get("/health/live").await.assert_status_ok();
    let response = harness.server.get("/metrics").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_rejects_post() {
    let harness = TestHarness::without_secrets().await;

    let response = harness.server.post("/health").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
