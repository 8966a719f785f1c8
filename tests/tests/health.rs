//! Tests for health check and metrics endpoints.

use axum::http::StatusCode;
use integration_tests::setup::TestContext;

#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["clickhouse_connected"], true);
    assert!(body["records_inserted"].is_u64());
}

#[tokio::test]
async fn test_health_reports_store_outage() {
    let ctx = TestContext::new();
    ctx.set_store_failure(true);
    let server = ctx.server();

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["clickhouse_connected"], false);
}

#[tokio::test]
async fn test_ready_follows_store_health() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/health/ready").await.assert_status_ok();

    ctx.set_store_failure(true);
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new();
    ctx.set_store_failure(true);
    let server = ctx.server();

    server.get("/health/live").await.assert_status_ok();
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/add-utm")
        .json(&serde_json::json!({ "utm_source": "web" }))
        .await
        .assert_status(StatusCode::CREATED);
    server.get("/pivot").await.assert_status_ok();

    let body: serde_json::Value = server.get("/metrics").await.json();
    assert!(body["records_received"].as_u64().unwrap() >= 1);
    assert!(body["refreshes"].as_u64().unwrap() >= 1);
    assert!(body["render_latency_mean_ms"].is_number());
}
