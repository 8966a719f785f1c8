//! Tests for the pivot endpoints.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};

fn texts(row: &Value) -> Vec<String> {
    row["cells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap().to_string())
        .collect()
}

fn values(row: &Value) -> Vec<u64> {
    row["cells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["value"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_campaign_depth_by_default() {
    let ctx = TestContext::with_records(fixtures::spring_campaign());
    let server = ctx.server();

    let response = server.get("/pivot").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["depth"], "campaign");
    assert_eq!(body["published"], true);

    let grid = &body["grid"];
    assert_eq!(grid["record_count"], 3);

    let headers = grid["header_rows"].as_array().unwrap();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers[0]["label"], "Source");
    assert_eq!(texts(&headers[0]), vec!["web", "Total", "Grand Total"]);
    assert_eq!(headers[0]["cells"][0]["colspan"], 2);
    assert_eq!(headers[0]["cells"][2]["rowspan"], 3);
    assert_eq!(texts(&headers[1]), vec!["email", "Total"]);
    assert_eq!(headers[1]["cells"][1]["rowspan"], 2);
    assert_eq!(texts(&headers[2]), vec!["spring"]);

    let rows = grid["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["day"], "2024-03-01");
    assert_eq!(rows[0]["label"], "01-03-2024");
    // spring, email Total, web Total, Grand Total
    assert_eq!(values(&rows[0]), vec![3, 3, 3, 3]);
}

#[tokio::test]
async fn test_source_depth_has_no_subtotals() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    let response = server.get("/pivot").add_query_param("depth", "source").await;
    response.assert_status_ok();
    let body: Value = response.json();

    let headers = body["grid"]["header_rows"].as_array().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(texts(&headers[0]), vec!["ads", "web", "Grand Total"]);

    let rows = body["grid"]["rows"].as_array().unwrap();
    assert_eq!(values(&rows[0]), vec![0, 3, 3]);
    assert_eq!(values(&rows[1]), vec![1, 1, 2]);
}

#[tokio::test]
async fn test_term_depth_uses_sentinels() {
    let ctx = TestContext::with_records(fixtures::spring_campaign());
    let server = ctx.server();

    let response = server.get("/pivot").add_query_param("depth", "term").await;
    response.assert_status_ok();
    let body: Value = response.json();

    let headers = body["grid"]["header_rows"].as_array().unwrap();
    assert_eq!(headers.len(), 4);
    assert_eq!(texts(&headers[3]), vec!["unknown-term"]);
}

#[tokio::test]
async fn test_grand_total_matches_daily_record_count() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    let body: Value = server
        .get("/pivot")
        .add_query_param("depth", "term")
        .await
        .json();

    let rows = body["grid"]["rows"].as_array().unwrap();
    let grand_totals: Vec<u64> = rows
        .iter()
        .map(|r| *values(r).last().unwrap())
        .collect();
    assert_eq!(grand_totals, vec![3, 2]);
}

#[tokio::test]
async fn test_filter_flags_select_depth() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    let response = server
        .get("/pivot")
        .add_query_param("source", "on")
        .add_query_param("medium", "on")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["depth"], "medium");
}

#[tokio::test]
async fn test_gapped_flags_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/pivot")
        .add_query_param("source", "on")
        .add_query_param("campaign", "on")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_unknown_depth_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/pivot").add_query_param("depth", "country").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_empty_store_renders_label_column_only() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server.get("/pivot").await.json();
    let grid = &body["grid"];
    assert_eq!(grid["record_count"], 0);
    assert!(grid["rows"].as_array().unwrap().is_empty());
    for row in grid["header_rows"].as_array().unwrap() {
        assert!(row["cells"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_snapshot_skips_malformed_records() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let payload = json!([
        { "utm_source": "web", "utm_medium": "email", "created_at": "2024-03-01T10:00:00Z" },
        { "utm_source": 5 },
        { "utm_source": "ads", "created_at": "2024-03-01T11:00:00Z" },
        { "utm_campaign": "y".repeat(300) },
        {}
    ]);

    let response = server
        .post("/pivot")
        .add_query_param("depth", "source")
        .json(&payload)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    // Long labels render as they would from the store
    assert_eq!(body["grid"]["record_count"], 4);
    let skipped = body["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].as_str().unwrap().contains("record[1]"));

    let headers = body["grid"]["header_rows"].as_array().unwrap();
    assert_eq!(texts(&headers[0]), vec!["ads", "unknown-source", "web", "Grand Total"]);

    let rows = body["grid"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["label"], "unknown-date");

    // The store is never touched by a snapshot render
    assert_eq!(ctx.store.count(), 0);
}

#[tokio::test]
async fn test_snapshot_must_be_array() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/pivot")
        .json(&json!({ "utm_source": "web" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_snapshot_round_trips_listed_records() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    let listed: Value = server.get("/utm-data").await.json();
    let from_snapshot: Value = server
        .post("/pivot")
        .add_query_param("depth", "term")
        .json(&listed)
        .await
        .json();
    let from_store: Value = server
        .get("/pivot")
        .add_query_param("depth", "term")
        .await
        .json();

    assert_eq!(from_snapshot["grid"], from_store["grid"]);
    assert!(from_snapshot.get("skipped").is_none());
}

#[tokio::test]
async fn test_current_view_follows_latest_refresh() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    server
        .get("/pivot/current")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let first: Value = server.get("/pivot").add_query_param("depth", "source").await.json();
    let second: Value = server.get("/pivot").add_query_param("depth", "medium").await.json();
    assert!(second["ticket"].as_u64() > first["ticket"].as_u64());

    let current: Value = server.get("/pivot/current").await.json();
    assert_eq!(current["ticket"], second["ticket"]);
    assert_eq!(current["depth"], "medium");
}

#[tokio::test]
async fn test_failed_refresh_keeps_published_view() {
    let ctx = TestContext::with_records(fixtures::mixed_records());
    let server = ctx.server();

    let published: Value = server.get("/pivot").await.json();

    ctx.set_store_failure(true);
    let response = server.get("/pivot").add_query_param("depth", "term").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "DB_001");

    let current: Value = server.get("/pivot/current").await.json();
    assert_eq!(current["ticket"], published["ticket"]);
    assert_eq!(current["depth"], "campaign");
}

#[tokio::test]
async fn test_snapshot_does_not_replace_published_view() {
    let ctx = TestContext::with_records(fixtures::spring_campaign());
    let server = ctx.server();

    let published: Value = server.get("/pivot").await.json();

    let snapshot: Value = server
        .post("/pivot")
        .json(&json!([{ "utm_source": "injected", "created_at": "2024-03-05T10:00:00Z" }]))
        .await
        .json();
    assert_eq!(snapshot["published"], false);
    assert_eq!(snapshot["ticket"], 0);
    assert_eq!(snapshot["grid"]["record_count"], 1);

    let current: Value = server.get("/pivot/current").await.json();
    assert_eq!(current["ticket"], published["ticket"]);
    assert_eq!(current["grid"], published["grid"]);

    // The dashboard's fallback table still comes from the store
    ctx.set_store_failure(true);
    let response = server.get("/").await;
    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("Refresh failed"));
    assert!(page.contains("spring"));
    assert!(!page.contains("injected"));
}
