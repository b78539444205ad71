// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Integration Tests
//!
//! Drives the real router in-process and checks the response envelope,
//! order preservation, and the SSE stream framing.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode as HttpStatus};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use spate_api::{ApiConfig, ApiServer, AppState};
use spate_core::{GroupCode, TagValue};
use spate_opcua::{OpcUaBridge, StatusCode};
use spate_tests::common::fixtures::sim_bridge;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_router(bridge: &Arc<OpcUaBridge>) -> Router {
    let state = AppState::new(ApiConfig::default(), Arc::clone(bridge));
    ApiServer::new(state).router()
}

async fn post_json(router: &Router, path: &str, body: Value) -> (HttpStatus, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, path: &str) -> (HttpStatus, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (HttpStatus, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// =============================================================================
// Envelope shape
// =============================================================================

#[tokio::test]
async fn status_reports_connection_state() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let (status, body) = get(&router, "/api/v1/opcua/status").await;
    assert_eq!(status, HttpStatus::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], false);
    assert!(body["errorMessage"].is_null());

    let (_, body) = post_json(&router, "/api/v1/opcua/connect", json!({})).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], true);

    let (_, body) = get(&router, "/api/v1/opcua/status").await;
    assert_eq!(body["data"], true);
}

#[tokio::test]
async fn connect_failure_is_an_envelope_not_a_fault() {
    let (server, bridge) = sim_bridge();
    server.set_fail_connect(true);
    let router = test_router(&bridge);

    let (status, body) = post_json(&router, "/api/v1/opcua/connect", json!({})).await;
    // Failures still answer 200 with the envelope describing them.
    assert_eq!(status, HttpStatus::OK);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert!(body["errorMessage"].is_string());
}

#[tokio::test]
async fn disconnect_is_idempotent_over_http() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let (_, body) = post_json(&router, "/api/v1/opcua/disconnect", json!(null)).await;
    assert_eq!(body["success"], true);

    post_json(&router, "/api/v1/opcua/connect", json!({})).await;
    let (_, body) = post_json(&router, "/api/v1/opcua/disconnect", json!(null)).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn health_reports_version_and_groups() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, HttpStatus::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], spate_core::VERSION);
    assert_eq!(body["connected"], false);
    assert_eq!(body["active_groups"], 0);
}

// =============================================================================
// Reads and writes
// =============================================================================

#[tokio::test]
async fn read_returns_the_value_or_an_error_envelope() {
    let (server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    // Without a session the envelope carries the failure.
    let (_, body) = post_json(&router, "/api/v1/opcua/read", json!({"nodeId": "p1"})).await;
    assert_eq!(body["success"], false);
    assert!(body["errorMessage"]
        .as_str()
        .unwrap()
        .contains("not connected"));

    post_json(&router, "/api/v1/opcua/connect", json!({})).await;
    server.set_value("p1", TagValue::Float(21.5));

    let (_, body) = post_json(&router, "/api/v1/opcua/read", json!({"nodeId": "p1"})).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!(21.5));
}

#[tokio::test]
async fn read_multiple_preserves_order_and_isolates_bad_points() {
    let (server, bridge) = sim_bridge();
    let router = test_router(&bridge);
    post_json(&router, "/api/v1/opcua/connect", json!({})).await;

    server.set_value("p1", TagValue::Integer(1));
    server.set_bad_status("p2", StatusCode::BAD);
    server.set_value("p3", TagValue::Integer(3));

    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/read-multiple",
        json!({"nodeIds": ["p1", "p2", "p3"]}),
    )
    .await;

    assert_eq!(body["success"], true);
    let data = body["data"].as_object().unwrap();
    assert_eq!(data.len(), 3);

    // Same order and count as the request; the bad point maps to null.
    let keys: Vec<&str> = data.keys().map(|key| key.as_str()).collect();
    assert_eq!(keys, ["p1", "p2", "p3"]);
    assert_eq!(data["p1"], json!(1));
    assert!(data["p2"].is_null());
    assert_eq!(data["p3"], json!(3));
}

#[tokio::test]
async fn write_coerces_before_dispatch() {
    let (server, bridge) = sim_bridge();
    let router = test_router(&bridge);
    post_json(&router, "/api/v1/opcua/connect", json!({})).await;

    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/write",
        json!({"nodeId": "p1", "value": "123", "dataType": "int"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(
        server.write_history(),
        vec![("p1".to_string(), TagValue::Integer(123))]
    );

    // Unrecognized declared types pass the raw value through unchanged.
    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/write",
        json!({"nodeId": "p2", "value": "on", "dataType": "decimal"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(server.write_history()[1].1, TagValue::Text("on".into()));

    // A coercion failure is a failure envelope, not a fault.
    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/write",
        json!({"nodeId": "p3", "value": "abc", "dataType": "int"}),
    )
    .await;
    assert_eq!(body["success"], false);
}

// =============================================================================
// Monitoring
// =============================================================================

#[tokio::test]
async fn monitor_start_and_stop_round_trip() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/monitor/start",
        json!({"groupCode": "G0001"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert!(bridge.groups().is_active(&GroupCode::new("G0001")));

    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/monitor/stop",
        json!({"groupId": "G0001"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert!(bridge.groups().is_empty());

    // Stopping a group that never started still succeeds.
    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/monitor/stop",
        json!({"groupId": "G-NEVER-STARTED"}),
    )
    .await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn monitor_start_unknown_group_fails_cleanly() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let (_, body) = post_json(
        &router,
        "/api/v1/opcua/monitor/start",
        json!({"groupCode": "G-UNKNOWN"}),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(body["errorMessage"].is_string());
    assert!(bridge.groups().channels().is_empty());
}

#[tokio::test]
async fn stream_delivers_sse_frames_until_the_group_stops() {
    let (server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    post_json(&router, "/api/v1/opcua/connect", json!({})).await;
    post_json(
        &router,
        "/api/v1/opcua/monitor/start",
        json!({"groupCode": "G0001"}),
    )
    .await;

    // Open the stream; the handler subscribes while answering the request.
    let request = Request::builder()
        .uri("/api/v1/opcua/monitor/stream/G0001")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), HttpStatus::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    // One good notification, then stop the group to complete the channel
    // and with it the response body.
    server.notify(
        "Channel1.Device1.Tag1",
        TagValue::Integer(42),
        StatusCode::GOOD,
        chrono::Utc::now(),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    bridge.stop_monitoring(&GroupCode::new("G0001")).await;

    let bytes = tokio::time::timeout(
        Duration::from_secs(2),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .expect("stream should end when the channel completes")
    .unwrap();

    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("data:"), "missing SSE data frame: {text}");
    assert!(text.contains("\"clientHandle\":\"5\""), "bad frame: {text}");
    assert!(text.contains("\"value\":42"), "bad frame: {text}");
}

#[tokio::test]
async fn stream_for_an_unknown_group_ends_immediately() {
    let (_server, bridge) = sim_bridge();
    let router = test_router(&bridge);

    let request = Request::builder()
        .uri("/api/v1/opcua/monitor/stream/NOPE")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), HttpStatus::OK);

    let bytes = tokio::time::timeout(
        Duration::from_secs(1),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .expect("empty stream should end immediately")
    .unwrap();
    assert!(!String::from_utf8(bytes.to_vec()).unwrap().contains("data:"));
}
