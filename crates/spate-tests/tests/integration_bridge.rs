// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Bridge Integration Tests
//!
//! Cross-component scenarios: concurrent control requests, provider
//! failures, and multi-group event routing.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use spate_core::{GroupCode, PointDefinition, TagValue};
use spate_opcua::{ConnectOptions, OpcUaBridge, StatusCode};
use spate_tests::common::fixtures::{sim_bridge, test_settings, GroupFixtures};
use spate_tests::common::mocks::MockPointResolver;

// =============================================================================
// Provider boundary
// =============================================================================

#[tokio::test]
async fn provider_failure_leaves_no_group_behind() {
    let server = spate_opcua::SimServer::new();
    let resolver = Arc::new(MockPointResolver::new());
    resolver.set_group("G0001", GroupFixtures::primary());

    let bridge = OpcUaBridge::new(
        Arc::new(server.connector()),
        Arc::clone(&resolver) as Arc<dyn spate_core::PointResolver>,
        test_settings(),
    );
    bridge.connect(&ConnectOptions::default()).await.unwrap();

    resolver.fail_all(true);
    let result = bridge.start_monitoring(GroupCode::new("G0001")).await;
    assert!(result.is_err());
    assert_eq!(resolver.resolve_count(), 1);
    assert!(bridge.groups().is_empty());
    assert!(bridge.groups().channels().is_empty());
    assert_eq!(server.subscription_count(), 0);

    // The same group starts fine once the provider recovers.
    resolver.fail_all(false);
    bridge.start_monitoring(GroupCode::new("G0001")).await.unwrap();
    assert!(bridge.groups().is_active(&GroupCode::new("G0001")));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_starts_of_the_same_code_leave_one_group() {
    let (server, bridge) = sim_bridge();
    bridge.connect(&ConnectOptions::default()).await.unwrap();

    let code = GroupCode::new("G0001");
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bridge = Arc::clone(&bridge);
        let code = code.clone();
        tasks.push(tokio::spawn(
            async move { bridge.start_monitoring(code).await },
        ));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Starts serialized: exactly one group, one live server subscription.
    assert_eq!(bridge.groups().len(), 1);
    assert_eq!(bridge.groups().channels().len(), 1);
    assert_eq!(server.subscription_count(), 1);
}

#[tokio::test]
async fn concurrent_teardowns_dispose_once() {
    let (server, bridge) = sim_bridge();
    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge.start_monitoring(GroupCode::new("A")).await.unwrap();

    let code = GroupCode::new("A");
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bridge = Arc::clone(&bridge);
        let code = code.clone();
        tasks.push(tokio::spawn(async move {
            bridge.stop_monitoring(&code).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(bridge.groups().is_empty());
    assert!(bridge.groups().channels().is_empty());
    assert_eq!(server.subscription_count(), 0);
}

#[tokio::test]
async fn concurrent_connects_establish_one_session() {
    let (server, bridge) = sim_bridge();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bridge = Arc::clone(&bridge);
        tasks.push(tokio::spawn(async move {
            bridge.connect(&ConnectOptions::default()).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Serialized lifecycle: the first call connects, the rest reuse.
    assert_eq!(server.connect_count(), 1);
    assert_eq!(bridge.session().stats().reuses(), 7);
}

// =============================================================================
// Event routing
// =============================================================================

#[tokio::test]
async fn events_route_to_their_own_group() {
    let (server, bridge) = sim_bridge();
    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge.start_monitoring(GroupCode::new("A")).await.unwrap();
    bridge.start_monitoring(GroupCode::new("B")).await.unwrap();

    let mut stream_a =
        bridge.subscribe_to_changes(&GroupCode::new("A"), CancellationToken::new());
    let mut stream_b =
        bridge.subscribe_to_changes(&GroupCode::new("B"), CancellationToken::new());

    // TagA belongs to group A (handle 1), TagC to group B (handle 3).
    server.update_value("Channel1.Device1.TagA", TagValue::Integer(11));
    server.update_value("Channel2.Device2.TagC", TagValue::Integer(33));

    let event_a = tokio::time::timeout(Duration::from_secs(1), stream_a.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event_a.client_handle, "1");
    assert_eq!(event_a.value, TagValue::Integer(11));

    let event_b = tokio::time::timeout(Duration::from_secs(1), stream_b.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event_b.client_handle, "3");
    assert_eq!(event_b.value, TagValue::Integer(33));

    // Neither stream got the other's event.
    assert!(
        tokio::time::timeout(Duration::from_millis(100), stream_a.next())
            .await
            .is_err()
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(100), stream_b.next())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn a_fresh_reader_never_replays_delivered_events() {
    let (server, bridge) = sim_bridge();
    let code = GroupCode::new("G0001");
    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge.start_monitoring(code.clone()).await.unwrap();

    server.update_value("Channel1.Device1.Tag1", TagValue::Integer(1));
    {
        let mut first = bridge.subscribe_to_changes(&code, CancellationToken::new());
        let event = tokio::time::timeout(Duration::from_secs(1), first.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.value, TagValue::Integer(1));
    }

    server.update_value("Channel1.Device1.Tag1", TagValue::Integer(2));
    let mut second = bridge.subscribe_to_changes(&code, CancellationToken::new());
    let event = tokio::time::timeout(Duration::from_secs(1), second.next())
        .await
        .unwrap()
        .unwrap();
    // Only the event produced after the first reader finished.
    assert_eq!(event.value, TagValue::Integer(2));
}

#[tokio::test]
async fn per_point_sampling_overrides_reach_the_server() {
    let server = spate_opcua::SimServer::new();
    let resolver = spate_core::StaticPointResolver::new().with_group(
        "MIXED",
        vec![
            PointDefinition::new("Fast.Tag", 1).with_update_rate(100),
            PointDefinition::new("Slow.Tag", 2),
        ],
    );
    let bridge = OpcUaBridge::new(
        Arc::new(server.connector()),
        Arc::new(resolver),
        test_settings(),
    );

    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge.start_monitoring(GroupCode::new("MIXED")).await.unwrap();

    let groups = bridge.active_groups();
    assert_eq!(groups.len(), 1);
    let intervals = server.sampling_intervals(groups[0].subscription);
    // The override applies per point; the fallback is the configured
    // 1000 ms default.
    assert_eq!(
        intervals,
        vec![Duration::from_millis(100), Duration::from_millis(1000)]
    );
    assert_eq!(
        server.publishing_interval(groups[0].subscription),
        Some(Duration::from_millis(100))
    );
}

#[tokio::test]
async fn skipped_points_do_not_block_the_rest() {
    // One empty address in the middle: it is skipped, the others attach.
    let server = spate_opcua::SimServer::new();
    let resolver = spate_core::StaticPointResolver::new().with_group(
        "PARTIAL",
        vec![
            PointDefinition::new("Good.One", 1),
            PointDefinition::new("", 2),
            PointDefinition::new("Good.Two", 3),
        ],
    );
    let bridge = OpcUaBridge::new(
        Arc::new(server.connector()),
        Arc::new(resolver),
        test_settings(),
    );

    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge
        .start_monitoring(GroupCode::new("PARTIAL"))
        .await
        .unwrap();

    let groups = bridge.active_groups();
    assert_eq!(groups[0].point_count, 2);

    let mut stream =
        bridge.subscribe_to_changes(&GroupCode::new("PARTIAL"), CancellationToken::new());
    server.notify("Good.Two", TagValue::Bool(true), StatusCode::GOOD, chrono::Utc::now());
    let event = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.client_handle, "3");
}
