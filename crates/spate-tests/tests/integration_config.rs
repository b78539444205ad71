// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Checks that a parsed configuration wires all the way through to a
//! working bridge: the `groups:` section becomes the resolver table, and
//! the connection defaults become session settings.

use std::sync::Arc;
use std::time::Duration;

use spate_config::ConfigLoader;
use spate_core::{GroupCode, StaticPointResolver, TagValue};
use spate_opcua::{ConnectOptions, OpcUaBridge, SessionSettings, SimServer};

const CONFIG: &str = r#"
gateway:
  id: integration
opcua:
  endpoint_url: opc.tcp://plc:4840
  publishing_interval_ms: 100
  default_sampling_interval_ms: 1000
groups:
  - code: LINE-1
    points:
      - address: Line1.Speed
        client_handle: 1
        update_rate_ms: 200
      - address: Line1.Temperature
        client_handle: 2
"#;

#[tokio::test]
async fn parsed_groups_drive_the_bridge() {
    let config = ConfigLoader::new().parse(CONFIG).unwrap();
    assert_eq!(config.gateway.id, "integration");

    let resolver = StaticPointResolver::from_table(config.point_table());
    let server = SimServer::new();
    let bridge = OpcUaBridge::new(
        Arc::new(server.connector()),
        Arc::new(resolver),
        SessionSettings::builder()
            .endpoint(&config.opcua.endpoint_url)
            .publishing_interval(Duration::from_millis(config.opcua.publishing_interval_ms))
            .default_sampling_interval(Duration::from_millis(
                config.opcua.default_sampling_interval_ms,
            ))
            .build()
            .unwrap(),
    );

    bridge.connect(&ConnectOptions::default()).await.unwrap();
    bridge
        .start_monitoring(GroupCode::new("LINE-1"))
        .await
        .unwrap();

    let groups = bridge.active_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].point_count, 2);

    // Configured intervals made it to the server verbatim.
    assert_eq!(
        server.sampling_intervals(groups[0].subscription),
        vec![Duration::from_millis(200), Duration::from_millis(1000)]
    );
    assert_eq!(
        server.publishing_interval(groups[0].subscription),
        Some(Duration::from_millis(100))
    );

    // And the configured endpoint was what the connector saw.
    assert_eq!(
        server.last_settings().unwrap().endpoint,
        "opc.tcp://plc:4840"
    );

    // A group absent from the file does not exist for the bridge.
    assert!(bridge
        .start_monitoring(GroupCode::new("LINE-2"))
        .await
        .is_err());

    server.set_value("Line1.Speed", TagValue::Float(60.0));
    assert_eq!(
        bridge.read_one("Line1.Speed").await.unwrap(),
        TagValue::Float(60.0)
    );
}
