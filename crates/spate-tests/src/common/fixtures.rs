// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built test data for consistent and reproducible testing.

use std::sync::Arc;

use spate_core::{PointDefinition, StaticPointResolver};
use spate_opcua::{OpcUaBridge, SessionSettings, SimServer};

/// Endpoint used by every fixture.
pub const TEST_ENDPOINT: &str = "opc.tcp://localhost:4840";

// =============================================================================
// Group Fixtures
// =============================================================================

/// Fixture providing standard point groups.
pub struct GroupFixtures;

impl GroupFixtures {
    /// The canonical single-point group "G0001" (handle 5).
    pub fn primary() -> Vec<PointDefinition> {
        vec![PointDefinition::new("Channel1.Device1.Tag1", 5).with_update_rate(500)]
    }

    /// A two-point group.
    pub fn pair() -> Vec<PointDefinition> {
        vec![
            PointDefinition::new("Channel1.Device1.TagA", 1),
            PointDefinition::new("Channel1.Device1.TagB", 2),
        ]
    }

    /// A resolver knowing "G0001", "A", and "B".
    pub fn resolver() -> StaticPointResolver {
        StaticPointResolver::new()
            .with_group("G0001", Self::primary())
            .with_group("A", Self::pair())
            .with_group("B", vec![PointDefinition::new("Channel2.Device2.TagC", 3)])
    }
}

// =============================================================================
// Bridge Fixtures
// =============================================================================

/// Default session settings against the test endpoint.
pub fn test_settings() -> SessionSettings {
    SessionSettings::new(TEST_ENDPOINT)
}

/// A bridge over a fresh simulator and the standard resolver.
pub fn sim_bridge() -> (Arc<SimServer>, Arc<OpcUaBridge>) {
    let server = SimServer::new();
    let bridge = Arc::new(OpcUaBridge::new(
        Arc::new(server.connector()),
        Arc::new(GroupFixtures::resolver()),
        test_settings(),
    ));
    (server, bridge)
}
