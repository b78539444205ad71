// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Failure-injecting point resolvers for exercising the provider boundary.
//! The simulated automation server itself lives in `spate_opcua::sim`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use spate_core::{BridgeError, BridgeResult, GroupCode, PointDefinition, PointResolver};

// =============================================================================
// Mock Point Resolver
// =============================================================================

/// A configurable point resolver for testing.
#[derive(Debug, Default)]
pub struct MockPointResolver {
    groups: parking_lot::RwLock<HashMap<String, Vec<PointDefinition>>>,

    /// Force every resolution to fail.
    fail_all: AtomicBool,

    /// Resolution count for verification.
    resolve_count: AtomicU64,
}

impl MockPointResolver {
    /// Creates an empty mock resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group.
    pub fn set_group(&self, code: impl Into<String>, points: Vec<PointDefinition>) {
        self.groups.write().insert(code.into(), points);
    }

    /// Forces all resolutions to fail with a provider error.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Number of resolutions performed.
    pub fn resolve_count(&self) -> u64 {
        self.resolve_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointResolver for MockPointResolver {
    async fn resolve(&self, group: &GroupCode) -> BridgeResult<Vec<PointDefinition>> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BridgeError::provider("simulated lookup failure"));
        }

        Ok(self
            .groups
            .read()
            .get(group.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
