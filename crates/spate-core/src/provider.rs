// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Point resolution provider boundary.
//!
//! Resolving a group code to its point definitions is the job of an external
//! collaborator (a database, a file, another service). SPATE only depends on
//! the [`PointResolver`] trait; [`StaticPointResolver`] is the built-in
//! implementation backed by the configuration file.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::BridgeResult;
use crate::types::{GroupCode, PointDefinition};

// =============================================================================
// PointResolver
// =============================================================================

/// Resolves a group code to an ordered list of point definitions.
///
/// An empty result means "no such group"; callers treat it the same as an
/// unknown code. Implementations must be safe to call concurrently.
#[async_trait]
pub trait PointResolver: Send + Sync {
    /// Resolves `group` to its point definitions, preserving provider order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::Provider`] when the lookup
    /// itself fails (as opposed to succeeding with an empty result).
    async fn resolve(&self, group: &GroupCode) -> BridgeResult<Vec<PointDefinition>>;
}

// =============================================================================
// StaticPointResolver
// =============================================================================

/// Point resolver backed by an in-memory table, typically loaded from the
/// `groups:` section of the configuration file.
#[derive(Debug, Default)]
pub struct StaticPointResolver {
    groups: HashMap<String, Vec<PointDefinition>>,
}

impl StaticPointResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver from a prepared table.
    pub fn from_table(groups: HashMap<String, Vec<PointDefinition>>) -> Self {
        Self { groups }
    }

    /// Registers a group, replacing any previous definition.
    pub fn insert(&mut self, code: impl Into<String>, points: Vec<PointDefinition>) {
        self.groups.insert(code.into(), points);
    }

    /// Builder-style variant of [`StaticPointResolver::insert`].
    pub fn with_group(mut self, code: impl Into<String>, points: Vec<PointDefinition>) -> Self {
        self.insert(code, points);
        self
    }

    /// Returns the number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no groups are registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[async_trait]
impl PointResolver for StaticPointResolver {
    async fn resolve(&self, group: &GroupCode) -> BridgeResult<Vec<PointDefinition>> {
        Ok(self.groups.get(group.as_str()).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_known_group_preserves_order() {
        let resolver = StaticPointResolver::new().with_group(
            "G0001",
            vec![
                PointDefinition::new("Device.A", 1),
                PointDefinition::new("Device.B", 2),
                PointDefinition::new("Device.C", 3),
            ],
        );

        let points = resolver.resolve(&GroupCode::new("G0001")).await.unwrap();
        let handles: Vec<u32> = points.iter().map(|p| p.client_handle).collect();
        assert_eq!(handles, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_resolve_unknown_group_is_empty() {
        let resolver = StaticPointResolver::new();
        let points = resolver.resolve(&GroupCode::new("G-UNKNOWN")).await.unwrap();
        assert!(points.is_empty());
    }
}
