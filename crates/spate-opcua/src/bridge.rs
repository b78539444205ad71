// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The bridge facade.
//!
//! [`OpcUaBridge`] is the long-lived service object the control surface
//! talks to. It composes the session manager, the group manager, and the
//! configured default settings, and exposes every bridge operation as one
//! method. All failures surface as [`BridgeError`] values; nothing panics
//! across this boundary.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use spate_core::{
    BridgeError, BridgeResult, GroupCode, PointResolver, TagChangeStream, TagValue,
};

use crate::group::{GroupInfo, GroupManager};
use crate::session::SessionManager;
use crate::transport::ServerConnector;
use crate::types::{ConnectOptions, SessionSettings};

// =============================================================================
// OpcUaBridge
// =============================================================================

/// Long-lived bridge service owning the session and all groups.
///
/// Cheap to share: wrap in an [`Arc`] and clone the handle wherever a
/// control surface or background task needs it.
pub struct OpcUaBridge {
    session: Arc<SessionManager>,
    groups: Arc<GroupManager>,
    defaults: SessionSettings,
}

impl OpcUaBridge {
    /// Creates a bridge from its collaborators and default settings.
    pub fn new(
        connector: Arc<dyn ServerConnector>,
        resolver: Arc<dyn PointResolver>,
        defaults: SessionSettings,
    ) -> Self {
        Self {
            session: Arc::new(SessionManager::new(connector)),
            groups: Arc::new(GroupManager::new(resolver)),
            defaults,
        }
    }

    /// Returns the configured default settings.
    pub fn defaults(&self) -> &SessionSettings {
        &self.defaults
    }

    /// Returns the session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Returns the group manager.
    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    // =========================================================================
    // Session operations
    // =========================================================================

    /// Connects using the configured defaults merged with `options`.
    ///
    /// Idempotent while connected; see [`SessionManager::connect`].
    pub async fn connect(&self, options: &ConnectOptions) -> BridgeResult<()> {
        let settings = self.defaults.with_overrides(options);
        self.session.connect(&settings, &self.groups).await
    }

    /// Disconnects, removing all groups first. Idempotent.
    pub async fn disconnect(&self) {
        self.session.disconnect(&self.groups).await;
    }

    /// Returns `true` while a live session exists. No side effects.
    pub async fn is_connected(&self) -> bool {
        self.session.is_connected().await
    }

    // =========================================================================
    // Read / Write gateway
    // =========================================================================

    /// Reads one point without requiring a subscription.
    pub async fn read_one(&self, point: &str) -> BridgeResult<TagValue> {
        self.session.read_one(point).await
    }

    /// Reads several points, preserving request order and count.
    pub async fn read_many(
        &self,
        points: &[String],
    ) -> BridgeResult<Vec<(String, Option<TagValue>)>> {
        self.session.read_many(points).await
    }

    /// Writes a raw value with declared-type coercion.
    pub async fn write(
        &self,
        point: &str,
        raw: &serde_json::Value,
        declared_type: Option<&str>,
    ) -> BridgeResult<()> {
        self.session.write(point, raw, declared_type).await
    }

    // =========================================================================
    // Monitoring
    // =========================================================================

    /// Starts (or restarts) monitoring for `code`.
    ///
    /// Without a live session one reconnect with default settings is
    /// attempted first; if that fails the group is not started.
    pub async fn start_monitoring(&self, code: GroupCode) -> BridgeResult<()> {
        if !self.session.is_connected().await {
            warn!(group = %code, "no active session; attempting reconnect with defaults");
            self.connect(&ConnectOptions::default()).await?;
        }

        let session = self
            .session
            .current()
            .await
            .ok_or(BridgeError::SessionNotConnected)?;

        self.groups.start(code, &session, &self.defaults).await
    }

    /// Stops monitoring for `code`. Idempotent; succeeds whether or not a
    /// group exists.
    pub async fn stop_monitoring(&self, code: &GroupCode) {
        let session = self.session.current().await;
        self.groups.stop(code, session.as_ref()).await;
    }

    /// Produces a fresh event stream for `code`.
    ///
    /// The stream is lazy and effectively infinite: it ends when the
    /// group's channel completes (stop or invalidation) or `cancel` fires.
    /// With no channel for `code` the stream is immediately empty.
    pub fn subscribe_to_changes(
        &self,
        code: &GroupCode,
        cancel: CancellationToken,
    ) -> TagChangeStream {
        self.groups.subscribe(code, cancel)
    }

    /// Returns snapshots of the active groups.
    pub fn active_groups(&self) -> Vec<GroupInfo> {
        self.groups.active_groups()
    }
}

impl std::fmt::Debug for OpcUaBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcUaBridge")
            .field("endpoint", &self.defaults.endpoint)
            .finish()
    }
}
