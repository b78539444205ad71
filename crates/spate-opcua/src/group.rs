// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription group management.
//!
//! A group is a named set of monitored points sharing one server-side
//! subscription and one event channel. The manager owns both maps, keeps
//! them consistent under concurrent control requests, notification
//! delivery, and liveness teardown, and runs one pump task per group that
//! turns raw notifications into [`TagChangeEvent`]s.
//!
//! Lifecycle per group code: `NotExists -> Active` on a successful start,
//! `-> Removed` on stop, on restart with the same code, or on session-level
//! invalidation. There is no paused state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use spate_core::{
    BridgeError, BridgeResult, ChannelRegistry, EventChannel, GroupCode, PointResolver,
    TagChangeEvent, TagChangeStream,
};

use crate::transport::{
    MonitoredItemRequest, NotificationReceiver, ServerSessionHandle, SubscriptionId,
};
use crate::types::{NodeId, SessionSettings};

// =============================================================================
// GroupHandle
// =============================================================================

/// Bookkeeping for one active group.
#[derive(Debug)]
struct GroupHandle {
    /// Server-side subscription backing the group.
    subscription: SubscriptionId,

    /// Pump task forwarding notifications into the event channel.
    pump: JoinHandle<()>,

    /// Number of points attached at start.
    point_count: usize,

    /// When the group went active.
    started_at: DateTime<Utc>,
}

/// Snapshot of an active group, for status reporting.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    /// The group code.
    pub code: GroupCode,

    /// Server-side subscription ID.
    pub subscription: SubscriptionId,

    /// Number of attached points.
    pub point_count: usize,

    /// When the group went active.
    pub started_at: DateTime<Utc>,
}

// =============================================================================
// GroupManager
// =============================================================================

/// Manages subscription groups and their event channels.
///
/// Thread safety: the group map and channel registry are concurrent; every
/// teardown path is remove-if-present so two racing teardowns for the same
/// code dispose a group exactly once. Starts are serialized with a manager
/// lock so two concurrent starts of the same code cannot interleave their
/// remove/create sequences.
pub struct GroupManager {
    /// Resolves group codes to point definitions.
    resolver: Arc<dyn PointResolver>,

    /// Active groups by code.
    groups: DashMap<GroupCode, GroupHandle>,

    /// Event channels by code.
    registry: ChannelRegistry,

    /// Serializes start/restart sequences.
    start_lock: tokio::sync::Mutex<()>,
}

impl GroupManager {
    /// Creates a new group manager.
    pub fn new(resolver: Arc<dyn PointResolver>) -> Self {
        Self {
            resolver,
            groups: DashMap::new(),
            registry: ChannelRegistry::new(),
            start_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Starts (or restarts) monitoring for `code` on the given session.
    ///
    /// Any pre-existing group under the same code is removed first, so a
    /// restart is indistinguishable from a stop followed by a start. The
    /// point list comes from the resolver; an empty result leaves no trace
    /// and fails with [`BridgeError::EmptyGroup`].
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Provider`] when resolution itself fails
    /// - [`BridgeError::GroupNotFound`] when no points resolve
    /// - [`BridgeError::EmptyGroup`] when no resolved point attaches
    /// - [`BridgeError::Connection`] when the server rejects the
    ///   subscription
    pub async fn start(
        &self,
        code: GroupCode,
        session: &ServerSessionHandle,
        settings: &SessionSettings,
    ) -> BridgeResult<()> {
        let _guard = self.start_lock.lock().await;

        // Idempotent restart: drop the previous incarnation entirely.
        self.remove_group(&code, Some(session)).await;

        // An empty or absent resolution means "no such group".
        let points = self.resolver.resolve(&code).await?;
        if points.is_empty() {
            warn!(group = %code, "no points resolved; group not started");
            return Err(BridgeError::group_not_found(code.as_str()));
        }

        // The channel exists before the subscription so no notification can
        // arrive without a place to go.
        let channel = self.registry.open(code.clone());

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let subscription = match session
            .create_subscription(settings.publishing_interval, raw_tx)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                self.registry.complete_and_remove(&code);
                return Err(err);
            }
        };

        let namespace_index = effective_namespace_index(session.namespace_count());
        let mut attached = 0usize;
        for point in &points {
            if point.address.is_empty() {
                continue;
            }

            let request = MonitoredItemRequest {
                node: NodeId::string(namespace_index, &point.address),
                client_handle: point.client_handle,
                sampling_interval: point
                    .update_rate_ms
                    .map(Duration::from_millis)
                    .unwrap_or(settings.default_sampling_interval),
            };

            match session.add_monitored_item(subscription, request).await {
                Ok(_) => attached += 1,
                Err(err) => {
                    warn!(
                        group = %code,
                        address = %point.address,
                        error = %err,
                        "failed to attach monitored point; skipping"
                    );
                }
            }
        }

        if attached == 0 {
            let _ = session.delete_subscription(subscription).await;
            self.registry.complete_and_remove(&code);
            warn!(group = %code, "no points attached; group not started");
            return Err(BridgeError::empty_group(code.as_str()));
        }

        if let Err(err) = session.apply_changes(subscription).await {
            let _ = session.delete_subscription(subscription).await;
            self.registry.complete_and_remove(&code);
            return Err(err);
        }

        let pump = spawn_pump(code.clone(), raw_rx, channel);
        self.groups.insert(
            code.clone(),
            GroupHandle {
                subscription,
                pump,
                point_count: attached,
                started_at: Utc::now(),
            },
        );

        info!(group = %code, points = attached, "monitoring started");
        Ok(())
    }

    /// Stops monitoring for `code`.
    ///
    /// Idempotent: succeeds whether or not a group exists. The subscription
    /// is detached only when the session is still connected; the event
    /// channel is always completed and removed.
    pub async fn stop(&self, code: &GroupCode, session: Option<&ServerSessionHandle>) {
        let existed = self.remove_group(code, session).await;
        if existed {
            info!(group = %code, "monitoring stopped");
        } else {
            debug!(group = %code, "stop requested for unknown group; nothing to do");
        }
    }

    /// Invalidates every active group.
    ///
    /// Used on session teardown and on liveness failure. Performs the same
    /// detach/dispose/complete sequence as [`GroupManager::stop`] for each
    /// group.
    pub async fn invalidate_all(&self, session: Option<&ServerSessionHandle>) {
        let codes: Vec<GroupCode> = self.groups.iter().map(|e| e.key().clone()).collect();
        if codes.is_empty() {
            return;
        }

        info!(groups = codes.len(), "invalidating all subscription groups");
        for code in codes {
            self.remove_group(&code, session).await;
        }
    }

    /// Produces a fresh event stream for `code`.
    ///
    /// A fresh call never replays delivered events; it observes the
    /// underlying channel from this point forward, or nothing at all when
    /// the channel is already gone. One consumer per group is the supported
    /// shape; concurrent consumers race for events non-deterministically.
    pub fn subscribe(&self, code: &GroupCode, cancel: CancellationToken) -> TagChangeStream {
        self.registry.subscribe(code, cancel)
    }

    /// Returns `true` if `code` has an active group.
    pub fn is_active(&self, code: &GroupCode) -> bool {
        self.groups.contains_key(code)
    }

    /// Returns snapshots of all active groups.
    pub fn active_groups(&self) -> Vec<GroupInfo> {
        self.groups
            .iter()
            .map(|entry| GroupInfo {
                code: entry.key().clone(),
                subscription: entry.value().subscription,
                point_count: entry.value().point_count,
                started_at: entry.value().started_at,
            })
            .collect()
    }

    /// Returns the number of active groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no groups are active.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the channel registry (visible for integration tests).
    pub fn channels(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Removes one group: detach-if-connected, stop the pump, complete the
    /// channel. Remove-if-present on both maps, so concurrent teardowns
    /// act once.
    async fn remove_group(&self, code: &GroupCode, session: Option<&ServerSessionHandle>) -> bool {
        let removed = match self.groups.remove(code) {
            Some((_, handle)) => {
                if let Some(session) = session {
                    if session.is_connected() {
                        if let Err(err) = session.delete_subscription(handle.subscription).await {
                            warn!(
                                group = %code,
                                error = %err,
                                "failed to detach subscription during teardown"
                            );
                        }
                    }
                }
                handle.pump.abort();
                true
            }
            None => false,
        };

        // The channel is completed regardless of session state.
        let channel_removed = self.registry.complete_and_remove(code);
        removed || channel_removed
    }
}

impl std::fmt::Debug for GroupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupManager")
            .field("active_groups", &self.groups.len())
            .finish()
    }
}

// =============================================================================
// Notification pump
// =============================================================================

/// Spawns the per-group pump task.
///
/// The pump is the only code running off the server's delivery context: it
/// receives raw notifications, drops bad-status ones, and enqueues the rest
/// as events. It stops when the subscription is disposed (sender dropped)
/// or the channel completes.
fn spawn_pump(
    code: GroupCode,
    mut raw_rx: NotificationReceiver,
    channel: EventChannel,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(raw) = raw_rx.recv().await {
            if !raw.status.is_good() {
                trace!(
                    group = %code,
                    client_handle = raw.client_handle,
                    status = %raw.status,
                    "dropping bad-status notification"
                );
                continue;
            }

            let event = TagChangeEvent::new(
                raw.client_handle.to_string(),
                raw.value,
                raw.source_timestamp,
            );
            if !channel.publish(event) {
                break;
            }
        }
        debug!(group = %code, "notification pump stopped");
    })
}

/// Picks the namespace index monitored addresses resolve against.
///
/// Servers exposing more than two namespaces keep vendor tags in index 2;
/// with exactly two the tags live in index 1; a bare standard namespace
/// leaves index 0.
pub(crate) fn effective_namespace_index(namespace_count: usize) -> u16 {
    if namespace_count > 2 {
        2
    } else if namespace_count > 1 {
        1
    } else {
        0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_namespace_index() {
        assert_eq!(effective_namespace_index(0), 0);
        assert_eq!(effective_namespace_index(1), 0);
        assert_eq!(effective_namespace_index(2), 1);
        assert_eq!(effective_namespace_index(3), 2);
        assert_eq!(effective_namespace_index(7), 2);
    }
}
