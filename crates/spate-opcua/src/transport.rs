// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract remote-server boundary.
//!
//! The bridge never talks wire protocol directly; it programs against
//! [`ServerConnector`] and [`ServerSession`]. Implementations handle the
//! actual protocol work (or simulate it, see [`crate::sim`]).
//!
//! Notifications are delivered by message passing: when a subscription is
//! created the caller hands over an unbounded sender, and the session pushes
//! [`RawNotification`]s into it from its own delivery context. No bridge
//! logic ever runs on that context.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};

use spate_core::{BridgeResult, TagValue};

use crate::types::{NodeId, ServerState, SessionSettings, StatusCode};

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned identifier of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Server-assigned identifier of a monitored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitoredItemId(pub u32);

impl std::fmt::Display for MonitoredItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mi-{}", self.0)
    }
}

// =============================================================================
// RawNotification
// =============================================================================

/// A low-level data change notification as delivered by the server.
///
/// Carries the client handle of the item it belongs to, the new value, the
/// item status, and the source timestamp. The group manager's pump converts
/// good-status notifications into [`spate_core::TagChangeEvent`]s and drops
/// the rest.
#[derive(Debug, Clone)]
pub struct RawNotification {
    /// Client handle of the monitored item.
    pub client_handle: u32,

    /// The new value.
    pub value: TagValue,

    /// Status of the sampled value.
    pub status: StatusCode,

    /// Source timestamp reported by the server.
    pub source_timestamp: DateTime<Utc>,
}

/// Sender half used by sessions to deliver notifications.
pub type NotificationSender = mpsc::UnboundedSender<RawNotification>;

/// Receiver half consumed by the group manager's pump.
pub type NotificationReceiver = mpsc::UnboundedReceiver<RawNotification>;

// =============================================================================
// Read / Write outcomes
// =============================================================================

/// Outcome of reading one node, status checked independently per node.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// The node that was read.
    pub node: NodeId,

    /// The value, meaningful only when the status is good.
    pub value: TagValue,

    /// Status of this read.
    pub status: StatusCode,
}

impl ReadOutcome {
    /// Creates a good outcome.
    pub fn good(node: NodeId, value: TagValue) -> Self {
        Self {
            node,
            value,
            status: StatusCode::GOOD,
        }
    }

    /// Creates a bad outcome with no value.
    pub fn bad(node: NodeId, status: StatusCode) -> Self {
        Self {
            node,
            value: TagValue::Null,
            status,
        }
    }

    /// Returns `true` if the read succeeded.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }
}

/// Outcome of writing one node.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The node that was written.
    pub node: NodeId,

    /// Status of this write.
    pub status: StatusCode,
}

impl WriteOutcome {
    /// Returns `true` if the write succeeded.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }
}

// =============================================================================
// MonitoredItemRequest
// =============================================================================

/// Request to attach one monitored item to a subscription.
#[derive(Debug, Clone)]
pub struct MonitoredItemRequest {
    /// The node to monitor.
    pub node: NodeId,

    /// Client handle correlating notifications to this item.
    pub client_handle: u32,

    /// Sampling interval for this item.
    pub sampling_interval: Duration,
}

// =============================================================================
// ServerConnector
// =============================================================================

/// Establishes sessions against the remote automation server.
///
/// One connector is configured per bridge; each successful call produces an
/// independent live session. Implementations must be `Send + Sync`.
#[async_trait]
pub trait ServerConnector: Send + Sync {
    /// Connects and activates a session using the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`spate_core::BridgeError::Connection`] when the session
    /// cannot be established.
    async fn connect(&self, settings: &SessionSettings) -> BridgeResult<ServerSessionHandle>;
}

/// Shared handle to a live server session.
pub type ServerSessionHandle = std::sync::Arc<dyn ServerSession>;

// =============================================================================
// ServerSession
// =============================================================================

/// A live session against the remote automation server.
///
/// All operations are safe to call concurrently. Individual reads, writes,
/// and notifications carry their own good/bad status.
#[async_trait]
pub trait ServerSession: Send + Sync {
    /// Returns `true` while the session is connected.
    fn is_connected(&self) -> bool;

    /// Closes the session gracefully.
    async fn close(&self) -> BridgeResult<()>;

    /// Subscribes to server liveness notifications.
    ///
    /// A non-[`ServerState::Running`] state means the session can no longer
    /// be trusted; the bridge reacts by invalidating all groups.
    fn liveness_events(&self) -> broadcast::Receiver<ServerState>;

    /// Returns the number of namespaces the server exposes.
    fn namespace_count(&self) -> usize;

    /// Reads the current value of each node, in order, one outcome per node.
    async fn read_values(&self, nodes: &[NodeId]) -> BridgeResult<Vec<ReadOutcome>>;

    /// Writes a value to a node.
    async fn write_value(&self, node: &NodeId, value: TagValue) -> BridgeResult<WriteOutcome>;

    /// Creates a subscription delivering notifications into `notify`.
    async fn create_subscription(
        &self,
        publishing_interval: Duration,
        notify: NotificationSender,
    ) -> BridgeResult<SubscriptionId>;

    /// Attaches a monitored item to a subscription.
    async fn add_monitored_item(
        &self,
        subscription: SubscriptionId,
        request: MonitoredItemRequest,
    ) -> BridgeResult<MonitoredItemId>;

    /// Commits pending item changes on a subscription. Notifications begin
    /// to flow only after this call.
    async fn apply_changes(&self, subscription: SubscriptionId) -> BridgeResult<()>;

    /// Detaches and disposes a subscription.
    async fn delete_subscription(&self, subscription: SubscriptionId) -> BridgeResult<()>;
}

// =============================================================================
// Tests
// =============================================================================
