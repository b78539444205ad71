// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-process simulated automation server.
//!
//! [`SimServer`] implements the [`ServerConnector`]/[`ServerSession`]
//! boundary entirely in memory. It backs the demo runtime and every test
//! that needs a server: values can be seeded, statuses forced bad,
//! notifications injected with a chosen timestamp, liveness states
//! broadcast, and connection attempts made to fail.
//!
//! The bridge maintains a single live session by design, so the simulator
//! keeps one server-wide subscription table rather than per-session ones.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use spate_core::{BridgeError, BridgeResult, TagValue};

use crate::transport::{
    MonitoredItemId, MonitoredItemRequest, NotificationSender, RawNotification, ReadOutcome,
    ServerConnector, ServerSession, ServerSessionHandle, SubscriptionId, WriteOutcome,
};
use crate::types::{NodeId, ServerState, SessionSettings, StatusCode};

// =============================================================================
// SimServer
// =============================================================================

/// Simulated server state shared by every session it hands out.
pub struct SimServer {
    /// Number of namespaces the server claims to expose.
    namespaces: usize,

    /// Point values keyed by identifier text.
    values: parking_lot::RwLock<HashMap<String, (TagValue, StatusCode)>>,

    /// Addresses whose writes are rejected.
    reject_writes: parking_lot::RwLock<HashSet<String>>,

    /// Active subscriptions.
    subscriptions: parking_lot::RwLock<HashMap<u32, SimSubscription>>,

    /// Subscription ID counter.
    next_subscription_id: AtomicU32,

    /// Monitored item ID counter.
    next_item_id: AtomicU32,

    /// Liveness broadcast.
    liveness_tx: broadcast::Sender<ServerState>,

    /// Force connection attempts to fail.
    fail_connect: AtomicBool,

    /// Number of sessions established.
    connect_count: AtomicU64,

    /// Number of sessions closed.
    close_count: AtomicU64,

    /// Settings of the most recent connection.
    last_settings: parking_lot::Mutex<Option<SessionSettings>>,

    /// Every accepted write, in order.
    write_history: parking_lot::Mutex<Vec<(String, TagValue)>>,
}

struct SimSubscription {
    publishing_interval: Duration,
    notify: NotificationSender,
    items: Vec<SimItem>,
    applied: bool,
}

struct SimItem {
    node: NodeId,
    client_handle: u32,
    sampling_interval: Duration,
}

impl SimServer {
    /// Creates a simulator exposing three namespaces (vendor tags at
    /// index 2, like a typical gateway server).
    pub fn new() -> Arc<Self> {
        Self::with_namespaces(3)
    }

    /// Creates a simulator exposing `namespaces` namespaces.
    pub fn with_namespaces(namespaces: usize) -> Arc<Self> {
        let (liveness_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            namespaces,
            values: parking_lot::RwLock::new(HashMap::new()),
            reject_writes: parking_lot::RwLock::new(HashSet::new()),
            subscriptions: parking_lot::RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU32::new(1),
            next_item_id: AtomicU32::new(1),
            liveness_tx,
            fail_connect: AtomicBool::new(false),
            connect_count: AtomicU64::new(0),
            close_count: AtomicU64::new(0),
            last_settings: parking_lot::Mutex::new(None),
            write_history: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Returns a connector handing out sessions against this server.
    pub fn connector(self: &Arc<Self>) -> SimConnector {
        SimConnector {
            server: Arc::clone(self),
        }
    }

    // =========================================================================
    // Test / demo controls
    // =========================================================================

    /// Seeds a good value without delivering a notification.
    pub fn set_value(&self, address: impl Into<String>, value: TagValue) {
        self.values
            .write()
            .insert(address.into(), (value, StatusCode::GOOD));
    }

    /// Forces a bad status for an address, keeping any seeded value.
    pub fn set_bad_status(&self, address: impl Into<String>, status: StatusCode) {
        let mut values = self.values.write();
        values
            .entry(address.into())
            .and_modify(|entry| entry.1 = status)
            .or_insert((TagValue::Null, status));
    }

    /// Rejects all future writes to an address.
    pub fn reject_writes_to(&self, address: impl Into<String>) {
        self.reject_writes.write().insert(address.into());
    }

    /// Seeds a value and delivers a good-status notification for it.
    pub fn update_value(&self, address: &str, value: TagValue) {
        self.set_value(address, value.clone());
        self.notify(address, value, StatusCode::GOOD, Utc::now());
    }

    /// Delivers a notification for every applied monitored item matching
    /// `address`, with full control over status and timestamp.
    pub fn notify(
        &self,
        address: &str,
        value: TagValue,
        status: StatusCode,
        timestamp: DateTime<Utc>,
    ) {
        let subscriptions = self.subscriptions.read();
        for subscription in subscriptions.values() {
            if !subscription.applied {
                continue;
            }
            for item in &subscription.items {
                if item.node.identifier_text() == address {
                    let _ = subscription.notify.send(RawNotification {
                        client_handle: item.client_handle,
                        value: value.clone(),
                        status,
                        source_timestamp: timestamp,
                    });
                }
            }
        }
    }

    /// Broadcasts a server state to every liveness listener.
    pub fn set_server_state(&self, state: ServerState) {
        let _ = self.liveness_tx.send(state);
    }

    /// Makes subsequent connection attempts fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Number of sessions established so far.
    pub fn connect_count(&self) -> u64 {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far.
    pub fn close_count(&self) -> u64 {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Sampling intervals of the items on a subscription, in attach order.
    pub fn sampling_intervals(&self, subscription: SubscriptionId) -> Vec<Duration> {
        self.subscriptions
            .read()
            .get(&subscription.0)
            .map(|sub| sub.items.iter().map(|item| item.sampling_interval).collect())
            .unwrap_or_default()
    }

    /// Publishing interval of a subscription.
    pub fn publishing_interval(&self, subscription: SubscriptionId) -> Option<Duration> {
        self.subscriptions
            .read()
            .get(&subscription.0)
            .map(|sub| sub.publishing_interval)
    }

    /// Every accepted write so far, as (identifier text, value) pairs.
    pub fn write_history(&self) -> Vec<(String, TagValue)> {
        self.write_history.lock().clone()
    }

    /// Settings used by the most recent connection.
    pub fn last_settings(&self) -> Option<SessionSettings> {
        self.last_settings.lock().clone()
    }
}

impl std::fmt::Debug for SimServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimServer")
            .field("namespaces", &self.namespaces)
            .field("subscriptions", &self.subscriptions.read().len())
            .finish()
    }
}

// =============================================================================
// SimConnector
// =============================================================================

/// Connector producing sessions against a [`SimServer`].
#[derive(Debug, Clone)]
pub struct SimConnector {
    server: Arc<SimServer>,
}

#[async_trait]
impl ServerConnector for SimConnector {
    async fn connect(&self, settings: &SessionSettings) -> BridgeResult<ServerSessionHandle> {
        if self.server.fail_connect.load(Ordering::SeqCst) {
            return Err(BridgeError::connection(
                &settings.endpoint,
                "simulated connection failure",
            ));
        }

        self.server.connect_count.fetch_add(1, Ordering::SeqCst);
        *self.server.last_settings.lock() = Some(settings.clone());
        debug!(endpoint = %settings.endpoint, "simulator session established");

        Ok(Arc::new(SimSession {
            server: Arc::clone(&self.server),
            connected: AtomicBool::new(true),
        }))
    }
}

// =============================================================================
// SimSession
// =============================================================================

/// One live session against the simulator.
pub struct SimSession {
    server: Arc<SimServer>,
    connected: AtomicBool,
}

impl SimSession {
    fn ensure_connected(&self) -> BridgeResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BridgeError::SessionNotConnected)
        }
    }
}

#[async_trait]
impl ServerSession for SimSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> BridgeResult<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.server.close_count.fetch_add(1, Ordering::SeqCst);
            // Closing the session destroys its subscriptions server-side.
            self.server.subscriptions.write().clear();
        }
        Ok(())
    }

    fn liveness_events(&self) -> broadcast::Receiver<ServerState> {
        self.server.liveness_tx.subscribe()
    }

    fn namespace_count(&self) -> usize {
        self.server.namespaces
    }

    async fn read_values(&self, nodes: &[NodeId]) -> BridgeResult<Vec<ReadOutcome>> {
        self.ensure_connected()?;

        let values = self.server.values.read();
        Ok(nodes
            .iter()
            .map(|node| match values.get(&node.identifier_text()) {
                Some((value, status)) if status.is_good() => {
                    ReadOutcome::good(node.clone(), value.clone())
                }
                Some((_, status)) => ReadOutcome::bad(node.clone(), *status),
                None => ReadOutcome::bad(node.clone(), StatusCode::BAD_NODE_ID_UNKNOWN),
            })
            .collect())
    }

    async fn write_value(&self, node: &NodeId, value: TagValue) -> BridgeResult<WriteOutcome> {
        self.ensure_connected()?;

        let address = node.identifier_text();
        if self.server.reject_writes.read().contains(&address) {
            return Ok(WriteOutcome {
                node: node.clone(),
                status: StatusCode::BAD,
            });
        }

        self.server
            .values
            .write()
            .insert(address.clone(), (value.clone(), StatusCode::GOOD));
        self.server.write_history.lock().push((address, value));

        Ok(WriteOutcome {
            node: node.clone(),
            status: StatusCode::GOOD,
        })
    }

    async fn create_subscription(
        &self,
        publishing_interval: Duration,
        notify: NotificationSender,
    ) -> BridgeResult<SubscriptionId> {
        self.ensure_connected()?;

        let id = self.server.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        self.server.subscriptions.write().insert(
            id,
            SimSubscription {
                publishing_interval,
                notify,
                items: Vec::new(),
                applied: false,
            },
        );
        Ok(SubscriptionId(id))
    }

    async fn add_monitored_item(
        &self,
        subscription: SubscriptionId,
        request: MonitoredItemRequest,
    ) -> BridgeResult<MonitoredItemId> {
        self.ensure_connected()?;

        let mut subscriptions = self.server.subscriptions.write();
        let entry = subscriptions.get_mut(&subscription.0).ok_or_else(|| {
            BridgeError::connection("sim", format!("unknown subscription {}", subscription))
        })?;

        entry.items.push(SimItem {
            node: request.node,
            client_handle: request.client_handle,
            sampling_interval: request.sampling_interval,
        });
        Ok(MonitoredItemId(
            self.server.next_item_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn apply_changes(&self, subscription: SubscriptionId) -> BridgeResult<()> {
        self.ensure_connected()?;

        let mut subscriptions = self.server.subscriptions.write();
        let entry = subscriptions.get_mut(&subscription.0).ok_or_else(|| {
            BridgeError::connection("sim", format!("unknown subscription {}", subscription))
        })?;
        entry.applied = true;
        Ok(())
    }

    async fn delete_subscription(&self, subscription: SubscriptionId) -> BridgeResult<()> {
        // Deleting drops the notification sender, which ends the pump.
        self.server.subscriptions.write().remove(&subscription.0);
        Ok(())
    }
}

impl std::fmt::Debug for SimSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimSession")
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn settings() -> SessionSettings {
        SessionSettings::new("opc.tcp://localhost:4840")
    }

    #[tokio::test]
    async fn test_connect_and_read() {
        let server = SimServer::new();
        server.set_value("Device.Temp", TagValue::Float(21.5));

        let session = server.connector().connect(&settings()).await.unwrap();
        assert!(session.is_connected());
        assert_eq!(server.connect_count(), 1);

        let outcomes = session
            .read_values(&[NodeId::string(0, "Device.Temp"), NodeId::string(0, "nope")])
            .await
            .unwrap();
        assert!(outcomes[0].is_good());
        assert_eq!(outcomes[0].value, TagValue::Float(21.5));
        assert!(!outcomes[1].is_good());
    }

    #[tokio::test]
    async fn test_fail_connect() {
        let server = SimServer::new();
        server.set_fail_connect(true);
        assert!(server.connector().connect(&settings()).await.is_err());
        assert_eq!(server.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_notifications_flow_after_apply() {
        let server = SimServer::new();
        let session = server.connector().connect(&settings()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = session
            .create_subscription(Duration::from_millis(100), tx)
            .await
            .unwrap();
        session
            .add_monitored_item(
                sub,
                MonitoredItemRequest {
                    node: NodeId::string(2, "Device.Temp"),
                    client_handle: 5,
                    sampling_interval: Duration::from_millis(1000),
                },
            )
            .await
            .unwrap();

        // Not applied yet: nothing is delivered.
        server.update_value("Device.Temp", TagValue::Integer(1));
        assert!(rx.try_recv().is_err());

        session.apply_changes(sub).await.unwrap();
        server.update_value("Device.Temp", TagValue::Integer(2));

        let raw = rx.recv().await.unwrap();
        assert_eq!(raw.client_handle, 5);
        assert_eq!(raw.value, TagValue::Integer(2));
        assert!(raw.status.is_good());
    }

    #[tokio::test]
    async fn test_delete_subscription_closes_notify_channel() {
        let server = SimServer::new();
        let session = server.connector().connect(&settings()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = session
            .create_subscription(Duration::from_millis(100), tx)
            .await
            .unwrap();
        session.delete_subscription(sub).await.unwrap();

        assert!(rx.recv().await.is_none());
        assert_eq!(server.subscription_count(), 0);
    }
}
