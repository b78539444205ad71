// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle management.
//!
//! One [`SessionManager`] exists per bridge and owns the single optional
//! live session. Connect and disconnect run under one lifecycle mutex, so
//! two control requests can never race to replace the session. Teardown
//! always removes every subscription group before the old session closes.
//!
//! Liveness handling is message passing: each established session gets a
//! watcher task that listens for server-state broadcasts and cascades group
//! invalidation when the server stops running. The watcher never
//! reconnects; a later control request observes the disconnected state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use spate_core::{coerce, BridgeError, BridgeResult, DeclaredType, TagValue};

use crate::group::GroupManager;
use crate::transport::{ServerConnector, ServerSessionHandle};
use crate::types::{NodeId, SessionSettings};

// =============================================================================
// ActiveSession
// =============================================================================

/// The live session plus its liveness watcher.
struct ActiveSession {
    session: ServerSessionHandle,
    watcher: JoinHandle<()>,
}

impl ActiveSession {
    fn abort_watcher(&self) {
        self.watcher.abort();
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Owns the single live session and the ad-hoc read/write gateway.
///
/// # Thread Safety
///
/// Queries take a snapshot of the current session; lifecycle transitions
/// (connect, disconnect) serialize on an internal mutex.
pub struct SessionManager {
    /// Establishes sessions on demand.
    connector: Arc<dyn ServerConnector>,

    /// The current session, if any.
    active: tokio::sync::RwLock<Option<ActiveSession>>,

    /// Serializes connect/disconnect sequences.
    lifecycle: tokio::sync::Mutex<()>,

    /// Lifecycle statistics.
    stats: SessionStats,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(connector: Arc<dyn ServerConnector>) -> Self {
        Self {
            connector,
            active: tokio::sync::RwLock::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            stats: SessionStats::new(),
        }
    }

    /// Returns the session statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Returns a snapshot of the current session.
    pub async fn current(&self) -> Option<ServerSessionHandle> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.session))
    }

    /// Returns `true` if a session exists and reports connected.
    pub async fn is_connected(&self) -> bool {
        match self.current().await {
            Some(session) => session.is_connected(),
            None => false,
        }
    }

    /// Connects to the server, reusing the current session when possible.
    ///
    /// If a session already exists and reports connected this is a no-op.
    /// Otherwise any existing session is torn down first (all groups
    /// removed, session closed) and a new one established with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Connection`] when establishment fails. The
    /// previous session is gone by then; callers observe a disconnected
    /// bridge.
    pub async fn connect(
        &self,
        settings: &SessionSettings,
        groups: &Arc<GroupManager>,
    ) -> BridgeResult<()> {
        let _guard = self.lifecycle.lock().await;

        if let Some(active) = self.active.read().await.as_ref() {
            if active.session.is_connected() {
                info!(endpoint = %settings.endpoint, "session already connected; reusing");
                self.stats.record_reuse();
                return Ok(());
            }
        }

        self.teardown(groups).await;

        settings.validate()?;
        info!(
            endpoint = %settings.endpoint,
            security = %settings.security_mode,
            anonymous = settings.identity.is_anonymous(),
            "connecting to automation server"
        );

        let session = match self.connector.connect(settings).await {
            Ok(session) => session,
            Err(err) => {
                self.stats.record_failure();
                error!(endpoint = %settings.endpoint, error = %err, "connection failed");
                return Err(match err {
                    BridgeError::Connection { .. } => err,
                    other => BridgeError::connection(&settings.endpoint, other.to_string()),
                });
            }
        };

        let watcher = spawn_liveness_watcher(Arc::clone(&session), Arc::clone(groups));
        *self.active.write().await = Some(ActiveSession { session, watcher });
        self.stats.record_connect();

        info!(endpoint = %settings.endpoint, "session established");
        Ok(())
    }

    /// Disconnects, removing all groups and closing the session.
    ///
    /// Idempotent: with no active session this is a no-op.
    pub async fn disconnect(&self, groups: &Arc<GroupManager>) {
        let _guard = self.lifecycle.lock().await;
        if self.teardown(groups).await {
            self.stats.record_disconnect();
            info!("session closed");
        } else {
            debug!("disconnect requested with no active session");
        }
    }

    /// Tears down the current session, if any. Groups are removed before
    /// the session closes so subscriptions detach while it is still usable.
    /// Must be called with the lifecycle lock held.
    async fn teardown(&self, groups: &Arc<GroupManager>) -> bool {
        let Some(active) = self.active.write().await.take() else {
            return false;
        };

        active.abort_watcher();
        groups.invalidate_all(Some(&active.session)).await;
        if let Err(err) = active.session.close().await {
            warn!(error = %err, "error while closing the previous session");
        }
        true
    }

    // =========================================================================
    // Read / Write gateway
    // =========================================================================

    /// Reads the current value of one point.
    ///
    /// # Errors
    ///
    /// [`BridgeError::SessionNotConnected`] without a live session;
    /// [`BridgeError::ReadFailure`] when the point reports a bad status.
    pub async fn read_one(&self, point: &str) -> BridgeResult<TagValue> {
        let session = self.connected_session().await?;
        let node: NodeId = point.parse()?;

        let outcomes = session.read_values(std::slice::from_ref(&node)).await?;
        let outcome = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::read_failed(point, "server returned no result"))?;

        if outcome.is_good() {
            Ok(outcome.value)
        } else {
            Err(BridgeError::read_failed(
                point,
                format!("bad status {}", outcome.status),
            ))
        }
    }

    /// Reads several points in one request.
    ///
    /// The result has exactly one entry per requested point, in request
    /// order. A point with a bad status (or an unparseable identifier) maps
    /// to `None` instead of failing the batch.
    ///
    /// # Errors
    ///
    /// [`BridgeError::SessionNotConnected`] without a live session. An
    /// empty request is rejected as a read failure.
    pub async fn read_many(&self, points: &[String]) -> BridgeResult<Vec<(String, Option<TagValue>)>> {
        let session = self.connected_session().await?;
        if points.is_empty() {
            return Err(BridgeError::read_failed("", "point list is empty"));
        }

        // Parse what we can; unparseable entries stay in the result as None
        // without aborting their siblings.
        let parsed: Vec<(usize, NodeId)> = points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                point.parse::<NodeId>().ok().map(|node| (index, node))
            })
            .collect();

        let nodes: Vec<NodeId> = parsed.iter().map(|(_, node)| node.clone()).collect();
        let outcomes = if nodes.is_empty() {
            Vec::new()
        } else {
            session.read_values(&nodes).await?
        };

        let mut results: Vec<(String, Option<TagValue>)> = points
            .iter()
            .map(|point| (point.clone(), None))
            .collect();
        for ((index, _), outcome) in parsed.iter().zip(outcomes) {
            if outcome.is_good() {
                results[*index].1 = Some(outcome.value);
            }
        }

        Ok(results)
    }

    /// Writes a raw value to a point, coercing it per the declared type.
    ///
    /// # Errors
    ///
    /// [`BridgeError::SessionNotConnected`] without a live session;
    /// [`BridgeError::Coercion`] when the raw value cannot match the
    /// declared type; [`BridgeError::WriteFailure`] when the server rejects
    /// the write.
    pub async fn write(
        &self,
        point: &str,
        raw: &serde_json::Value,
        declared_type: Option<&str>,
    ) -> BridgeResult<()> {
        let session = self.connected_session().await?;
        let node: NodeId = point.parse()?;

        let declared = declared_type.and_then(DeclaredType::parse);
        let value = coerce(raw, declared)?;

        let outcome = session.write_value(&node, value).await?;
        if outcome.is_good() {
            Ok(())
        } else {
            Err(BridgeError::write_failed(
                point,
                format!("bad status {}", outcome.status),
            ))
        }
    }

    /// Returns the current session or [`BridgeError::SessionNotConnected`].
    async fn connected_session(&self) -> BridgeResult<ServerSessionHandle> {
        match self.current().await {
            Some(session) if session.is_connected() => Ok(session),
            _ => Err(BridgeError::SessionNotConnected),
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

// =============================================================================
// Liveness watcher
// =============================================================================

/// Spawns the watcher that cascades group invalidation on liveness failure.
///
/// The watcher only reacts; it never reconnects. It ends when the session's
/// liveness broadcast closes or the session is torn down.
fn spawn_liveness_watcher(
    session: ServerSessionHandle,
    groups: Arc<GroupManager>,
) -> JoinHandle<()> {
    let mut events = session.liveness_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(state) if !state.is_running() => {
                    warn!(%state, "server is no longer running; invalidating all groups");
                    groups.invalidate_all(Some(&session)).await;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "liveness watcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// =============================================================================
// SessionStats
// =============================================================================

/// Counters for session lifecycle transitions.
#[derive(Debug, Default)]
pub struct SessionStats {
    connects: AtomicU64,
    reuses: AtomicU64,
    disconnects: AtomicU64,
    failures: AtomicU64,
}

impl SessionStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    fn record_reuse(&self) {
        self.reuses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of sessions established.
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Number of connect calls satisfied by the existing session.
    pub fn reuses(&self) -> u64 {
        self.reuses.load(Ordering::Relaxed)
    }

    /// Number of explicit disconnects.
    pub fn disconnects(&self) -> u64 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Number of failed connection attempts.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
