// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-group event channels and the channel registry.
//!
//! Each active subscription group owns exactly one [`EventChannel`]: an
//! unbounded FIFO queue of [`TagChangeEvent`]s with an explicit completed
//! state. The notification path writes, at most one stream consumer reads,
//! and completion is observed by the consumer as "drain what is buffered,
//! then end".
//!
//! # Design
//!
//! - The producer side is shared behind a mutex-guarded `Option` so that
//!   completing the channel drops the sender once, atomically, for every
//!   holder. Publishing after completion is a silent no-op.
//! - The consumer side is a single receiver behind an async mutex. Every
//!   [`EventChannel::stream`] call produces a fresh stream over the same
//!   receiver, so a new stream never replays delivered events; it observes
//!   only what is produced from that point on. Two simultaneous streams
//!   race for events non-deterministically, which is unsupported but not
//!   prevented.
//! - Capacity is unbounded. A slow consumer grows the queue instead of
//!   blocking the producer; a warning is logged once when the approximate
//!   depth crosses [`DEPTH_WARN_THRESHOLD`].

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::types::{GroupCode, TagChangeEvent};

/// Approximate queue depth at which a slow-consumer warning is emitted.
pub const DEPTH_WARN_THRESHOLD: i64 = 100_000;

/// A boxed stream of tag change events.
pub type TagChangeStream = Pin<Box<dyn Stream<Item = TagChangeEvent> + Send>>;

// =============================================================================
// EventChannel
// =============================================================================

/// Unbounded single-producer-path, single-consumer event queue for one group.
#[derive(Debug, Clone)]
pub struct EventChannel {
    /// Producer handle. `None` once the channel has completed.
    tx: Arc<parking_lot::Mutex<Option<mpsc::UnboundedSender<TagChangeEvent>>>>,

    /// Consumer handle, shared by successive stream instances.
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<TagChangeEvent>>>,

    /// Approximate number of buffered events.
    depth: Arc<AtomicI64>,

    /// Whether the slow-consumer warning has been emitted.
    depth_warned: Arc<AtomicBool>,
}

impl EventChannel {
    /// Creates a new, empty channel.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Arc::new(parking_lot::Mutex::new(Some(tx))),
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
            depth: Arc::new(AtomicI64::new(0)),
            depth_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enqueues an event.
    ///
    /// Returns `false` if the channel has already completed; the event is
    /// dropped in that case.
    pub fn publish(&self, event: TagChangeEvent) -> bool {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            trace!("event dropped: channel completed");
            return false;
        };

        if tx.send(event).is_err() {
            return false;
        }

        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        if depth >= DEPTH_WARN_THRESHOLD && !self.depth_warned.swap(true, Ordering::Relaxed) {
            warn!(depth, "event channel is backing up; consumer is too slow");
        }
        true
    }

    /// Completes the channel.
    ///
    /// The producer handle is dropped exactly once; buffered events remain
    /// readable and the consumer stream ends after draining them. Returns
    /// `true` only for the call that performed the completion.
    pub fn complete(&self) -> bool {
        self.tx.lock().take().is_some()
    }

    /// Returns `true` if the channel has completed.
    pub fn is_completed(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Returns the approximate number of buffered events.
    pub fn depth(&self) -> i64 {
        self.depth.load(Ordering::Relaxed).max(0)
    }

    /// Produces a fresh event stream over this channel.
    ///
    /// The stream yields events in FIFO order until the channel completes
    /// (after draining) or `cancel` fires. Cancellation ends only this
    /// stream; the channel and its producer are unaffected. Events already
    /// delivered to an earlier stream are never replayed.
    pub fn stream(
        &self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = TagChangeEvent> + Send + 'static {
        let rx = Arc::clone(&self.rx);
        let depth = Arc::clone(&self.depth);

        futures::stream::unfold((rx, depth, cancel), |(rx, depth, cancel)| async move {
            let next = {
                let mut guard = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    guard = rx.lock() => guard,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    event = guard.recv() => event,
                }
            };

            match next {
                Some(event) => {
                    depth.fetch_sub(1, Ordering::Relaxed);
                    Some((event, (rx, depth, cancel)))
                }
                None => None,
            }
        })
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ChannelRegistry
// =============================================================================

/// Concurrent map of group codes to their event channels.
///
/// Insertion and removal are safe from the control path, the notification
/// path, and stream readers simultaneously. Removal is remove-if-present:
/// two concurrent teardown attempts for the same code complete the channel
/// once.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: DashMap<GroupCode, EventChannel>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Creates and registers a fresh channel for `code`, returning a handle.
    ///
    /// Any channel previously registered under the same code is completed
    /// before being replaced.
    pub fn open(&self, code: GroupCode) -> EventChannel {
        let channel = EventChannel::new();
        if let Some(previous) = self.channels.insert(code.clone(), channel.clone()) {
            if previous.complete() {
                debug!(group = %code, "replaced an existing event channel");
            }
        }
        channel
    }

    /// Returns the channel registered under `code`, if any.
    pub fn get(&self, code: &GroupCode) -> Option<EventChannel> {
        self.channels.get(code).map(|entry| entry.value().clone())
    }

    /// Removes and completes the channel registered under `code`.
    ///
    /// Returns `true` if a channel was present. Safe to call repeatedly and
    /// concurrently; only one caller observes the removal.
    pub fn complete_and_remove(&self, code: &GroupCode) -> bool {
        match self.channels.remove(code) {
            Some((_, channel)) => {
                channel.complete();
                true
            }
            None => false,
        }
    }

    /// Removes and completes every registered channel, returning how many
    /// were present.
    pub fn complete_all(&self) -> usize {
        let codes: Vec<GroupCode> = self.channels.iter().map(|e| e.key().clone()).collect();
        let mut completed = 0;
        for code in codes {
            if self.complete_and_remove(&code) {
                completed += 1;
            }
        }
        completed
    }

    /// Produces a stream for the channel under `code`.
    ///
    /// If no channel exists the stream is immediately empty.
    pub fn subscribe(&self, code: &GroupCode, cancel: CancellationToken) -> TagChangeStream {
        match self.get(code) {
            Some(channel) => Box::pin(channel.stream(cancel)),
            None => Box::pin(futures::stream::empty()),
        }
    }

    /// Returns `true` if a channel is registered under `code`.
    pub fn contains(&self, code: &GroupCode) -> bool {
        self.channels.contains_key(code)
    }

    /// Returns the number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TagValue;
    use chrono::Utc;
    use futures::StreamExt;
    use std::time::Duration;

    fn event(handle: &str, value: i64) -> TagChangeEvent {
        TagChangeEvent::new(handle, TagValue::Integer(value), Utc::now())
    }

    #[tokio::test]
    async fn test_publish_then_stream() {
        let channel = EventChannel::new();
        assert!(channel.publish(event("1", 10)));
        assert!(channel.publish(event("1", 11)));

        let mut stream = Box::pin(channel.stream(CancellationToken::new()));
        assert_eq!(stream.next().await.unwrap().value, TagValue::Integer(10));
        assert_eq!(stream.next().await.unwrap().value, TagValue::Integer(11));
    }

    #[tokio::test]
    async fn test_complete_drains_then_ends() {
        let channel = EventChannel::new();
        channel.publish(event("1", 1));
        channel.publish(event("1", 2));

        assert!(channel.complete());
        assert!(!channel.complete()); // act once
        assert!(!channel.publish(event("1", 3)));

        let events: Vec<_> = channel.stream(CancellationToken::new()).collect().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_stream_does_not_replay() {
        let channel = EventChannel::new();
        channel.publish(event("1", 1));

        {
            let mut first = Box::pin(channel.stream(CancellationToken::new()));
            assert_eq!(first.next().await.unwrap().value, TagValue::Integer(1));
        }

        channel.publish(event("1", 2));
        channel.complete();

        let second: Vec<_> = channel
            .stream(CancellationToken::new())
            .collect()
            .await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].value, TagValue::Integer(2));
    }

    #[tokio::test]
    async fn test_cancellation_stops_reader_only() {
        let channel = EventChannel::new();
        let cancel = CancellationToken::new();
        let mut stream = Box::pin(channel.stream(cancel.clone()));

        let reader = tokio::spawn(async move { stream.next().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        assert!(reader.await.unwrap().is_none());

        // Producer side is untouched by a cancelled reader.
        assert!(!channel.is_completed());
        assert!(channel.publish(event("1", 5)));

        let mut fresh = Box::pin(channel.stream(CancellationToken::new()));
        assert_eq!(fresh.next().await.unwrap().value, TagValue::Integer(5));
    }

    #[tokio::test]
    async fn test_registry_remove_if_present() {
        let registry = ChannelRegistry::new();
        let code = GroupCode::new("G0001");

        registry.open(code.clone());
        assert!(registry.contains(&code));
        assert!(registry.complete_and_remove(&code));
        assert!(!registry.complete_and_remove(&code));
        assert!(!registry.contains(&code));
    }

    #[tokio::test]
    async fn test_registry_subscribe_unknown_is_empty() {
        let registry = ChannelRegistry::new();
        let stream = registry.subscribe(&GroupCode::new("missing"), CancellationToken::new());
        let events: Vec<_> = stream.collect().await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_registry_reopen_completes_previous() {
        let registry = ChannelRegistry::new();
        let code = GroupCode::new("G0001");

        let first = registry.open(code.clone());
        let second = registry.open(code.clone());

        assert!(first.is_completed());
        assert!(!second.is_completed());
        assert_eq!(registry.len(), 1);
    }
}
