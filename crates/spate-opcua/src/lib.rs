// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA session/subscription bridge core for SPATE.
//!
//! This crate owns the single live connection to the remote automation
//! server and everything that hangs off it:
//!
//! - **Session**: connect/disconnect/reuse, liveness watching, and the
//!   ad-hoc read/write gateway ([`session::SessionManager`])
//! - **Groups**: named sets of monitored points with one server
//!   subscription and one event channel each ([`group::GroupManager`])
//! - **Transport**: the abstract remote-server boundary
//!   ([`transport::ServerConnector`], [`transport::ServerSession`])
//! - **Simulator**: an in-process server implementation for demos and
//!   tests ([`sim::SimServer`])
//! - **Bridge**: the facade composing it all ([`bridge::OpcUaBridge`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spate_core::{GroupCode, StaticPointResolver};
//! use spate_opcua::{OpcUaBridge, SessionSettings, SimServer};
//! use tokio_util::sync::CancellationToken;
//!
//! let server = SimServer::new();
//! let bridge = OpcUaBridge::new(
//!     Arc::new(server.connector()),
//!     Arc::new(StaticPointResolver::new()),
//!     SessionSettings::new("opc.tcp://localhost:4840"),
//! );
//!
//! bridge.connect(&Default::default()).await?;
//! bridge.start_monitoring(GroupCode::new("G0001")).await?;
//! let stream = bridge.subscribe_to_changes(&GroupCode::new("G0001"), CancellationToken::new());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod group;
pub mod session;
pub mod sim;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use bridge::OpcUaBridge;
pub use group::{GroupInfo, GroupManager};
pub use session::{SessionManager, SessionStats};
pub use sim::{SimConnector, SimServer, SimSession};
pub use transport::{
    MonitoredItemId, MonitoredItemRequest, NotificationReceiver, NotificationSender,
    RawNotification, ReadOutcome, ServerConnector, ServerSession, ServerSessionHandle,
    SubscriptionId, WriteOutcome,
};
pub use types::{
    ConnectOptions, NodeId, NodeIdentifier, SecurityMode, ServerState, SessionSettings,
    SessionSettingsBuilder, StatusCode, UserIdentity, DEFAULT_PUBLISHING_INTERVAL,
    DEFAULT_SAMPLING_INTERVAL, DEFAULT_SESSION_TIMEOUT,
};
