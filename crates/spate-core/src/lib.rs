// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # spate-core
//!
//! Core abstractions and shared types for the SPATE streaming bridge.
//!
//! This crate provides the foundational pieces used across all SPATE
//! components:
//!
//! - **Types**: `GroupCode`, `PointDefinition`, `TagChangeEvent`
//! - **Value**: the `TagValue` tagged variant and declared-type coercion
//! - **Error**: the unified `BridgeError` taxonomy
//! - **Channel**: per-group unbounded event channels and their registry
//! - **Provider**: the point-resolution boundary trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use spate_core::{ChannelRegistry, GroupCode, TagChangeEvent, TagValue};
//! use chrono::Utc;
//!
//! let registry = ChannelRegistry::new();
//! let channel = registry.open(GroupCode::new("G0001"));
//! channel.publish(TagChangeEvent::new("5", TagValue::Integer(42), Utc::now()));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod error;
pub mod provider;
pub mod types;
pub mod value;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use channel::{ChannelRegistry, EventChannel, TagChangeStream, DEPTH_WARN_THRESHOLD};
pub use error::{BridgeError, BridgeResult};
pub use provider::{PointResolver, StaticPointResolver};
pub use types::{GroupCode, PointDefinition, TagChangeEvent};
pub use value::{coerce, DeclaredType, TagValue};

/// Crate version string, shared by the CLI and the API health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
