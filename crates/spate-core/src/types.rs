// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for SPATE.
//!
//! This module provides the protocol-agnostic identifiers and value objects
//! that flow between the session layer, the group manager, and the streaming
//! surface.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::TagValue;

// =============================================================================
// GroupCode
// =============================================================================

/// Logical identifier naming a set of points that are monitored together.
///
/// Group codes are opaque strings supplied by the caller; SPATE never
/// interprets their contents. At most one active subscription group exists
/// per code.
///
/// # Examples
///
/// ```
/// use spate_core::types::GroupCode;
///
/// let code = GroupCode::new("G0001");
/// assert_eq!(code.as_str(), "G0001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCode(String);

impl GroupCode {
    /// Creates a new group code.
    #[inline]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for GroupCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

// =============================================================================
// PointDefinition
// =============================================================================

/// Definition of a single monitored point, as returned by a point resolver.
///
/// The address is a protocol-level address string (for OPC UA, a node
/// identifier relative to the session's namespace context). The client
/// handle correlates change notifications back to this point and must be
/// unique within its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDefinition {
    /// Protocol address of the point.
    pub address: String,

    /// Consumer-facing correlation handle, unique within the group.
    pub client_handle: u32,

    /// Per-point sampling interval override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rate_ms: Option<u64>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PointDefinition {
    /// Creates a point definition with the default sampling interval.
    pub fn new(address: impl Into<String>, client_handle: u32) -> Self {
        Self {
            address: address.into(),
            client_handle,
            update_rate_ms: None,
            description: None,
        }
    }

    /// Sets the per-point sampling interval in milliseconds.
    pub fn with_update_rate(mut self, millis: u64) -> Self {
        self.update_rate_ms = Some(millis);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// TagChangeEvent
// =============================================================================

/// Immutable value-change event delivered to stream consumers.
///
/// Events are produced only for notifications whose status is good; the
/// notification path drops bad-status updates before an event is built.
/// The client handle is carried as a string on the wire so consumers can
/// treat it as an opaque correlation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagChangeEvent {
    /// Correlation handle of the point that changed.
    pub client_handle: String,

    /// The new value.
    pub value: TagValue,

    /// Source timestamp reported by the server.
    pub timestamp: DateTime<Utc>,
}

impl TagChangeEvent {
    /// Creates a new tag change event.
    pub fn new(client_handle: impl Into<String>, value: TagValue, timestamp: DateTime<Utc>) -> Self {
        Self {
            client_handle: client_handle.into(),
            value,
            timestamp,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
