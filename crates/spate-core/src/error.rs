// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error taxonomy for the bridge.
//!
//! Every failure a control-surface operation can observe is one of these
//! variants. The API layer converts them into response envelopes; nothing
//! here is allowed to escape as a panic across a service boundary.
//!
//! # Error Categories
//!
//! ```text
//! BridgeError
//! ├── Connection           - cannot establish or maintain the session
//! ├── SessionNotConnected  - operation attempted without a live session
//! ├── ReadFailure          - per-point read failure, isolated
//! ├── WriteFailure         - coercion accepted but the server rejected
//! ├── GroupNotFound        - unknown group code
//! ├── EmptyGroup           - group resolved to no points
//! ├── Provider             - point resolution itself failed
//! ├── Coercion             - raw value cannot match the declared type
//! └── StreamCancelled      - caller-initiated stream termination (normal)
//! ```

use thiserror::Error;
use tracing::Level;

/// Convenience alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

// =============================================================================
// BridgeError
// =============================================================================

/// The error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The session could not be established or maintained.
    #[error("connection to '{endpoint}' failed: {reason}")]
    Connection {
        /// Endpoint the connection was attempted against.
        endpoint: String,
        /// Underlying failure description.
        reason: String,
    },

    /// An operation required a live session and none exists.
    #[error("not connected to the automation server")]
    SessionNotConnected,

    /// A read failed for one point. Sibling reads are unaffected.
    #[error("read failed for '{node}': {reason}")]
    ReadFailure {
        /// Point the read targeted.
        node: String,
        /// Underlying failure description.
        reason: String,
    },

    /// A write was rejected by the server or produced a bad status.
    #[error("write failed for '{node}': {reason}")]
    WriteFailure {
        /// Point the write targeted.
        node: String,
        /// Underlying failure description.
        reason: String,
    },

    /// No group is known under the given code.
    #[error("no point group named '{0}'")]
    GroupNotFound(String),

    /// The group code resolved, but to an empty point list.
    #[error("point group '{0}' resolved to no points")]
    EmptyGroup(String),

    /// The point resolution provider failed.
    #[error("point resolution failed: {0}")]
    Provider(String),

    /// A raw value could not be coerced to its declared type.
    #[error("cannot coerce value: {0}")]
    Coercion(String),

    /// The caller cancelled a stream. Normal termination, never logged as
    /// an error.
    #[error("stream cancelled by the caller")]
    StreamCancelled,
}

impl BridgeError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a per-point read failure.
    pub fn read_failed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReadFailure {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write failure.
    pub fn write_failed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailure {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Creates a group-not-found error.
    pub fn group_not_found(code: impl Into<String>) -> Self {
        Self::GroupNotFound(code.into())
    }

    /// Creates an empty-group error.
    pub fn empty_group(code: impl Into<String>) -> Self {
        Self::EmptyGroup(code.into())
    }

    /// Creates a provider error.
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider(reason.into())
    }

    /// Creates a coercion error.
    pub fn coercion(reason: impl Into<String>) -> Self {
        Self::Coercion(reason.into())
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Returns `true` if retrying the same operation could succeed without
    /// caller intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::SessionNotConnected | Self::ReadFailure { .. }
        )
    }

    /// Returns `true` if this error represents normal, caller-initiated
    /// termination rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::StreamCancelled)
    }

    /// Returns the level this error should be logged at.
    pub fn log_level(&self) -> Level {
        match self {
            Self::Connection { .. } | Self::Provider(_) => Level::ERROR,
            Self::SessionNotConnected
            | Self::ReadFailure { .. }
            | Self::WriteFailure { .. }
            | Self::GroupNotFound(_)
            | Self::EmptyGroup(_)
            | Self::Coercion(_) => Level::WARN,
            Self::StreamCancelled => Level::DEBUG,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BridgeError::connection("opc.tcp://plc:4840", "refused");
        assert_eq!(
            err.to_string(),
            "connection to 'opc.tcp://plc:4840' failed: refused"
        );

        let err = BridgeError::group_not_found("G-UNKNOWN");
        assert_eq!(err.to_string(), "no point group named 'G-UNKNOWN'");
    }

    #[test]
    fn test_classification() {
        assert!(BridgeError::SessionNotConnected.is_retryable());
        assert!(!BridgeError::write_failed("p1", "rejected").is_retryable());
        assert!(BridgeError::StreamCancelled.is_cancellation());
        assert!(!BridgeError::SessionNotConnected.is_cancellation());
        assert_eq!(BridgeError::StreamCancelled.log_level(), Level::DEBUG);
    }
}
