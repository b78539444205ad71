// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use spate_core::BridgeResult;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic response envelope used by every control-surface endpoint.
///
/// `data` and `errorMessage` are always present (possibly null) so clients
/// can bind a fixed shape: `{"success": bool, "data": T|null,
/// "errorMessage": string|null}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful.
    pub success: bool,
    /// Response data (if successful).
    pub data: Option<T>,
    /// Error message (if failed).
    pub error_message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.to_string()),
        }
    }

    /// Converts a bridge result into an envelope.
    pub fn from_result(result: BridgeResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(err),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
    /// Whether the bridge currently holds a live session.
    pub connected: bool,
    /// Number of active subscription groups.
    pub active_groups: usize,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy(connected: bool, active_groups: usize) -> Self {
        Self {
            status: "ok".to_string(),
            version: spate_core::VERSION.to_string(),
            connected,
            active_groups,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use spate_core::BridgeError;

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.error_message.is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let response: ApiResponse<bool> = ApiResponse::error("boom");
        let json = serde_json::to_value(&response).unwrap();

        // Both optional fields are explicit nulls, never omitted.
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["errorMessage"], "boom");
    }

    #[test]
    fn test_from_result() {
        let ok: ApiResponse<i32> = ApiResponse::from_result(Ok(1));
        assert!(ok.success);

        let err: ApiResponse<i32> =
            ApiResponse::from_result(Err(BridgeError::SessionNotConnected));
        assert!(!err.success);
        assert_eq!(
            err.error_message.as_deref(),
            Some("not connected to the automation server")
        );
    }
}
