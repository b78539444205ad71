// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ad-hoc point read/write handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::warn;

use spate_core::TagValue;

use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Request bodies
// =============================================================================

/// Body of a single-point read.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRequest {
    /// The point to read.
    pub node_id: String,
}

/// Body of a batch read.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMultipleRequest {
    /// The points to read, in response order.
    pub node_ids: Vec<String>,
}

/// Body of a write.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    /// The point to write.
    pub node_id: String,

    /// Raw value; coerced per `data_type` before dispatch.
    pub value: serde_json::Value,

    /// Declared target type (`int`, `double`, `bool`, `string`). Absent or
    /// unrecognized types pass the raw value through unchanged.
    #[serde(default)]
    pub data_type: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/opcua/read
///
/// Reads the current value of one point without a subscription.
pub async fn read_value(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<ReadRequest>,
) -> ApiResponse<TagValue> {
    match state.bridge.read_one(&request.node_id).await {
        Ok(value) => ApiResponse::success(value),
        Err(err) => {
            warn!(node = %request.node_id, error = %err, "read request failed");
            ApiResponse::error(err)
        }
    }
}

/// POST /api/v1/opcua/read-multiple
///
/// Reads several points in one request. The response maps each requested
/// point to its value, in request order; points with a bad status map to
/// null instead of failing the batch.
pub async fn read_multiple_values(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<ReadMultipleRequest>,
) -> ApiResponse<serde_json::Map<String, serde_json::Value>> {
    match state.bridge.read_many(&request.node_ids).await {
        Ok(results) => {
            let mut data = serde_json::Map::with_capacity(results.len());
            for (point, value) in results {
                let json = match value {
                    Some(value) => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                    None => serde_json::Value::Null,
                };
                data.insert(point, json);
            }
            ApiResponse::success(data)
        }
        Err(err) => {
            warn!(count = request.node_ids.len(), error = %err, "batch read failed");
            ApiResponse::error(err)
        }
    }
}

/// POST /api/v1/opcua/write
///
/// Writes a value to one point, coercing it per the declared type first.
pub async fn write_value(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<WriteRequest>,
) -> ApiResponse<bool> {
    match state
        .bridge
        .write(&request.node_id, &request.value, request.data_type.as_deref())
        .await
    {
        Ok(()) => ApiResponse::success(true),
        Err(err) => {
            warn!(node = %request.node_id, error = %err, "write request failed");
            ApiResponse::error(err)
        }
    }
}
