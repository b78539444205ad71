// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Group monitoring handlers, including the SSE event stream.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use spate_core::GroupCode;

use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Request bodies
// =============================================================================

/// Body of a monitor/start request.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMonitoringRequest {
    /// Code of the group to start.
    pub group_code: String,
}

/// Body of a monitor/stop request.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopMonitoringRequest {
    /// Code of the group to stop.
    pub group_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/opcua/monitor/start
///
/// Starts (or restarts) monitoring for a group. Reconnects once with
/// default settings when no session is live.
pub async fn start_monitoring(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<StartMonitoringRequest>,
) -> ApiResponse<bool> {
    let code = GroupCode::new(request.group_code);
    match state.bridge.start_monitoring(code.clone()).await {
        Ok(()) => ApiResponse::success(true),
        Err(err) => {
            warn!(group = %code, error = %err, "start monitoring failed");
            ApiResponse::error(err)
        }
    }
}

/// POST /api/v1/opcua/monitor/stop
///
/// Stops monitoring for a group. Succeeds whether or not the group exists.
pub async fn stop_monitoring(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<StopMonitoringRequest>,
) -> ApiResponse<bool> {
    let code = GroupCode::new(request.group_id);
    state.bridge.stop_monitoring(&code).await;
    ApiResponse::success(true)
}

/// GET /api/v1/opcua/monitor/stream/{group_code}
///
/// Streams tag change events for a group as server-sent events, one
/// `data: <json>` block per event, flushed immediately. The stream ends
/// when the group's channel completes; a client disconnect cancels only
/// this reader. With no channel for the code the stream is empty.
pub async fn stream_tag_changes(
    State(state): State<AppState>,
    Path(group_code): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let code = GroupCode::new(group_code);
    debug!(group = %code, "stream reader attached");

    // A client disconnect drops the response body and with it the reader's
    // claim on the channel; the producer side never notices.
    let events = state
        .bridge
        .subscribe_to_changes(&code, CancellationToken::new())
        .filter_map(|event| async move {
            match Event::default().json_data(&event) {
                Ok(frame) => Some(Ok::<_, Infallible>(frame)),
                Err(err) => {
                    warn!(error = %err, "failed to serialize tag change event");
                    None
                }
            }
        });

    Sse::new(events).keep_alive(KeepAlive::default())
}
