// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle handlers.

use axum::extract::State;
use tracing::warn;

use spate_opcua::ConnectOptions;

use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/opcua/connect
///
/// Connects to the automation server, reusing an already-connected session.
/// The request body optionally overrides the configured endpoint, security
/// selection, and identity.
pub async fn connect(
    State(state): State<AppState>,
    axum::Json(options): axum::Json<ConnectOptions>,
) -> ApiResponse<bool> {
    match state.bridge.connect(&options).await {
        Ok(()) => ApiResponse::success(true),
        Err(err) => {
            warn!(error = %err, "connect request failed");
            ApiResponse::error(err)
        }
    }
}

/// GET /api/v1/opcua/status
///
/// Reports whether a live session exists. No side effects.
pub async fn status(State(state): State<AppState>) -> ApiResponse<bool> {
    ApiResponse::success(state.bridge.is_connected().await)
}

/// POST /api/v1/opcua/disconnect
///
/// Closes the session and removes all subscription groups. Idempotent.
pub async fn disconnect(State(state): State<AppState>) -> ApiResponse<bool> {
    state.bridge.disconnect().await;
    ApiResponse::success(true)
}
