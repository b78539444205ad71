// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

use axum::extract::State;
use axum::Json;

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health
///
/// Liveness probe with a small status summary.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.bridge.is_connected().await;
    let active_groups = state.bridge.active_groups().len();
    Json(HealthResponse::healthy(connected, active_groups))
}
