// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use spate_opcua::OpcUaBridge;

use crate::config::ApiConfig;

/// State passed to every handler via axum's state extraction.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,

    /// The bridge service.
    pub bridge: Arc<OpcUaBridge>,
}

impl AppState {
    /// Creates the application state.
    pub fn new(config: ApiConfig, bridge: Arc<OpcUaBridge>) -> Self {
        Self {
            config: Arc::new(config),
            bridge,
        }
    }
}
