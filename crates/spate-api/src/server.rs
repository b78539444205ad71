// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP server exposing the control surface.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a server over the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Builds the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            // Health (public)
            .route("/health", get(handlers::health))
            // Session lifecycle
            .route("/api/v1/opcua/connect", post(handlers::connect))
            .route("/api/v1/opcua/status", get(handlers::status))
            .route("/api/v1/opcua/disconnect", post(handlers::disconnect))
            // Ad-hoc point access
            .route("/api/v1/opcua/read", post(handlers::read_value))
            .route(
                "/api/v1/opcua/read-multiple",
                post(handlers::read_multiple_values),
            )
            .route("/api/v1/opcua/write", post(handlers::write_value))
            // Monitoring
            .route(
                "/api/v1/opcua/monitor/start",
                post(handlers::start_monitoring),
            )
            .route(
                "/api/v1/opcua/monitor/stop",
                post(handlers::stop_monitoring),
            )
            .route(
                "/api/v1/opcua/monitor/stream/{group_code}",
                get(handlers::stream_tag_changes),
            );

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.state.config.request_timeout));
        router = router.layer(middleware);

        if self.state.config.cors_enabled {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.with_state(self.state.clone())
    }

    /// Runs the server until the listener fails.
    pub async fn run(self) -> ApiResult<()> {
        let addr = self.state.config.socket_addr();
        self.serve(addr, std::future::pending()).await
    }

    /// Runs the server until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.state.config.socket_addr();
        self.serve(addr, shutdown_signal).await
    }

    async fn serve(
        self,
        addr: SocketAddr,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();

        info!("starting API server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| ApiError::internal(format!("failed to bind {}: {}", addr, err)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|err| ApiError::internal(format!("server error: {}", err)))?;

        info!("API server shutdown complete");
        Ok(())
    }
}
