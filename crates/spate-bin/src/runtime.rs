// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bridge runtime orchestration.
//!
//! Wires the configured pieces together in order: configuration, the
//! simulated automation server, the point resolver, the bridge, and the
//! HTTP control surface, then runs until shutdown is signaled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use spate_api::{ApiConfig, ApiServer, AppState};
use spate_config::{load_config, ApiSection, SpateConfig};
use spate_core::{StaticPointResolver, TagValue};
use spate_opcua::{OpcUaBridge, SecurityMode, SessionSettings, SimServer};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`BridgeRuntime`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    demo: bool,
    connect_on_start: bool,
}

impl RuntimeBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables demo mode (periodic simulated value changes).
    pub fn demo(mut self, enabled: bool) -> Self {
        self.demo = enabled;
        self
    }

    /// Connects to the server at startup instead of on first request.
    pub fn connect_on_start(mut self, enabled: bool) -> Self {
        self.connect_on_start = enabled;
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> BinResult<BridgeRuntime> {
        let path = self
            .config_path
            .ok_or_else(|| BinError::config("no configuration path given"))?;
        let config = load_config(&path)?;

        Ok(BridgeRuntime {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            demo: self.demo,
            connect_on_start: self.connect_on_start,
        })
    }
}

// =============================================================================
// BridgeRuntime
// =============================================================================

/// The main runtime orchestrating all SPATE components.
pub struct BridgeRuntime {
    config: Arc<SpateConfig>,
    shutdown: ShutdownCoordinator,
    demo: bool,
    connect_on_start: bool,
}

impl BridgeRuntime {
    /// Creates a runtime over an already-loaded configuration.
    pub fn new(config: SpateConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            demo: false,
            connect_on_start: false,
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the bridge until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            gateway = %self.config.gateway.id,
            version = spate_core::VERSION,
            "starting SPATE bridge"
        );

        // Simulated automation server, seeded with the configured points.
        let server = SimServer::new();
        let mut seeded = 0usize;
        for group in &self.config.groups {
            for point in &group.points {
                server.set_value(&point.address, TagValue::Integer(0));
                seeded += 1;
            }
        }
        info!(points = seeded, groups = self.config.groups.len(), "simulator seeded");

        let resolver = StaticPointResolver::from_table(self.config.point_table());
        let settings = session_settings(&self.config)?;
        let bridge = Arc::new(OpcUaBridge::new(
            Arc::new(server.connector()),
            Arc::new(resolver),
            settings,
        ));

        if self.connect_on_start {
            if let Err(err) = bridge.connect(&Default::default()).await {
                warn!(error = %err, "initial connect failed; continuing disconnected");
            }
        }

        if self.demo {
            spawn_demo_task(Arc::clone(&server), self.shutdown.clone(), &self.config);
        }

        self.shutdown.listen_for_signals();

        let state = AppState::new(api_config(&self.config.api)?, Arc::clone(&bridge));
        let result = ApiServer::new(state)
            .run_with_shutdown(self.shutdown.signal())
            .await;

        bridge.disconnect().await;
        info!("SPATE bridge shutdown complete");

        result.map_err(BinError::from)
    }
}

// =============================================================================
// Wiring helpers
// =============================================================================

/// Builds session settings from the configuration.
fn session_settings(config: &SpateConfig) -> BinResult<SessionSettings> {
    let opcua = &config.opcua;

    let mut builder = SessionSettings::builder()
        .endpoint(&opcua.endpoint_url)
        .security_mode(SecurityMode::from_flag(opcua.use_security))
        .session_timeout(Duration::from_millis(opcua.session_timeout_ms))
        .publishing_interval(Duration::from_millis(opcua.publishing_interval_ms))
        .default_sampling_interval(Duration::from_millis(opcua.default_sampling_interval_ms));

    if let Some(username) = &opcua.username {
        builder = builder.user_name(username, opcua.password.clone().unwrap_or_default());
    }

    builder.build().map_err(|err| BinError::config(err.to_string()))
}

/// Builds the API server configuration from its config section.
fn api_config(section: &ApiSection) -> BinResult<ApiConfig> {
    let host = section
        .host
        .parse()
        .map_err(|_| BinError::config(format!("invalid api.host '{}'", section.host)))?;

    Ok(ApiConfig::default()
        .with_host(host)
        .with_port(section.port)
        .with_request_timeout(Duration::from_secs(section.request_timeout_secs))
        .with_cors(section.cors_enabled))
}

/// Spawns the demo task that varies every configured point once a second.
fn spawn_demo_task(server: Arc<SimServer>, shutdown: ShutdownCoordinator, config: &SpateConfig) {
    let addresses: Vec<String> = config
        .groups
        .iter()
        .flat_map(|group| group.points.iter().map(|point| point.address.clone()))
        .collect();
    if addresses.is_empty() {
        warn!("demo mode requested but no points are configured");
        return;
    }

    info!(points = addresses.len(), "demo mode: simulating value changes");
    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        let mut tick = 0i64;
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = stop.recv() => break,
                _ = interval.tick() => {
                    tick += 1;
                    for address in &addresses {
                        server.update_value(address, TagValue::Integer(tick));
                    }
                }
            }
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_settings_from_config() {
        let mut config = SpateConfig::default();
        config.opcua.endpoint_url = "opc.tcp://plc:4840".into();
        config.opcua.use_security = true;
        config.opcua.username = Some("operator".into());
        config.opcua.publishing_interval_ms = 250;

        let settings = session_settings(&config).unwrap();
        assert_eq!(settings.endpoint, "opc.tcp://plc:4840");
        assert_eq!(settings.security_mode, SecurityMode::SignAndEncrypt);
        assert!(!settings.identity.is_anonymous());
        assert_eq!(settings.publishing_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_api_config_from_section() {
        let section = ApiSection::default();
        let config = api_config(&section).unwrap();
        assert_eq!(config.port, 8080);

        let mut bad = ApiSection::default();
        bad.host = "not-an-ip".into();
        assert!(api_config(&bad).is_err());
    }
}
