// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for SPATE.
//!
//! # Loading Pipeline
//!
//! 1. Read and parse the YAML file
//! 2. Apply `SPATE_*` environment variable overrides
//! 3. Validate the result
//!
//! # Environment Variable Overrides
//!
//! ```text
//! SPATE_OPCUA_ENDPOINT_URL=opc.tcp://plc:4840
//! SPATE_OPCUA_USE_SECURITY=true
//! SPATE_API_HOST=127.0.0.1
//! SPATE_API_PORT=9090
//! SPATE_LOG_LEVEL=debug
//! ```

use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::SpateConfig;

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads SPATE configuration files.
///
/// # Examples
///
/// ```no_run
/// use spate_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("spate.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether environment overrides are applied.
    apply_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with the default `SPATE` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "SPATE".to_string(),
            apply_env: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_overrides(mut self, enabled: bool) -> Self {
        self.apply_env = enabled;
        self
    }

    /// Loads, overrides, and validates a configuration file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<SpateConfig> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))?;
        let mut config: SpateConfig = serde_yaml::from_str(&raw)?;

        if self.apply_env {
            self.apply_overrides(&mut config);
        }

        config.validate()?;
        debug!(path = %path.display(), groups = config.groups.len(), "configuration loaded");
        Ok(config)
    }

    /// Parses a configuration from a YAML string (no env overrides).
    pub fn parse(&self, yaml: &str) -> ConfigResult<SpateConfig> {
        let config: SpateConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut SpateConfig) {
        if let Some(value) = self.var("OPCUA_ENDPOINT_URL") {
            config.opcua.endpoint_url = value;
        }
        if let Some(value) = self.var("OPCUA_USE_SECURITY") {
            match value.parse::<bool>() {
                Ok(flag) => config.opcua.use_security = flag,
                Err(_) => warn!(%value, "ignoring non-boolean OPCUA_USE_SECURITY override"),
            }
        }
        if let Some(value) = self.var("OPCUA_USERNAME") {
            config.opcua.username = Some(value);
        }
        if let Some(value) = self.var("OPCUA_PASSWORD") {
            config.opcua.password = Some(value);
        }
        if let Some(value) = self.var("API_HOST") {
            config.api.host = value;
        }
        if let Some(value) = self.var("API_PORT") {
            match value.parse::<u16>() {
                Ok(port) => config.api.port = port,
                Err(_) => warn!(%value, "ignoring non-numeric API_PORT override"),
            }
        }
        if let Some(value) = self.var("LOG_LEVEL") {
            config.logging.level = value;
        }
        if let Some(value) = self.var("LOG_FORMAT") {
            config.logging.format = value;
        }
    }

    fn var(&self, suffix: &str) -> Option<String> {
        env::var(format!("{}_{}", self.env_prefix, suffix)).ok()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a configuration file with the default loader.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<SpateConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================
