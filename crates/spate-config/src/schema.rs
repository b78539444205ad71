// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for SPATE.
//!
//! # Schema Structure
//!
//! ```text
//! SpateConfig
//! ├── gateway: GatewaySection
//! ├── opcua:   OpcUaSection      (endpoint, security, intervals)
//! ├── api:     ApiSection        (bind address, timeouts, CORS)
//! ├── logging: LoggingSection
//! └── groups:  Vec<GroupSection> (static point-resolution table)
//! ```

use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use spate_core::PointDefinition;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default server endpoint.
pub const DEFAULT_ENDPOINT: &str = "opc.tcp://localhost:4840";

/// Default publishing interval in milliseconds.
pub const DEFAULT_PUBLISHING_INTERVAL_MS: u64 = 100;

/// Default sampling interval in milliseconds.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 1000;

/// Default session timeout in milliseconds.
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 60_000;

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default API request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for a SPATE instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SpateConfig {
    /// Gateway identification.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Automation server connection defaults.
    #[serde(default)]
    pub opcua: OpcUaSection,

    /// HTTP API settings.
    #[serde(default)]
    pub api: ApiSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Static point-group table for the built-in resolver.
    #[serde(default)]
    pub groups: Vec<GroupSection>,
}

impl SpateConfig {
    /// Validates the whole configuration tree.
    pub fn validate(&self) -> ConfigResult<()> {
        self.opcua.validate()?;
        self.api.validate()?;
        self.logging.validate()?;

        let mut codes = HashSet::new();
        for group in &self.groups {
            if group.code.is_empty() {
                return Err(ConfigError::validation("groups.code", "must not be empty"));
            }
            if !codes.insert(group.code.as_str()) {
                return Err(ConfigError::validation(
                    "groups.code",
                    format!("duplicate group code '{}'", group.code),
                ));
            }
            group.validate()?;
        }
        Ok(())
    }

    /// Builds the static point-resolution table from the `groups` section.
    pub fn point_table(&self) -> HashMap<String, Vec<PointDefinition>> {
        self.groups
            .iter()
            .map(|group| (group.code.clone(), group.point_definitions()))
            .collect()
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    /// Instance identifier used in logs.
    #[serde(default = "default_gateway_id")]
    pub id: String,
}

fn default_gateway_id() -> String {
    "spate".to_string()
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            id: default_gateway_id(),
        }
    }
}

// =============================================================================
// OPC UA
// =============================================================================

/// Connection defaults for the automation server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpcUaSection {
    /// Endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint_url: String,

    /// Whether to sign and encrypt messages.
    #[serde(default)]
    pub use_security: bool,

    /// Username for a username/password identity; anonymous when absent.
    #[serde(default)]
    pub username: Option<String>,

    /// Password paired with `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Publishing interval for subscription groups, in milliseconds.
    #[serde(default = "default_publishing_interval_ms")]
    pub publishing_interval_ms: u64,

    /// Sampling interval for points without an override, in milliseconds.
    #[serde(default = "default_sampling_interval_ms")]
    pub default_sampling_interval_ms: u64,

    /// Session timeout, in milliseconds.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_publishing_interval_ms() -> u64 {
    DEFAULT_PUBLISHING_INTERVAL_MS
}

fn default_sampling_interval_ms() -> u64 {
    DEFAULT_SAMPLING_INTERVAL_MS
}

fn default_session_timeout_ms() -> u64 {
    DEFAULT_SESSION_TIMEOUT_MS
}

impl Default for OpcUaSection {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint(),
            use_security: false,
            username: None,
            password: None,
            publishing_interval_ms: DEFAULT_PUBLISHING_INTERVAL_MS,
            default_sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
        }
    }
}

impl OpcUaSection {
    fn validate(&self) -> ConfigResult<()> {
        if !self.endpoint_url.starts_with("opc.tcp://") {
            return Err(ConfigError::validation(
                "opcua.endpoint_url",
                "must start with opc.tcp://",
            ));
        }
        if self.publishing_interval_ms == 0 {
            return Err(ConfigError::validation(
                "opcua.publishing_interval_ms",
                "must be positive",
            ));
        }
        if self.default_sampling_interval_ms == 0 {
            return Err(ConfigError::validation(
                "opcua.default_sampling_interval_ms",
                "must be positive",
            ));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::validation(
                "opcua.password",
                "password set without a username",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// API
// =============================================================================

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Bind host.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Request timeout in seconds (streaming responses are exempt).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether permissive CORS headers are emitted.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: DEFAULT_API_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cors_enabled: true,
        }
    }
}

impl ApiSection {
    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("api.port", "must not be 0"));
        }
        if self.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::validation(
                "api.host",
                format!("'{}' is not a valid IP address", self.host),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "api.request_timeout_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json, compact).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSection {
    fn validate(&self) -> ConfigResult<()> {
        match self.format.as_str() {
            "text" | "json" | "compact" => Ok(()),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Groups
// =============================================================================

/// One named group of points for the static resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSection {
    /// The group code clients use to start monitoring.
    pub code: String,

    /// Points belonging to this group, in delivery order.
    #[serde(default)]
    pub points: Vec<PointSection>,
}

impl GroupSection {
    fn validate(&self) -> ConfigResult<()> {
        let mut handles = HashSet::new();
        for point in &self.points {
            if point.address.is_empty() {
                return Err(ConfigError::validation(
                    format!("groups.{}.points.address", self.code),
                    "must not be empty",
                ));
            }
            if !handles.insert(point.client_handle) {
                return Err(ConfigError::validation(
                    format!("groups.{}.points.client_handle", self.code),
                    format!("duplicate client handle {}", point.client_handle),
                ));
            }
        }
        Ok(())
    }

    /// Converts this section into resolver point definitions.
    pub fn point_definitions(&self) -> Vec<PointDefinition> {
        self.points
            .iter()
            .map(|point| PointDefinition {
                address: point.address.clone(),
                client_handle: point.client_handle,
                update_rate_ms: point.update_rate_ms,
                description: point.description.clone(),
            })
            .collect()
    }
}

/// One monitored point inside a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointSection {
    /// Protocol address of the point.
    pub address: String,

    /// Correlation handle, unique within the group.
    pub client_handle: u32,

    /// Per-point sampling interval override in milliseconds.
    #[serde(default)]
    pub update_rate_ms: Option<u64>,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SpateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.opcua.endpoint_url, DEFAULT_ENDPOINT);
        assert_eq!(config.api.port, DEFAULT_API_PORT);
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
gateway:
  id: plant-7
opcua:
  endpoint_url: opc.tcp://plc:4840
  use_security: true
  username: operator
  password: secret
groups:
  - code: G0001
    points:
      - address: Channel1.Device1.Tag1
        client_handle: 5
        update_rate_ms: 500
      - address: Channel1.Device1.Tag2
        client_handle: 6
"#;
        let config: SpateConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.gateway.id, "plant-7");
        assert!(config.opcua.use_security);
        assert_eq!(config.groups.len(), 1);

        let table = config.point_table();
        let points = &table["G0001"];
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].client_handle, 5);
        assert_eq!(points[0].update_rate_ms, Some(500));
        assert_eq!(points[1].update_rate_ms, None);
    }

    #[test]
    fn test_rejects_duplicate_group_codes() {
        let yaml = r#"
groups:
  - code: G0001
  - code: G0001
"#;
        let config: SpateConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_client_handles() {
        let yaml = r#"
groups:
  - code: G0001
    points:
      - address: A
        client_handle: 1
      - address: B
        client_handle: 1
"#;
        let config: SpateConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_endpoint_and_port() {
        let mut config = SpateConfig::default();
        config.opcua.endpoint_url = "http://nope".into();
        assert!(config.validate().is_err());

        let mut config = SpateConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let yaml = "opcua:\n  endpoint: opc.tcp://typo:4840\n";
        assert!(serde_yaml::from_str::<SpateConfig>(yaml).is_err());
    }
}
