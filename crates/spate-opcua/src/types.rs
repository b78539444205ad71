// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA session types: node identifiers, security mode, connect options,
//! and session settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use spate_core::{BridgeError, BridgeResult};

// =============================================================================
// Defaults
// =============================================================================

/// Publishing interval applied to every subscription group.
pub const DEFAULT_PUBLISHING_INTERVAL: Duration = Duration::from_millis(100);

/// Sampling interval applied to points without an `update_rate` override.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(1000);

/// Session timeout requested from the server.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// NodeId
// =============================================================================

/// Identifier of a node in the server address space.
///
/// Supports the two identifier kinds SPATE actually addresses: string and
/// numeric. Parses the canonical `ns=<n>;s=<text>` / `ns=<n>;i=<num>` forms
/// as well as bare text (namespace 0, string identifier).
///
/// # Examples
///
/// ```
/// use spate_opcua::types::NodeId;
///
/// let by_name = NodeId::string(2, "Channel1.Device1.Tag1");
/// let parsed: NodeId = "ns=2;s=Channel1.Device1.Tag1".parse().unwrap();
/// assert_eq!(by_name, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 is the OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentifier {
    /// String identifier.
    String(String),

    /// Numeric identifier.
    Numeric(u32),
}

impl NodeId {
    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Returns the identifier rendered as text, without the namespace.
    pub fn identifier_text(&self) -> String {
        match &self.identifier {
            NodeIdentifier::String(s) => s.clone(),
            NodeIdentifier::Numeric(n) => n.to_string(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            NodeIdentifier::String(s) => write!(f, "ns={};s={}", self.namespace_index, s),
            NodeIdentifier::Numeric(n) => write!(f, "ns={};i={}", self.namespace_index, n),
        }
    }
}

impl FromStr for NodeId {
    type Err = BridgeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BridgeError::read_failed(input, "empty node id"));
        }

        let (namespace_index, rest) = match input.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, rest) = rest.split_once(';').ok_or_else(|| {
                    BridgeError::read_failed(input, "expected ';' after namespace index")
                })?;
                let ns = ns.parse::<u16>().map_err(|_| {
                    BridgeError::read_failed(input, "invalid namespace index")
                })?;
                (ns, rest)
            }
            None => (0, input),
        };

        if let Some(text) = rest.strip_prefix("s=") {
            Ok(Self::string(namespace_index, text))
        } else if let Some(num) = rest.strip_prefix("i=") {
            let num = num
                .parse::<u32>()
                .map_err(|_| BridgeError::read_failed(input, "invalid numeric identifier"))?;
            Ok(Self::numeric(namespace_index, num))
        } else {
            // Bare text is treated as a string identifier.
            Ok(Self::string(namespace_index, rest))
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// Message security mode for the session.
///
/// SPATE exposes exactly the two modes its control surface selects between:
/// insecure, or signed and encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Messages are neither signed nor encrypted.
    #[default]
    None,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Maps the control surface's `useSecurity` flag to a mode.
    #[inline]
    pub fn from_flag(use_security: bool) -> Self {
        if use_security {
            Self::SignAndEncrypt
        } else {
            Self::None
        }
    }

    /// Returns `true` if this mode provides message encryption.
    #[inline]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::SignAndEncrypt)
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::SignAndEncrypt => write!(f, "SignAndEncrypt"),
        }
    }
}

// =============================================================================
// UserIdentity
// =============================================================================

/// Identity presented when activating the session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserIdentity {
    /// Anonymous identity (the default).
    #[default]
    Anonymous,

    /// Username/password identity.
    UserName {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
}

impl UserIdentity {
    /// Creates a username/password identity.
    pub fn user_name(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::UserName {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns `true` for the anonymous identity.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

// Manual Debug so passwords never land in logs.
impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::UserName { username, .. } => f
                .debug_struct("UserName")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

// =============================================================================
// ConnectOptions
// =============================================================================

/// Per-request overrides for a connect operation.
///
/// Every field is optional; absent fields fall back to the configured
/// session settings. This mirrors the control surface's connect request
/// body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Endpoint URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Security selection override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_security: Option<bool>,

    /// Username for a username/password identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for a username/password identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// =============================================================================
// SessionSettings
// =============================================================================

/// Settings for establishing and operating a session.
///
/// # Examples
///
/// ```
/// use spate_opcua::types::{SecurityMode, SessionSettings};
///
/// let settings = SessionSettings::builder()
///     .endpoint("opc.tcp://localhost:4840")
///     .security_mode(SecurityMode::SignAndEncrypt)
///     .user_name("operator", "secret")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Server endpoint URL (e.g. `opc.tcp://localhost:4840`).
    pub endpoint: String,

    /// Message security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Identity presented to the server.
    #[serde(default)]
    pub identity: UserIdentity,

    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Session timeout requested from the server.
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Publishing interval for subscription groups.
    #[serde(default = "default_publishing_interval", with = "humantime_serde")]
    pub publishing_interval: Duration,

    /// Sampling interval for points without an override.
    #[serde(default = "default_sampling_interval", with = "humantime_serde")]
    pub default_sampling_interval: Duration,
}

fn default_application_name() -> String {
    "SPATE Bridge".to_string()
}

fn default_session_timeout() -> Duration {
    DEFAULT_SESSION_TIMEOUT
}

fn default_publishing_interval() -> Duration {
    DEFAULT_PUBLISHING_INTERVAL
}

fn default_sampling_interval() -> Duration {
    DEFAULT_SAMPLING_INTERVAL
}

impl SessionSettings {
    /// Creates a builder.
    pub fn builder() -> SessionSettingsBuilder {
        SessionSettingsBuilder::default()
    }

    /// Creates settings with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            security_mode: SecurityMode::default(),
            identity: UserIdentity::Anonymous,
            application_name: default_application_name(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            publishing_interval: DEFAULT_PUBLISHING_INTERVAL,
            default_sampling_interval: DEFAULT_SAMPLING_INTERVAL,
        }
    }

    /// Applies per-request connect options on top of these settings.
    ///
    /// An empty or absent endpoint override keeps the configured endpoint.
    /// A username override switches to a username/password identity with an
    /// empty password unless one was supplied.
    pub fn with_overrides(&self, options: &ConnectOptions) -> Self {
        let mut merged = self.clone();

        if let Some(endpoint) = options
            .endpoint_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
        {
            merged.endpoint = endpoint.to_string();
            // Security only follows the request when the request names an
            // endpoint; otherwise both come from configuration.
            if let Some(use_security) = options.use_security {
                merged.security_mode = SecurityMode::from_flag(use_security);
            }
        }

        if let Some(username) = options.username.as_deref().filter(|u| !u.is_empty()) {
            merged.identity =
                UserIdentity::user_name(username, options.password.clone().unwrap_or_default());
        }

        merged
    }

    /// Validates these settings.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.endpoint.is_empty() {
            return Err(BridgeError::connection("", "endpoint is not configured"));
        }
        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(BridgeError::connection(
                &self.endpoint,
                "endpoint must start with opc.tcp://",
            ));
        }
        if self.publishing_interval.is_zero() {
            return Err(BridgeError::connection(
                &self.endpoint,
                "publishing interval must be positive",
            ));
        }
        Ok(())
    }
}

/// Builder for [`SessionSettings`].
#[derive(Debug, Default)]
pub struct SessionSettingsBuilder {
    endpoint: Option<String>,
    security_mode: SecurityMode,
    identity: UserIdentity,
    application_name: Option<String>,
    session_timeout: Option<Duration>,
    publishing_interval: Option<Duration>,
    default_sampling_interval: Option<Duration>,
}

impl SessionSettingsBuilder {
    /// Sets the endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = mode;
        self
    }

    /// Uses a username/password identity.
    pub fn user_name(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.identity = UserIdentity::user_name(username, password);
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Sets the publishing interval.
    pub fn publishing_interval(mut self, interval: Duration) -> Self {
        self.publishing_interval = Some(interval);
        self
    }

    /// Sets the default sampling interval.
    pub fn default_sampling_interval(mut self, interval: Duration) -> Self {
        self.default_sampling_interval = Some(interval);
        self
    }

    /// Builds and validates the settings.
    pub fn build(self) -> BridgeResult<SessionSettings> {
        let settings = SessionSettings {
            endpoint: self.endpoint.unwrap_or_default(),
            security_mode: self.security_mode,
            identity: self.identity,
            application_name: self.application_name.unwrap_or_else(default_application_name),
            session_timeout: self.session_timeout.unwrap_or(DEFAULT_SESSION_TIMEOUT),
            publishing_interval: self
                .publishing_interval
                .unwrap_or(DEFAULT_PUBLISHING_INTERVAL),
            default_sampling_interval: self
                .default_sampling_interval
                .unwrap_or(DEFAULT_SAMPLING_INTERVAL),
        };
        settings.validate()?;
        Ok(settings)
    }
}

// =============================================================================
// ServerState
// =============================================================================

/// State reported by the server through liveness notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// Server is running normally.
    #[default]
    Running,

    /// Server is suspended.
    Suspended,

    /// Server is shutting down.
    Shutdown,

    /// Server reports a communication fault.
    CommunicationFault,

    /// State could not be determined.
    Unknown,
}

impl ServerState {
    /// Returns `true` if the server is running normally.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::CommunicationFault => write!(f, "CommunicationFault"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// OPC UA status code attached to reads, writes, and notifications.
///
/// Only the good/bad distinction matters to the bridge; the raw value is
/// kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The good status.
    pub const GOOD: StatusCode = StatusCode(0);

    /// Generic bad status.
    pub const BAD: StatusCode = StatusCode(0x8000_0000);

    /// The addressed node does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);

    /// Returns `true` if the status is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the status is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
