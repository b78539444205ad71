// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # spate-config
//!
//! Configuration schema and loader for SPATE.
//!
//! Configuration lives in one YAML file covering the automation server
//! connection defaults, the HTTP API, logging, and the static point-group
//! table consumed by the built-in point resolver. Values can be overridden
//! with `SPATE_*` environment variables.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigLoader};
pub use schema::{
    ApiSection, GatewaySection, GroupSection, LoggingSection, OpcUaSection, PointSection,
    SpateConfig,
};
