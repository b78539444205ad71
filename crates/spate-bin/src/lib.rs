// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # spate-bin
//!
//! CLI binary for the SPATE bridge.
//!
//! Provides the `spate` executable:
//!
//! - CLI argument parsing with clap
//! - Runtime orchestration (config, simulator, bridge, API server)
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the bridge (default command)
//! spate
//!
//! # Start with a custom config and demo value changes
//! spate -c /etc/spate/spate.yaml run --demo
//!
//! # Validate configuration
//! spate validate
//!
//! # Show version
//! spate version
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{BridgeRuntime, RuntimeBuilder};
pub use shutdown::ShutdownCoordinator;
