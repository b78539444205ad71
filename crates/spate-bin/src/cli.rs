// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Supported subcommands:
//!
//! - `run`: start the bridge (default)
//! - `validate`: validate the configuration file
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// SPATE - Streaming Point Access & Telemetry Engine
///
/// Bridges an OPC UA automation server to streaming consumers: one live
/// session, named groups of monitored points, and per-group event streams.
#[derive(Parser, Debug)]
#[command(
    name = "spate",
    author = "Sylvex <contact@sylvex.io>",
    version = spate_core::VERSION,
    about = "Streaming Point Access & Telemetry Engine",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "spate.yaml",
        env = "SPATE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "SPATE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "SPATE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the bridge
    ///
    /// This is the default command when no subcommand is specified. It
    /// starts the bridge service and the HTTP control surface.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration without starting anything.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Periodically vary the simulated point values so streams show data
    #[arg(long)]
    pub demo: bool,

    /// Connect to the server on startup instead of waiting for a request
    #[arg(long)]
    pub connect_on_start: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Show the parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["spate"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("spate.yaml"));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from(["spate", "run", "--demo", "--connect-on-start"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert!(args.demo);
                assert!(args.connect_on_start);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["spate", "-c", "/etc/spate.yaml", "validate", "-s"]);
        assert_eq!(cli.config, PathBuf::from("/etc/spate.yaml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Validate(ValidateArgs { show_config: true }))
        ));
    }
}
