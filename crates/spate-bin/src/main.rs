// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SPATE - Streaming Point Access & Telemetry Engine
//!
//! Main binary entry point.

use clap::Parser;
use tracing::error;

use spate_bin::cli::{Cli, Commands, RunArgs};
use spate_bin::{commands, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let result = match cli.command.clone() {
        None => commands::run(&cli, RunArgs::default()).await,
        Some(Commands::Run(args)) => commands::run(&cli, args).await,
        Some(Commands::Validate(args)) => commands::validate(&cli, args).await,
        Some(Commands::Version) => {
            commands::version();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
