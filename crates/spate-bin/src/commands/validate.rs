// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Validates the configuration file and prints a summary.
pub async fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = spate_config::load_config(&cli.config)?;

    let point_count: usize = config.groups.iter().map(|group| group.points.len()).sum();
    println!("configuration OK: {}", cli.config.display());
    println!("  gateway:  {}", config.gateway.id);
    println!("  endpoint: {}", config.opcua.endpoint_url);
    println!("  api:      {}:{}", config.api.host, config.api.port);
    println!("  groups:   {} ({} points)", config.groups.len(), point_count);

    if args.show_config {
        let rendered = serde_yaml::to_string(&config)
            .map_err(|err| BinError::config(format!("cannot render configuration: {}", err)))?;
        println!("\n{}", rendered);
    }

    Ok(())
}
