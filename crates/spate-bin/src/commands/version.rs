// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

/// Prints detailed version information.
pub fn version() {
    println!("spate {}", spate_core::VERSION);
    println!("Streaming Point Access & Telemetry Engine");
    println!("  spate-core:   {}", spate_core::VERSION);
    println!("  spate-opcua:  {}", spate_core::VERSION);
    println!("  spate-api:    {}", spate_core::VERSION);
}
