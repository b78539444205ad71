// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP control surface for SPATE.
//!
//! Exposes the bridge over a small REST API plus a server-sent-events
//! stream per monitored group. Every endpoint answers with the same
//! envelope: `{"success": bool, "data": T|null, "errorMessage":
//! string|null}`; bridge failures are folded into the envelope and never
//! escape as transport-level faults.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use response::{ApiResponse, HealthResponse};
pub use server::ApiServer;
pub use state::AppState;
