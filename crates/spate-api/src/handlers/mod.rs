// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request handlers for the control surface.

mod health;
mod monitor;
mod points;
mod session;

pub use health::health;
pub use monitor::{
    start_monitoring, stop_monitoring, stream_tag_changes, StartMonitoringRequest,
    StopMonitoringRequest,
};
pub use points::{
    read_multiple_values, read_value, write_value, ReadMultipleRequest, ReadRequest, WriteRequest,
};
pub use session::{connect, disconnect, status};
