// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the SPATE binary.

use thiserror::Error;

/// Result type alias for binary operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the SPATE binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration problem.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Component initialization failed.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// API server failure.
    #[error("API error: {0}")]
    Api(#[from] spate_api::ApiError),

    /// Configuration loading failure.
    #[error("config error: {0}")]
    Config(#[from] spate_config::ConfigError),
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an initialization error.
    pub fn init(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }
}
