//! Application error types
//!
//! Errors raised while starting or running the gateway, plus the JSON body
//! every HTTP failure renders as.

use serde::Serialize;

use crate::config::ConfigError;

/// Startup and serving errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Listener errors
    #[error("Server error: {0}")]
    Server(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
