//! # pos-common
//!
//! Shared utilities including configuration, error handling, bearer token
//! validation, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{AuthError, Claims, JwtService};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, Environment, JwtConfig, RealtimeConfig,
    ServerConfig,
};
pub use error::{AppError, ErrorResponse};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
