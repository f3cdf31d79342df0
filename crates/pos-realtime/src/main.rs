//! Real-time gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p pos-realtime
//! ```
//!
//! Configuration is loaded from environment variables.

use pos_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration first so the log format can follow APP_ENV
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the server
    if let Err(e) = run(config).await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        env = ?config.app.env,
        host = %config.gateway.host,
        port = config.gateway.port,
        rooms_config = ?config.realtime.rooms_config,
        "Starting real-time gateway"
    );

    pos_realtime::run(config).await?;

    Ok(())
}
