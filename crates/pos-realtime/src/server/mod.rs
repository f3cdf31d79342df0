//! Gateway server setup
//!
//! Provides the WebSocket endpoint, the HTTP routes and server lifecycle.

mod handler;
mod handshake;
mod routes;
mod state;

pub use handler::gateway_handler;
pub use handshake::{Handshake, HandshakeQuery};
pub use routes::{
    AnnounceRequest, AnnounceResponse, OnlineResponse, PublishRequest, PublishResponse,
    StatsResponse,
};
pub use state::GatewayState;

use crate::manager::RoomManager;
use crate::middleware::apply_middleware;
use crate::rooms::load_registry;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use pos_common::{AppConfig, AppError, JwtService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    pub timestamp: String,
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
        .route("/api/realtime/stats", get(routes::stats))
        .route("/api/realtime/online", get(routes::online))
        .route("/api/realtime/publish", post(routes::publish))
        .route("/api/realtime/announce", post(routes::announce))
}

/// Health check endpoint
async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.manager().connection_count(),
        timestamp: crate::protocol::timestamp(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let is_production = state.config().app.env.is_production();
    let cors = state.config().cors.clone();

    apply_middleware(create_router(), &cors, is_production).with_state(state)
}

/// Load the room table and create `GatewayState`
///
/// A missing JWT secret does not stop startup; every handshake then fails
/// with a configuration error.
pub fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let registry = load_registry(config.realtime.rooms_config.as_deref())?;
    tracing::info!(rooms = registry.len(), "Room registry ready");

    let jwt = JwtService::from_optional_secret(config.jwt.secret.as_deref(), config.jwt.token_expiry);
    if !jwt.is_configured() {
        tracing::warn!("JWT_SECRET is not set; all connections will be refused");
    }

    let manager = RoomManager::new_shared(Arc::new(registry));

    Ok(GatewayState::new(manager, jwt, config))
}

/// Bind the configured gateway address
pub async fn bind(config: &AppConfig) -> Result<TcpListener, AppError> {
    let addr = config.gateway.address();

    TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))
}

/// Serve until a shutdown signal arrives, then close every connection
pub async fn run_server(listener: TcpListener, app: Router, manager: Arc<RoomManager>) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on ws://{}/ws", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let listener = bind(&config).await?;

    // Create gateway state
    let state = create_gateway_state(config)?;
    let manager = state.manager_handle();

    // Build application
    let app = create_app(state);

    // Run server
    run_server(listener, app, manager).await
}

/// Wait for Ctrl+C or SIGTERM, then shut the room manager down
async fn shutdown_signal(manager: Arc<RoomManager>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    manager.shutdown();
}
