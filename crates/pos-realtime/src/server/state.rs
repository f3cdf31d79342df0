//! Gateway state
//!
//! Application state for the gateway server.

use crate::manager::RoomManager;
use pos_common::{AppConfig, JwtService};
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// The single room manager for this process
    manager: Arc<RoomManager>,
    /// Bearer token validator shared by the handshake and the HTTP routes
    jwt: Arc<JwtService>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(manager: Arc<RoomManager>, jwt: JwtService, config: AppConfig) -> Self {
        Self {
            manager,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Get the room manager
    pub fn manager(&self) -> &RoomManager {
        &self.manager
    }

    /// Get a shared handle to the room manager
    pub fn manager_handle(&self) -> Arc<RoomManager> {
        self.manager.clone()
    }

    /// Get the token validator
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("manager", &self.manager)
            .field("jwt_configured", &self.jwt.is_configured())
            .field("config", &"AppConfig")
            .finish()
    }
}
