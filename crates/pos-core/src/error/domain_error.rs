//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid room '{name}': {reason}")]
    InvalidRoom { name: String, reason: String },

    #[error("Duplicate room: {0}")]
    DuplicateRoom(String),

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Role {role} may not join room {room}")]
    RoomAccessDenied { role: String, room: String },

    #[error("Channel {0} cannot be left while connected")]
    PinnedChannel(String),
}

impl DomainError {
    /// Build an `InvalidRoom` error
    pub fn invalid_room(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoom {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::RoomAccessDenied { .. } | Self::PinnedChannel(_))
    }
}
