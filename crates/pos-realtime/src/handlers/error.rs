//! Handler error types

use pos_core::DomainError;
use thiserror::Error;

/// Handler error type
///
/// Every variant is reported back to the sender as an `error` event; none of
/// them closes the connection.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame could not be parsed
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Event name is not one clients may send
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Payload is missing a required field
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Leave requested for a channel the connection is not in
    #[error("Not a member of room: {0}")]
    NotMember(String),

    /// Room lookup or access check failed
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl HandlerError {
    /// Whether the fault lies with what the client sent rather than its permissions
    pub fn is_client_input(&self) -> bool {
        match self {
            Self::MalformedFrame(_)
            | Self::UnknownEvent(_)
            | Self::InvalidPayload(_)
            | Self::NotMember(_) => true,
            Self::Domain(e) => !e.is_authorization(),
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
