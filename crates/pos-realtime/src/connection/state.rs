//! Connection lifecycle

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a single real-time connection
///
/// ```text
/// Connecting -> Authenticating -> Admitted -> Disconnected
///                      |
///                      +-> Rejected
/// ```
///
/// Any non-terminal state may also drop straight to `Disconnected` when the
/// transport goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport accepted, nothing inspected yet
    Connecting,
    /// Credential is being validated
    Authenticating,
    /// Handed to the room manager
    Admitted,
    /// Credential refused; terminal
    Rejected,
    /// Transport closed; terminal
    Disconnected,
}

/// Attempted transition the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid connection state transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl ConnectionState {
    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Disconnected)
    }

    /// Whether `self -> next` is a legal step
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Authenticating)
                | (Self::Authenticating, Self::Admitted | Self::Rejected)
                | (Self::Connecting | Self::Authenticating | Self::Admitted, Self::Disconnected)
        )
    }

    /// Move to `next`, or report why that is not allowed
    ///
    /// # Errors
    /// Returns `InvalidTransition` if the step is illegal
    pub fn transition(&mut self, next: Self) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            *self = next;
            Ok(())
        } else {
            Err(InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}
