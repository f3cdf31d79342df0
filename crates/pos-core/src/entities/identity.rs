//! Identity entity - who is behind a connection

use serde::{Deserialize, Serialize};

use super::Role;

/// Prefix of the implicit per-role channel
pub const ROLE_CHANNEL_PREFIX: &str = "role:";

/// Prefix of the implicit per-user channel
pub const USER_CHANNEL_PREFIX: &str = "user:";

/// Authenticated user as decoded from a bearer token
///
/// Re-derived from the credential on every new connection and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Create a new identity
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
        }
    }

    /// Name of the implicit channel shared by everyone with this role
    #[must_use]
    pub fn role_channel(&self) -> String {
        Self::channel_for_role(self.role)
    }

    /// Name of the implicit channel reaching every device of this identity
    #[must_use]
    pub fn user_channel(&self) -> String {
        Self::channel_for_user(&self.id)
    }

    /// `role:<role>`
    #[must_use]
    pub fn channel_for_role(role: Role) -> String {
        format!("{ROLE_CHANNEL_PREFIX}{role}")
    }

    /// `user:<id>`
    #[must_use]
    pub fn channel_for_user(id: &str) -> String {
        format!("{USER_CHANNEL_PREFIX}{id}")
    }
}
