//! Room entity - a named fan-out group gated by role

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Role, ROLE_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
use crate::error::DomainError;

/// Statically configured room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub name: String,
    pub allowed_roles: BTreeSet<Role>,
    #[serde(default)]
    pub description: String,
}

impl RoomDefinition {
    /// Create a new room definition
    pub fn new(
        name: impl Into<String>,
        allowed_roles: impl IntoIterator<Item = Role>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            allowed_roles: allowed_roles.into_iter().collect(),
            description: description.into(),
        }
    }

    /// Whether a connection with `role` may be a member
    #[inline]
    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }

    /// Check the definition on its own; cross-room checks live in the registry
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRoom` when the name is blank, collides with
    /// an implicit channel prefix, or no role may join
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_room(&self.name, "name must not be empty"));
        }
        if name != self.name {
            return Err(DomainError::invalid_room(
                &self.name,
                "name must not have surrounding whitespace",
            ));
        }
        if name.starts_with(ROLE_CHANNEL_PREFIX) || name.starts_with(USER_CHANNEL_PREFIX) {
            return Err(DomainError::invalid_room(
                &self.name,
                "name uses a reserved channel prefix",
            ));
        }
        if self.allowed_roles.is_empty() {
            return Err(DomainError::invalid_room(
                &self.name,
                "at least one role must be allowed",
            ));
        }
        Ok(())
    }
}
