//! Role entity - the fixed set of dashboard roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Role carried by every authenticated identity
///
/// The set is closed: a token naming any other role is rejected at the
/// handshake rather than mapped to a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Waiter,
    Kitchen,
    Customer,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 5] = [
        Role::Owner,
        Role::Admin,
        Role::Waiter,
        Role::Kitchen,
        Role::Customer,
    ];

    /// Get the wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Waiter => "waiter",
            Self::Kitchen => "kitchen",
            Self::Customer => "customer",
        }
    }

    /// Parse a role from its wire name
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRole` for anything outside the enumeration
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "waiter" => Ok(Self::Waiter),
            "kitchen" => Ok(Self::Kitchen),
            "customer" => Ok(Self::Customer),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }

    /// Owners and admins may inspect and drive the real-time layer over HTTP
    #[inline]
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
