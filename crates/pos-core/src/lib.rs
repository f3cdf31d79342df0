//! # pos-core
//!
//! Domain layer for the restaurant real-time layer: staff and customer roles,
//! authenticated identities, and the static room definitions that decide who
//! hears what. This crate has no infrastructure dependencies.

pub mod entities;
pub mod error;

// Re-export commonly used types at crate root
pub use entities::{Identity, Role, RoomDefinition, ROLE_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
pub use error::DomainError;
