//! Domain entities - core business objects

mod identity;
mod role;
mod room;

pub use identity::{Identity, ROLE_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
pub use role::Role;
pub use room::RoomDefinition;
