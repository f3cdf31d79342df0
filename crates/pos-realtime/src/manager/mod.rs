//! Room manager
//!
//! Channel membership on connect/disconnect, fan-out, and presence.

mod room_manager;

pub use room_manager::{PublishOutcome, RoomManager, ADMIN_ROOM};
