//! Room registry
//!
//! Static mapping of named rooms to the roles allowed to join them.

mod loader;
mod registry;

pub use loader::load_registry;
pub use registry::RoomRegistry;
