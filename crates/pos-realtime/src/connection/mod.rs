//! Connection tracking
//!
//! Admitted connections, their lifecycle, and the indexes used for fan-out.

mod connection;
mod state;
mod tracker;

pub use connection::Connection;
pub use state::{ConnectionState, InvalidTransition};
pub use tracker::{ConnectionTracker, DEFAULT_PRESENCE};
