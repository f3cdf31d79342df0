//! # pos-realtime
//!
//! Role-based WebSocket room broadcast for the restaurant POS: admits
//! authenticated connections into the rooms their role allows and fans
//! order, table and system events out to them.

pub mod connection;
pub mod extractors;
pub mod handlers;
pub mod manager;
pub mod middleware;
pub mod protocol;
pub mod response;
pub mod rooms;
pub mod server;

pub use manager::{PublishOutcome, RoomManager};
pub use rooms::RoomRegistry;
pub use server::{create_app, create_gateway_state, run, GatewayState};
