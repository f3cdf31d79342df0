//! Application-level ping (`ping`)

use serde_json::json;
use std::sync::Arc;

use super::HandlerResult;
use crate::connection::Connection;
use crate::manager::RoomManager;
use crate::protocol::{timestamp, Envelope, ServerEvent};

/// Answers client pings
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    pub fn handle(manager: &RoomManager, connection: &Arc<Connection>) -> HandlerResult<()> {
        tracing::trace!(connection_id = %connection.id(), "Ping received");

        manager.send_to(
            connection.id(),
            Envelope::new(ServerEvent::Pong.as_str(), json!({ "timestamp": timestamp() })),
        );
        Ok(())
    }
}
