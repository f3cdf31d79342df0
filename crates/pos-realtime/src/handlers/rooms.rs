//! Room membership requests (`room:join`, `room:leave`)

use serde_json::{json, Value};
use std::sync::Arc;

use super::{str_field, HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::manager::RoomManager;
use crate::protocol::{timestamp, Envelope, ServerEvent};

/// Handles explicit join and leave requests
pub struct RoomHandler;

impl RoomHandler {
    /// Join a room the connection's role permits
    pub fn join(manager: &RoomManager, connection: &Arc<Connection>, data: &Value) -> HandlerResult<()> {
        let room = Self::room_name(data)?;
        let added = manager.join(connection.id(), room)?;

        tracing::debug!(
            connection_id = %connection.id(),
            room = %room,
            added,
            "Room joined"
        );

        Self::reply(manager, connection, ServerEvent::RoomJoined, room);
        Ok(())
    }

    /// Leave a room the connection is in; pinned channels are refused
    pub fn leave(manager: &RoomManager, connection: &Arc<Connection>, data: &Value) -> HandlerResult<()> {
        let room = Self::room_name(data)?;
        if !manager.leave(connection.id(), room)? {
            return Err(HandlerError::NotMember(room.to_string()));
        }

        tracing::debug!(connection_id = %connection.id(), room = %room, "Room left");

        Self::reply(manager, connection, ServerEvent::RoomLeft, room);
        Ok(())
    }

    fn room_name(data: &Value) -> HandlerResult<&str> {
        str_field(data, "room")
            .filter(|room| !room.is_empty())
            .ok_or_else(|| HandlerError::InvalidPayload("room is required".to_string()))
    }

    fn reply(manager: &RoomManager, connection: &Connection, event: ServerEvent, room: &str) {
        manager.send_to(
            connection.id(),
            Envelope::new(event.as_str(), json!({ "room": room, "timestamp": timestamp() })),
        );
    }
}
