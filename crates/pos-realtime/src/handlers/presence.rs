//! Presence update handler (`presence:update`)

use serde_json::{json, Value};
use std::sync::Arc;

use super::{str_field, HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::manager::RoomManager;
use crate::protocol::{timestamp, Envelope, ServerEvent};

/// Longest status string accepted from a client
pub const MAX_STATUS_LEN: usize = 64;

/// Handles presence status updates
pub struct PresenceHandler;

impl PresenceHandler {
    /// Record the sender's status and confirm it back
    ///
    /// Status is free text; it is stored per identity, so every device of
    /// the same user reports the latest value.
    pub fn handle(manager: &RoomManager, connection: &Arc<Connection>, data: &Value) -> HandlerResult<()> {
        let status = str_field(data, "status")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HandlerError::InvalidPayload("status is required".to_string()))?;

        if status.chars().count() > MAX_STATUS_LEN {
            return Err(HandlerError::InvalidPayload(format!(
                "status must be at most {MAX_STATUS_LEN} characters"
            )));
        }

        let user_id = &connection.identity().id;
        manager.set_presence(user_id, status);

        manager.send_to(
            connection.id(),
            Envelope::new(
                ServerEvent::PresenceUpdated.as_str(),
                json!({ "userId": user_id, "status": status, "timestamp": timestamp() }),
            ),
        );

        Ok(())
    }
}
