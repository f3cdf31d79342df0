//! Table events (`table:status-changed`)

use serde_json::Value;

use super::HandlerResult;
use crate::manager::RoomManager;
use crate::protocol::ServerEvent;

/// Room table changes are relayed to
pub const TABLES_ROOM: &str = "tables";

/// Relays table status changes
pub struct TableHandler;

impl TableHandler {
    pub fn status_changed(manager: &RoomManager, data: Value) -> HandlerResult<()> {
        manager.broadcast(TABLES_ROOM, ServerEvent::TableUpdated.as_str(), data);
        Ok(())
    }
}
