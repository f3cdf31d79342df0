//! Order events (`order:created`, `order:status-updated`)

use pos_core::Role;
use serde_json::Value;

use super::{id_field, str_field, HandlerResult};
use crate::manager::RoomManager;
use crate::protocol::ServerEvent;

/// Room every order event is relayed to
pub const ORDERS_ROOM: &str = "orders";

/// Status that additionally pages the floor staff
pub const READY_STATUS: &str = "ready";

/// Relays order lifecycle events
pub struct OrderHandler;

impl OrderHandler {
    /// `order:created` → `new-order` on the orders room
    pub fn created(manager: &RoomManager, data: Value) -> HandlerResult<()> {
        manager.broadcast(ORDERS_ROOM, ServerEvent::NewOrder.as_str(), data);
        Ok(())
    }

    /// `order:status-updated` → `order-updated` on the orders room
    ///
    /// A `ready` status also sends `order-ready` to every waiter, and a
    /// `customerId` field sends the update to that customer's devices.
    pub fn status_updated(manager: &RoomManager, data: Value) -> HandlerResult<()> {
        let ready = str_field(&data, "status") == Some(READY_STATUS);
        let customer = id_field(&data, "customerId");

        if ready {
            manager.broadcast_to_roles(&[Role::Waiter], ServerEvent::OrderReady.as_str(), data.clone());
        }
        if let Some(customer_id) = customer {
            manager.unicast(&customer_id, ServerEvent::OrderUpdated.as_str(), data.clone());
        }

        manager.broadcast(ORDERS_ROOM, ServerEvent::OrderUpdated.as_str(), data);
        Ok(())
    }
}
