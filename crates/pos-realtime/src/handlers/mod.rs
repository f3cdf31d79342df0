//! Inbound event handlers
//!
//! Routes frames sent by admitted connections to the handler for their event.

mod error;
mod heartbeat;
mod orders;
mod presence;
mod rooms;
mod tables;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use orders::{OrderHandler, ORDERS_ROOM, READY_STATUS};
pub use presence::{PresenceHandler, MAX_STATUS_LEN};
pub use rooms::RoomHandler;
pub use tables::{TableHandler, TABLES_ROOM};

use crate::connection::Connection;
use crate::manager::RoomManager;
use crate::protocol::{ClientEvent, Envelope, ErrorPayload, ServerEvent};
use serde_json::Value;
use std::sync::Arc;

/// Dispatch incoming client frames to the appropriate handler
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle a parsed client frame
    pub fn dispatch(
        manager: &RoomManager,
        connection: &Arc<Connection>,
        message: Envelope,
    ) -> HandlerResult<()> {
        let Some(event) = ClientEvent::parse(&message.event) else {
            tracing::debug!(
                connection_id = %connection.id(),
                event = %message.event,
                "Unknown client event"
            );
            return Err(HandlerError::UnknownEvent(message.event));
        };

        tracing::trace!(
            connection_id = %connection.id(),
            event = %event,
            "Received event"
        );

        match event {
            ClientEvent::OrderCreated => OrderHandler::created(manager, message.data),
            ClientEvent::OrderStatusUpdated => OrderHandler::status_updated(manager, message.data),
            ClientEvent::TableStatusChanged => TableHandler::status_changed(manager, message.data),
            ClientEvent::PresenceUpdate => PresenceHandler::handle(manager, connection, &message.data),
            ClientEvent::RoomJoin => RoomHandler::join(manager, connection, &message.data),
            ClientEvent::RoomLeave => RoomHandler::leave(manager, connection, &message.data),
            ClientEvent::Ping => HeartbeatHandler::handle(manager, connection),
        }
    }

    /// Parse and handle a text frame, answering failures with an `error` event
    ///
    /// Returns whether the frame was handled successfully. The connection is
    /// never closed because of what it sent.
    pub fn handle_text(manager: &RoomManager, connection: &Arc<Connection>, text: &str) -> bool {
        let (event, result) = match Envelope::from_json(text) {
            Ok(message) => {
                let event = message.event.clone();
                (Some(event), Self::dispatch(manager, connection, message))
            }
            Err(e) => (None, Err(HandlerError::MalformedFrame(e.to_string()))),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                if e.is_client_input() {
                    tracing::debug!(connection_id = %connection.id(), error = %e, "Rejected frame");
                } else {
                    tracing::warn!(connection_id = %connection.id(), error = %e, "Request refused");
                }
                manager.send_to(connection.id(), error_frame(&e, event));
                false
            }
        }
    }
}

/// Build the `error` event sent back for a failed request
#[must_use]
pub fn error_frame(error: &HandlerError, event: Option<String>) -> Envelope {
    Envelope::from_payload(
        ServerEvent::Error.as_str(),
        &ErrorPayload {
            message: error.to_string(),
            event,
        },
    )
}

/// Read a string field from an object payload
fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Read an identifier that may arrive as a string or a number
fn id_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
