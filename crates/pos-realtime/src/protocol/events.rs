//! Event names and payloads
//!
//! Server-originated events are fixed by this crate; domain events such as
//! `new-order` are relayed verbatim apart from the timestamp/room tag.

use pos_core::{Identity, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::messages::timestamp;

/// Events the server emits on its own behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEvent {
    /// Private greeting listing the rooms a connection was placed in
    Welcome,
    /// Presence change on the admin channel
    UserConnected,
    /// Presence change on the admin channel
    UserDisconnected,
    /// Global broadcast that bypasses room membership
    SystemMessage,
    /// Order relayed to the kitchen and floor
    NewOrder,
    /// Order status changed
    OrderUpdated,
    /// Order ready for pickup
    OrderReady,
    /// Table status changed
    TableUpdated,
    /// Reply to a successful `room:join`
    RoomJoined,
    /// Reply to a successful `room:leave`
    RoomLeft,
    /// Reply to `presence:update`
    PresenceUpdated,
    /// Reply to `ping`
    Pong,
    /// A client request could not be honoured
    Error,
}

impl ServerEvent {
    /// Get the wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "connection:welcome",
            Self::UserConnected => "user:connected",
            Self::UserDisconnected => "user:disconnected",
            Self::SystemMessage => "system:message",
            Self::NewOrder => "new-order",
            Self::OrderUpdated => "order-updated",
            Self::OrderReady => "order-ready",
            Self::TableUpdated => "table-updated",
            Self::RoomJoined => "room:joined",
            Self::RoomLeft => "room:left",
            Self::PresenceUpdated => "presence:updated",
            Self::Pong => "pong",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a connected client may send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    OrderCreated,
    OrderStatusUpdated,
    TableStatusChanged,
    PresenceUpdate,
    RoomJoin,
    RoomLeave,
    Ping,
}

impl ClientEvent {
    /// Parse a client event name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "order:created" => Some(Self::OrderCreated),
            "order:status-updated" => Some(Self::OrderStatusUpdated),
            "table:status-changed" => Some(Self::TableStatusChanged),
            "presence:update" => Some(Self::PresenceUpdate),
            "room:join" => Some(Self::RoomJoin),
            "room:leave" => Some(Self::RoomLeave),
            "ping" => Some(Self::Ping),
            _ => None,
        }
    }

    /// Get the wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "order:created",
            Self::OrderStatusUpdated => "order:status-updated",
            Self::TableStatusChanged => "table:status-changed",
            Self::PresenceUpdate => "presence:update",
            Self::RoomJoin => "room:join",
            Self::RoomLeave => "room:leave",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `connection:welcome`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomePayload {
    pub message: String,
    pub rooms: Vec<String>,
    pub timestamp: String,
}

impl WelcomePayload {
    #[must_use]
    pub fn new(identity: &Identity, rooms: Vec<String>) -> Self {
        Self {
            message: format!("Connected as {} ({})", identity.email, identity.role),
            rooms,
            timestamp: timestamp(),
        }
    }
}

/// `user:connected` / `user:disconnected`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChangePayload {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub timestamp: String,
}

impl From<&Identity> for PresenceChangePayload {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            timestamp: timestamp(),
        }
    }
}

/// Severity of a `system:message`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// `system:message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessagePayload {
    pub message: String,
    pub level: MessageLevel,
    pub timestamp: String,
}

impl SystemMessagePayload {
    #[must_use]
    pub fn new(message: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: timestamp(),
        }
    }
}

/// One row of the online listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub socket_id: String,
    pub status: String,
}

/// `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}
