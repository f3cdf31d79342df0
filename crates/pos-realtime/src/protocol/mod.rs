//! Wire protocol
//!
//! Defines the JSON frame format, event names and event payloads.

mod events;
mod messages;

pub use events::{
    ClientEvent, ErrorPayload, MessageLevel, OnlineUser, PresenceChangePayload, ServerEvent,
    SystemMessagePayload, WelcomePayload,
};
pub use messages::{tag_payload, timestamp, Envelope};
