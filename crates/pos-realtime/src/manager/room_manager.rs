//! Room manager
//!
//! Places admitted connections into the channels their role allows and fans
//! events out to channels, roles, or individual identities. All operations
//! are synchronous and in-memory; delivery is fire-and-forget.

use chrono::Utc;
use parking_lot::Mutex;
use pos_core::{DomainError, Identity, Role};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::connection::{Connection, ConnectionTracker};
use crate::protocol::{
    tag_payload, Envelope, MessageLevel, OnlineUser, PresenceChangePayload, ServerEvent,
    SystemMessagePayload, WelcomePayload,
};
use crate::rooms::RoomRegistry;

/// Room that receives presence changes
pub const ADMIN_ROOM: &str = "admin";

/// Result of publishing to a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Whether the channel name resolved to a configured room or implicit channel
    pub found: bool,
    /// Number of connections whose queue accepted the event
    pub recipients: usize,
}

impl PublishOutcome {
    const UNKNOWN: Self = Self {
        found: false,
        recipients: 0,
    };

    fn merge(self, other: Self) -> Self {
        Self {
            found: self.found || other.found,
            recipients: self.recipients + other.recipients,
        }
    }
}

/// Owner of all real-time membership and presence state
///
/// One instance per process, created at startup and injected into the
/// gateway. `shutdown` closes every connection and clears all state.
pub struct RoomManager {
    registry: Arc<RoomRegistry>,
    tracker: ConnectionTracker,
    /// Serializes membership changes so channel indexes and connections agree
    membership: Mutex<()>,
    shut_down: AtomicBool,
}

impl RoomManager {
    /// Create a manager over a room registry
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            tracker: ConnectionTracker::new(),
            membership: Mutex::new(()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Create a manager wrapped in Arc
    #[must_use]
    pub fn new_shared(registry: Arc<RoomRegistry>) -> Arc<Self> {
        Arc::new(Self::new(registry))
    }

    /// The room registry this manager enforces
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Admit an authenticated connection
    ///
    /// Joins `role:<role>`, `user:<id>` and every room the role allows, sends
    /// the connection a private welcome listing those channels, and tells the
    /// admin room who arrived. Returns the joined channels.
    pub fn admit(&self, connection: Arc<Connection>) -> Vec<String> {
        if self.is_shut_down() {
            tracing::warn!(connection_id = %connection.id(), "Admission after shutdown refused");
            connection.close();
            return Vec::new();
        }

        let identity = connection.identity().clone();
        let channels = self.registry.channels_for(&identity);

        {
            let _guard = self.membership.lock();
            self.tracker.insert(connection.clone());
            for channel in &channels {
                self.tracker.join(connection.id(), channel);
            }
        }

        tracing::info!(
            connection_id = %connection.id(),
            user_id = %identity.id,
            role = %identity.role,
            channels = ?channels,
            "Connection admitted"
        );

        let welcome = WelcomePayload::new(&identity, channels.clone());
        Self::deliver(
            &connection,
            Envelope::from_payload(ServerEvent::Welcome.as_str(), &welcome),
        );

        self.notify_admins(ServerEvent::UserConnected, &identity);

        channels
    }

    /// Remove a connection and tell the admin room it left
    ///
    /// Only the admin room hears about departures. Returns false if the
    /// connection was not tracked.
    pub fn remove(&self, connection_id: &str) -> bool {
        let removed = {
            let _guard = self.membership.lock();
            self.tracker.remove(connection_id)
        };

        let Some(connection) = removed else {
            return false;
        };

        if let Err(e) = connection.mark_disconnected() {
            tracing::debug!(connection_id = %connection_id, error = %e, "Connection already closed");
        }

        tracing::info!(
            connection_id = %connection_id,
            user_id = %connection.identity().id,
            connected_secs = (Utc::now() - connection.connected_at()).num_seconds(),
            "Connection removed"
        );

        self.notify_admins(ServerEvent::UserDisconnected, connection.identity());
        true
    }

    fn notify_admins(&self, event: ServerEvent, identity: &Identity) {
        let payload = serde_json::to_value(PresenceChangePayload::from(identity)).unwrap_or_default();
        self.emit(ADMIN_ROOM, Envelope::new(event.as_str(), payload));
    }

    /// Publish an event to every connection joined to `channel`
    ///
    /// The payload is tagged with the server time and the channel name.
    /// Unknown channels are logged and skipped, never an error.
    pub fn broadcast(&self, channel: &str, event: &str, payload: Value) -> PublishOutcome {
        if !self.registry.is_known_channel(channel) {
            tracing::warn!(channel = %channel, event = %event, "Broadcast to unknown channel skipped");
            return PublishOutcome::UNKNOWN;
        }

        let recipients = self.emit(channel, Envelope::new(event, tag_payload(payload, channel)));

        tracing::debug!(channel = %channel, event = %event, recipients, "Event broadcast");

        PublishOutcome {
            found: true,
            recipients,
        }
    }

    /// Broadcast to each role's implicit channel
    pub fn broadcast_to_roles(&self, roles: &[Role], event: &str, payload: Value) -> PublishOutcome {
        roles.iter().fold(PublishOutcome::default(), |total, role| {
            total.merge(self.broadcast(
                &Identity::channel_for_role(*role),
                event,
                payload.clone(),
            ))
        })
    }

    /// Deliver to every active connection of one identity
    pub fn unicast(&self, identity_id: &str, event: &str, payload: Value) -> PublishOutcome {
        self.broadcast(&Identity::channel_for_user(identity_id), event, payload)
    }

    /// Send a `system:message` to every connection regardless of membership
    pub fn announce(&self, message: &str, level: MessageLevel) -> usize {
        let frame = Envelope::from_payload(
            ServerEvent::SystemMessage.as_str(),
            &SystemMessagePayload::new(message, level),
        );

        let recipients = self
            .tracker
            .all()
            .iter()
            .filter(|conn| Self::deliver(conn, frame.clone()))
            .count();

        tracing::info!(recipients, level = ?level, "System message announced");
        recipients
    }

    /// Send a frame to one connection; false if unknown or its queue refused it
    pub fn send_to(&self, connection_id: &str, message: Envelope) -> bool {
        self.tracker
            .get(connection_id)
            .is_some_and(|conn| Self::deliver(&conn, message))
    }

    fn emit(&self, channel: &str, message: Envelope) -> usize {
        self.tracker
            .members(channel)
            .iter()
            .filter(|conn| Self::deliver(conn, message.clone()))
            .count()
    }

    fn deliver(connection: &Connection, message: Envelope) -> bool {
        match connection.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Dropped outbound event"
                );
                false
            }
        }
    }

    /// Whether `role` may be a member of `channel`
    pub fn has_access(&self, role: Role, channel: &str) -> bool {
        self.registry.has_access(role, channel)
    }

    /// Handle a connection's request to join a channel
    ///
    /// Membership is always re-derived from the role: the connection's own
    /// implicit channels and rooms its role permits are allowed, nothing else.
    /// Returns whether the connection was newly added.
    ///
    /// # Errors
    /// Returns `RoomNotFound` for unknown channels and `RoomAccessDenied` when
    /// the role is not allowed
    pub fn join(&self, connection_id: &str, channel: &str) -> Result<bool, DomainError> {
        let connection = self
            .tracker
            .get(connection_id)
            .ok_or_else(|| DomainError::RoomNotFound(channel.to_string()))?;
        let identity = connection.identity();

        let own_channel = channel == identity.role_channel() || channel == identity.user_channel();
        if !own_channel {
            if !self.registry.is_known_channel(channel) {
                return Err(DomainError::RoomNotFound(channel.to_string()));
            }
            if !self.has_access(identity.role, channel) {
                tracing::warn!(
                    connection_id = %connection_id,
                    role = %identity.role,
                    channel = %channel,
                    "Join refused"
                );
                return Err(DomainError::RoomAccessDenied {
                    role: identity.role.to_string(),
                    room: channel.to_string(),
                });
            }
        }

        let _guard = self.membership.lock();
        Ok(self.tracker.join(connection_id, channel))
    }

    /// Leave a channel; returns false if the connection was not a member
    ///
    /// A connection's own `role:` and `user:` channels, and the admin room
    /// for roles admitted to it, stay joined until it disconnects.
    ///
    /// # Errors
    /// Returns `PinnedChannel` for those channels.
    pub fn leave(&self, connection_id: &str, channel: &str) -> Result<bool, DomainError> {
        let Some(connection) = self.tracker.get(connection_id) else {
            return Ok(false);
        };
        let identity = connection.identity();

        let pinned = channel == identity.role_channel()
            || channel == identity.user_channel()
            || (channel == ADMIN_ROOM && self.registry.has_access(identity.role, ADMIN_ROOM));
        if pinned {
            tracing::warn!(
                connection_id = %connection_id,
                channel = %channel,
                "Leave refused for pinned channel"
            );
            return Err(DomainError::PinnedChannel(channel.to_string()));
        }

        let _guard = self.membership.lock();
        Ok(self.tracker.leave(connection_id, channel))
    }

    /// Member counts for every configured room (including empty ones) and
    /// every occupied implicit channel, computed on demand
    pub fn stats(&self) -> BTreeMap<String, usize> {
        let mut stats = self.tracker.channel_counts();
        for room in self.registry.iter() {
            stats.entry(room.name.clone()).or_insert(0);
        }
        stats
    }

    /// Record an identity's presence status
    pub fn set_presence(&self, identity_id: &str, status: &str) {
        self.tracker.set_presence(identity_id, status);
        tracing::debug!(user_id = %identity_id, status = %status, "Presence updated");
    }

    /// Last-known presence of an identity (`online` if never set)
    pub fn presence(&self, identity_id: &str) -> String {
        self.tracker.presence(identity_id)
    }

    /// One entry per live connection
    pub fn list_online(&self) -> Vec<OnlineUser> {
        let mut online: Vec<OnlineUser> = self
            .tracker
            .all()
            .iter()
            .map(|conn| {
                let identity = conn.identity();
                OnlineUser {
                    id: identity.id.clone(),
                    email: identity.email.clone(),
                    role: identity.role,
                    socket_id: conn.id().to_string(),
                    status: self.tracker.presence(&identity.id),
                }
            })
            .collect();
        online.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.socket_id.cmp(&b.socket_id)));
        online
    }

    /// Channels a connection currently belongs to
    pub fn channels_of(&self, connection_id: &str) -> Option<Vec<String>> {
        self.tracker.get(connection_id).map(|conn| conn.channels())
    }

    /// Get the total number of live connections
    pub fn connection_count(&self) -> usize {
        self.tracker.len()
    }

    /// Get the number of distinct identities online
    pub fn user_count(&self) -> usize {
        self.tracker.user_count()
    }

    /// Whether `shutdown` has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Close every connection and clear all membership and presence state
    ///
    /// No presence events are emitted. Later admissions are refused.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let dropped = {
            let _guard = self.membership.lock();
            self.tracker.clear()
        };

        for connection in &dropped {
            connection.mark_disconnected().ok();
            connection.close();
        }

        tracing::info!(connections = dropped.len(), "Room manager shut down");
    }
}

impl std::fmt::Debug for RoomManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomManager")
            .field("rooms", &self.registry.len())
            .field("tracker", &self.tracker)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
