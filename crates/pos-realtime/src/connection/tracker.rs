//! Connection tracker
//!
//! Owns every admitted connection plus the reverse indexes used for fan-out,
//! using `DashMap` for concurrent access from socket tasks.

use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::Connection;

/// Status reported for identities that never set one
pub const DEFAULT_PRESENCE: &str = "online";

/// In-memory store of admitted connections and presence
pub struct ConnectionTracker {
    /// Active connections by connection ID
    connections: DashMap<String, Arc<Connection>>,

    /// Channel name to connection IDs
    channel_members: DashMap<String, HashSet<String>>,

    /// Identity ID to connection IDs
    user_connections: DashMap<String, HashSet<String>>,

    /// Identity ID to last-known status; survives reconnects
    presence: DashMap<String, String>,
}

impl ConnectionTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            channel_members: DashMap::new(),
            user_connections: DashMap::new(),
            presence: DashMap::new(),
        }
    }

    /// Record a connection
    pub fn insert(&self, connection: Arc<Connection>) {
        let id = connection.id().to_string();
        self.user_connections
            .entry(connection.identity().id.clone())
            .or_default()
            .insert(id.clone());
        self.connections.insert(id, connection);
    }

    /// Forget a connection and drop it from every channel it joined
    pub fn remove(&self, connection_id: &str) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(connection_id)?;

        for channel in connection.clear_channels() {
            self.drop_member(&channel, connection_id);
        }

        let user_id = &connection.identity().id;
        self.user_connections.alter(user_id, |_, mut sessions| {
            sessions.remove(connection_id);
            sessions
        });
        self.user_connections
            .remove_if(user_id, |_, sessions| sessions.is_empty());

        Some(connection)
    }

    /// Get a connection by ID
    pub fn get(&self, connection_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(connection_id).map(|r| r.clone())
    }

    /// Add a connection to a channel; returns false if unknown or already a member
    pub fn join(&self, connection_id: &str, channel: &str) -> bool {
        let Some(connection) = self.get(connection_id) else {
            return false;
        };
        if !connection.join(channel) {
            return false;
        }

        self.channel_members
            .entry(channel.to_string())
            .or_default()
            .insert(connection_id.to_string());
        true
    }

    /// Remove a connection from a channel; returns false if it was not a member
    pub fn leave(&self, connection_id: &str, channel: &str) -> bool {
        let Some(connection) = self.get(connection_id) else {
            return false;
        };
        if !connection.leave(channel) {
            return false;
        }

        self.drop_member(channel, connection_id);
        true
    }

    fn drop_member(&self, channel: &str, connection_id: &str) {
        self.channel_members.alter(channel, |_, mut members| {
            members.remove(connection_id);
            members
        });
        self.channel_members
            .remove_if(channel, |_, members| members.is_empty());
    }

    /// Connections currently joined to a channel
    pub fn members(&self, channel: &str) -> Vec<Arc<Connection>> {
        let ids: Vec<String> = self
            .channel_members
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();

        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Number of connections joined to a channel
    #[cfg(test)]
    fn member_count(&self, channel: &str) -> usize {
        self.channel_members
            .get(channel)
            .map_or(0, |members| members.len())
    }

    /// Per-channel member counts for every non-empty channel
    pub fn channel_counts(&self) -> BTreeMap<String, usize> {
        self.channel_members
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    /// Connections belonging to an identity
    #[cfg(test)]
    fn user_connections(&self, user_id: &str) -> Vec<Arc<Connection>> {
        let ids: Vec<String> = self
            .user_connections
            .get(user_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default();

        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Snapshot of every connection
    pub fn all(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    /// Get the total number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are tracked
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Get the number of distinct identities with at least one connection
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Set an identity's presence status
    pub fn set_presence(&self, user_id: &str, status: &str) {
        self.presence.insert(user_id.to_string(), status.to_string());
    }

    /// Get an identity's presence status
    pub fn presence(&self, user_id: &str) -> String {
        self.presence
            .get(user_id)
            .map_or_else(|| DEFAULT_PRESENCE.to_string(), |s| s.clone())
    }

    /// Number of presence entries ever recorded
    #[cfg(test)]
    fn presence_entries(&self) -> usize {
        self.presence.len()
    }

    /// Drop every connection, index and presence entry, returning the dropped connections
    pub fn clear(&self) -> Vec<Arc<Connection>> {
        let connections = self.all();
        self.connections.clear();
        self.channel_members.clear();
        self.user_connections.clear();
        self.presence.clear();
        connections
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTracker")
            .field("connections", &self.connections.len())
            .field("channels", &self.channel_members.len())
            .field("users", &self.user_connections.len())
            .field("presence", &self.presence.len())
            .finish()
    }
}
