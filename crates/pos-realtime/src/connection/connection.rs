//! Individual real-time connection
//!
//! Represents one admitted WebSocket session and the channels it has joined.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pos_core::Identity;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::{ConnectionState, InvalidTransition};
use crate::protocol::Envelope;

/// A single admitted connection
pub struct Connection {
    /// Unique connection ID (reported as `socketId`)
    id: String,

    /// Identity decoded from the handshake credential
    identity: Identity,

    /// Channel to the socket writer task
    sender: mpsc::Sender<Envelope>,

    /// Current lifecycle state
    state: RwLock<ConnectionState>,

    /// Channels this connection has joined
    channels: RwLock<BTreeSet<String>>,

    /// Flipped to `true` when the server wants the socket closed
    close_tx: watch::Sender<bool>,

    /// Connection creation time
    connected_at: DateTime<Utc>,
}

impl Connection {
    /// Create a connection for an identity that passed the handshake
    pub fn new(id: String, identity: Identity, sender: mpsc::Sender<Envelope>) -> Arc<Self> {
        let (close_tx, _) = watch::channel(false);

        Arc::new(Self {
            id,
            identity,
            sender,
            state: RwLock::new(ConnectionState::Admitted),
            channels: RwLock::new(BTreeSet::new()),
            close_tx,
            connected_at: Utc::now(),
        })
    }

    /// Generate a new connection ID
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Get the connection ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the identity behind this connection
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Mark the connection disconnected
    ///
    /// # Errors
    /// Returns `InvalidTransition` if the connection already reached a terminal state
    pub fn mark_disconnected(&self) -> Result<(), InvalidTransition> {
        self.state.write().transition(ConnectionState::Disconnected)
    }

    /// Record that the connection joined a channel; returns false if already joined
    pub fn join(&self, channel: &str) -> bool {
        self.channels.write().insert(channel.to_string())
    }

    /// Record that the connection left a channel; returns false if it was not joined
    pub fn leave(&self, channel: &str) -> bool {
        self.channels.write().remove(channel)
    }

    /// Snapshot of joined channels, sorted
    pub fn channels(&self) -> Vec<String> {
        self.channels.read().iter().cloned().collect()
    }

    /// Forget every joined channel, returning what was joined
    pub fn clear_channels(&self) -> BTreeSet<String> {
        std::mem::take(&mut *self.channels.write())
    }

    /// Queue a frame without waiting
    ///
    /// Fire-and-forget: a full or closed queue drops the frame.
    pub fn try_send(&self, message: Envelope) -> Result<(), mpsc::error::TrySendError<Envelope>> {
        self.sender.try_send(message)
    }

    /// Ask the socket task to close this connection
    pub fn close(&self) {
        self.close_tx.send_replace(true);
    }

    /// Subscribe to close requests
    pub fn close_signal(&self) -> watch::Receiver<bool> {
        self.close_tx.subscribe()
    }

    /// Connection creation time
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("state", &self.state())
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
