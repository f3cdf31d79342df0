//! Room registry
//!
//! Immutable table of the rooms a connection can be placed in, keyed by
//! name and queryable by role. Built once at startup.

use pos_core::{DomainError, Identity, Role, RoomDefinition, ROLE_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
use std::collections::HashMap;

/// Validated, read-only set of room definitions
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Vec<RoomDefinition>,
    by_name: HashMap<String, usize>,
}

impl RoomRegistry {
    /// Build a registry from definitions
    ///
    /// # Errors
    /// Returns an error if any definition is invalid or two share a name
    pub fn new(rooms: Vec<RoomDefinition>) -> Result<Self, DomainError> {
        let mut by_name = HashMap::with_capacity(rooms.len());

        for (index, room) in rooms.iter().enumerate() {
            room.validate()?;
            if by_name.insert(room.name.clone(), index).is_some() {
                return Err(DomainError::DuplicateRoom(room.name.clone()));
            }
        }

        Ok(Self { rooms, by_name })
    }

    /// The built-in room table
    #[must_use]
    pub fn default_rooms() -> Vec<RoomDefinition> {
        use Role::{Admin, Customer, Kitchen, Owner, Waiter};

        vec![
            RoomDefinition::new(
                "admin",
                [Owner, Admin],
                "Administrative alerts and presence changes",
            ),
            RoomDefinition::new(
                "kitchen",
                [Owner, Admin, Kitchen],
                "Kitchen display notifications",
            ),
            RoomDefinition::new(
                "orders",
                [Owner, Admin, Waiter, Kitchen],
                "Order lifecycle updates",
            ),
            RoomDefinition::new("tables", [Owner, Admin, Waiter], "Table status updates"),
            RoomDefinition::new(
                "all_staff",
                [Owner, Admin, Waiter, Kitchen],
                "Staff-wide announcements",
            ),
            RoomDefinition::new("customers", [Customer], "Customer-facing notifications"),
        ]
    }

    /// Look up a room by name
    pub fn describe(&self, name: &str) -> Option<&RoomDefinition> {
        self.by_name.get(name).map(|&index| &self.rooms[index])
    }

    /// Every room `role` is allowed to join, in table order
    pub fn rooms_for_role(&self, role: Role) -> Vec<&RoomDefinition> {
        self.rooms.iter().filter(|room| room.permits(role)).collect()
    }

    /// Whether `role` may join the named room; unknown rooms are never accessible
    pub fn has_access(&self, role: Role, name: &str) -> bool {
        self.describe(name).is_some_and(|room| room.permits(role))
    }

    /// Whether the registry defines a room with this name
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether `channel` names a configured room or a well-formed implicit channel
    ///
    /// Implicit channels are `role:<role>` for a role in the enumeration and
    /// `user:<id>` for any non-empty id.
    pub fn is_known_channel(&self, channel: &str) -> bool {
        if self.contains(channel) {
            return true;
        }
        if let Some(role) = channel.strip_prefix(ROLE_CHANNEL_PREFIX) {
            return Role::parse(role).is_ok();
        }
        if let Some(id) = channel.strip_prefix(USER_CHANNEL_PREFIX) {
            return !id.is_empty();
        }
        false
    }

    /// Full channel set for an identity: its implicit channels followed by its rooms
    pub fn channels_for(&self, identity: &Identity) -> Vec<String> {
        let mut channels = vec![identity.role_channel(), identity.user_channel()];
        channels.extend(
            self.rooms_for_role(identity.role)
                .into_iter()
                .map(|room| room.name.clone()),
        );
        channels
    }

    /// Iterate over all rooms in table order
    pub fn iter(&self) -> impl Iterator<Item = &RoomDefinition> {
        self.rooms.iter()
    }

    /// Number of configured rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are configured
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        let rooms = Self::default_rooms();
        let by_name = rooms
            .iter()
            .enumerate()
            .map(|(index, room)| (room.name.clone(), index))
            .collect();
        Self { rooms, by_name }
    }
}
