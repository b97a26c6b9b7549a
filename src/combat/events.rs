//! Interfaces the combat engine consumes from the rest of the server
//!
//! The engine never talks to sessions or world storage directly. It
//! resolves room occupants through a [`RoomLocator`], delivers text via a
//! [`Publisher`], and hands deaths to an [`EventHandler`].

use thiserror::Error;

use super::death::DeathContext;

/// Who a published message is addressed to
///
/// The engine's own delivery always addresses players one at a time;
/// `Room` is for collaborators such as death handlers announcing to a
/// whole room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlayerGroup {
    /// Everyone in a room
    Room { zone_id: String, room_id: String },
    /// A single player, by character ID
    Player(String),
}

impl PlayerGroup {
    pub fn player(character_id: &str) -> Self {
        PlayerGroup::Player(character_id.to_string())
    }

    pub fn room(zone_id: &str, room_id: &str) -> Self {
        PlayerGroup::Room {
            zone_id: zone_id.to_string(),
            room_id: room_id.to_string(),
        }
    }
}

/// Delivery failures
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("recipient not connected: {0}")]
    NotConnected(String),

    #[error("delivery failed: {0}")]
    Transport(String),
}

/// Message sink for player-facing text
pub trait Publisher: Send + Sync {
    /// Deliver `data` to `target`, skipping any character IDs in `exclude`
    fn publish(&self, target: PlayerGroup, exclude: &[String], data: &[u8]) -> Result<(), PublishError>;
}

/// Occupancy of one room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomView {
    pub zone_id: String,
    pub room_id: String,
    /// Character IDs of players currently present
    pub players: Vec<String>,
}

/// Resolves a location to the players who can see what happens there
pub trait RoomLocator: Send + Sync {
    /// `None` if the room does not exist
    fn find_room(&self, zone_id: &str, room_id: &str) -> Option<RoomView>;
}

/// Receives deaths after every message of the tick has been delivered.
///
/// Implementations own corpses, loot transfer and respawn, and may publish
/// further messages of their own.
pub trait EventHandler: Send + Sync {
    fn on_death(&self, death: &DeathContext);
}
