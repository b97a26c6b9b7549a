//! Common test utilities for combatd integration tests
//!
//! Provides recording collaborators for [`CombatManager`] and quick
//! combatant builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use combatd::combat::{
    AbilityScores, Character, CombatManager, Combatant, DeathContext, DiceRoll, EventHandler,
    MobTemplate, PlayerCombatant, PlayerGroup, PublishError, Publisher, RoomLocator, RoomView,
};
use parking_lot::Mutex;

/// Everything the engine did, in call order
#[derive(Debug, Clone)]
pub enum Event {
    Published { player: String, text: String },
    Death(DeathContext),
}

/// Records publishes and deaths into one ordered log
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    /// Character IDs whose deliveries fail
    failing: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// All text delivered to one player, in order
    pub fn messages_for(&self, player: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Published { player: p, text } if p == player => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn deaths(&self) -> Vec<DeathContext> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Death(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_deliveries_to(&self, player: &str) {
        self.failing.lock().push(player.to_string());
    }
}

impl Publisher for Recorder {
    fn publish(&self, target: PlayerGroup, _exclude: &[String], data: &[u8]) -> Result<(), PublishError> {
        let PlayerGroup::Player(player) = target else {
            return Err(PublishError::Transport("room broadcast not expected".to_string()));
        };
        if self.failing.lock().contains(&player) {
            return Err(PublishError::NotConnected(player));
        }
        self.events.lock().push(Event::Published {
            player,
            text: String::from_utf8_lossy(data).into_owned(),
        });
        Ok(())
    }
}

impl EventHandler for Recorder {
    fn on_death(&self, death: &DeathContext) {
        self.events.lock().push(Event::Death(death.clone()));
    }
}

/// Room locator over a fixed (zone, room) → players table
#[derive(Debug, Default)]
pub struct Rooms {
    rooms: Mutex<HashMap<(String, String), Vec<String>>>,
}

impl Rooms {
    pub fn with(self, zone: &str, room: &str, players: &[&str]) -> Self {
        self.rooms.lock().insert(
            (zone.to_string(), room.to_string()),
            players.iter().map(|p| p.to_string()).collect(),
        );
        self
    }
}

impl RoomLocator for Rooms {
    fn find_room(&self, zone_id: &str, room_id: &str) -> Option<RoomView> {
        let rooms = self.rooms.lock();
        let players = rooms.get(&(zone_id.to_string(), room_id.to_string()))?;
        Some(RoomView {
            zone_id: zone_id.to_string(),
            room_id: room_id.to_string(),
            players: players.clone(),
        })
    }
}

/// A manager wired to a recorder and the given rooms
pub fn manager(rooms: Rooms) -> (Arc<CombatManager>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let manager = CombatManager::shared(Arc::new(rooms), recorder.clone(), recorder.clone());
    (manager, recorder)
}

/// Level-1 player with average stats, unarmed
pub fn player(id: &str, name: &str, hp: i32) -> PlayerCombatant {
    PlayerCombatant::from_character(Character::new(id, name, 1).with_hp(hp))
}

/// A player whose every swing lands and kills anything with a few HP
pub fn brute(id: &str, name: &str, level: i32) -> PlayerCombatant {
    PlayerCombatant::from_character(
        Character::new(id, name, level)
            .with_hp(1000)
            .with_abilities(AbilityScores {
                strength: 40,
                ..Default::default()
            }),
    )
}

/// Fresh mob with the given HP and a weak 1d2 attack
pub fn mob(name: &str, level: i32, hp: i32) -> Combatant {
    Arc::new(MobTemplate::new(name, name, level, hp, DiceRoll::new(1, 2, 0)))
        .spawn()
        .into()
}
