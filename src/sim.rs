//! In-memory world for running the engine standalone
//!
//! Provides the collaborators the combat engine expects:
//! - [`SimWorld`]: room occupancy lookups and the roster of combatants
//! - [`LogPublisher`]: delivers player text to the log
//! - [`Respawner`]: respawns dead mobs and revives dead players

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::combat::{
    capitalize, Character, CombatManager, Combatant, DeathContext, EventHandler, MobCombatant,
    MobTemplate, PlayerCombatant, PlayerGroup, PublishError, Publisher, RoomLocator, RoomView,
};
use crate::config::{EngagementConfig, WorldConfig};

/// A mob placement and whatever instance currently fills it
#[derive(Debug, Clone)]
struct Spawn {
    template: Arc<MobTemplate>,
    zone: String,
    room: String,
    current: MobCombatant,
}

#[derive(Debug, Clone)]
struct PlayerEntry {
    combatant: PlayerCombatant,
    zone: String,
    room: String,
}

/// The simulated world
#[derive(Debug, Default)]
pub struct SimWorld {
    rooms: BTreeSet<(String, String)>,
    players: HashMap<String, PlayerEntry>,
    spawns: RwLock<HashMap<String, Spawn>>,
}

impl SimWorld {
    /// Build the world, validating every reference in the config
    pub fn from_config(config: &WorldConfig) -> Result<Self> {
        let rooms: BTreeSet<(String, String)> = config
            .rooms
            .iter()
            .map(|r| (r.zone.clone(), r.room.clone()))
            .collect();

        let templates: HashMap<&str, Arc<MobTemplate>> = config
            .mobs
            .iter()
            .map(|m| (m.id.as_str(), Arc::new(m.clone())))
            .collect();

        let check_room = |zone: &str, room: &str| -> Result<()> {
            if !rooms.contains(&(zone.to_string(), room.to_string())) {
                bail!("Unknown room: {}/{}", zone, room);
            }
            Ok(())
        };

        let mut spawns = HashMap::new();
        for spawn in &config.spawns {
            check_room(&spawn.zone, &spawn.room)?;
            let Some(template) = templates.get(spawn.template.as_str()) else {
                bail!("Spawn {} uses unknown mob template {}", spawn.key, spawn.template);
            };
            spawns.insert(
                spawn.key.clone(),
                Spawn {
                    template: template.clone(),
                    zone: spawn.zone.clone(),
                    room: spawn.room.clone(),
                    current: template.spawn(),
                },
            );
        }

        let mut players = HashMap::new();
        for p in &config.players {
            check_room(&p.zone, &p.room)?;
            if spawns.contains_key(&p.id) {
                bail!("Player id {} collides with a spawn key", p.id);
            }
            let mut character = Character::new(&p.id, &p.name, p.level).with_abilities(p.abilities);
            if let Some(hp) = p.hp {
                character = character.with_hp(hp);
            }
            for (slot, item) in &p.equipment {
                character.equipment.equip(*slot, item.clone());
            }
            players.insert(
                p.id.clone(),
                PlayerEntry {
                    combatant: PlayerCombatant::from_character(character),
                    zone: p.zone.clone(),
                    room: p.room.clone(),
                },
            );
        }

        Ok(Self {
            rooms,
            players,
            spawns: RwLock::new(spawns),
        })
    }

    /// Look up a player ID or spawn key, with its location
    pub fn combatant(&self, name: &str) -> Option<(Combatant, String, String)> {
        if let Some(p) = self.players.get(name) {
            return Some((p.combatant.clone().into(), p.zone.clone(), p.room.clone()));
        }
        self.spawns
            .read()
            .get(name)
            .map(|s| (s.current.clone().into(), s.zone.clone(), s.room.clone()))
    }

    pub fn player(&self, id: &str) -> Option<PlayerCombatant> {
        self.players.get(id).map(|p| p.combatant.clone())
    }

    /// Start every configured engagement, returning how many began.
    /// Fights open in the target's room.
    pub fn start_engagements(&self, manager: &CombatManager, engagements: &[EngagementConfig]) -> usize {
        let mut started = 0;
        for engagement in engagements {
            let (Some((attacker, _, _)), Some((target, zone, room))) = (
                self.combatant(&engagement.attacker),
                self.combatant(&engagement.target),
            ) else {
                warn!(
                    attacker = %engagement.attacker,
                    target = %engagement.target,
                    "engagement references unknown combatant"
                );
                continue;
            };

            match manager.start_combat(attacker, target, &zone, &room) {
                Ok(()) => started += 1,
                Err(e) => warn!(error = %e, "engagement skipped"),
            }
        }
        started
    }

    /// Replace a dead mob with a fresh instance of its template
    fn respawn_mob(&self, combat_id: &str) -> Option<MobCombatant> {
        let mut spawns = self.spawns.write();
        let spawn = spawns
            .values_mut()
            .find(|s| s.current.combat_id() == combat_id)?;
        spawn.current = spawn.template.spawn();
        Some(spawn.current.clone())
    }
}

impl RoomLocator for SimWorld {
    fn find_room(&self, zone_id: &str, room_id: &str) -> Option<RoomView> {
        if !self.rooms.contains(&(zone_id.to_string(), room_id.to_string())) {
            return None;
        }

        let mut players: Vec<String> = self
            .players
            .iter()
            .filter(|(_, p)| p.zone == zone_id && p.room == room_id)
            .map(|(id, _)| id.clone())
            .collect();
        players.sort();

        Some(RoomView {
            zone_id: zone_id.to_string(),
            room_id: room_id.to_string(),
            players,
        })
    }
}

/// Writes every delivered message to the log
#[derive(Debug, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, target: PlayerGroup, exclude: &[String], data: &[u8]) -> Result<(), PublishError> {
        let text = String::from_utf8_lossy(data);
        match target {
            PlayerGroup::Player(id) if !exclude.contains(&id) => {
                info!(target: "combatd::out", player = %id, "{}", text.trim_end());
            }
            PlayerGroup::Player(_) => {}
            PlayerGroup::Room { zone_id, room_id } => {
                info!(target: "combatd::out", zone = %zone_id, room = %room_id, "{}", text.trim_end());
            }
        }
        Ok(())
    }
}

/// Death handler: mobs respawn in place, players are restored to full HP
pub struct Respawner {
    world: Arc<SimWorld>,
    publisher: Arc<dyn Publisher>,
}

impl Respawner {
    pub fn new(world: Arc<SimWorld>, publisher: Arc<dyn Publisher>) -> Self {
        Self { world, publisher }
    }
}

impl EventHandler for Respawner {
    fn on_death(&self, death: &DeathContext) {
        match serde_json::to_string(&death.record()) {
            Ok(json) => info!(death = %json, "death"),
            Err(e) => warn!(error = %e, "failed to encode death record"),
        }

        match &death.victim {
            Combatant::Mob(mob) => {
                if let Some(fresh) = self.world.respawn_mob(mob.combat_id()) {
                    info!(
                        old = mob.combat_id(),
                        new = fresh.combat_id(),
                        zone = %death.zone_id,
                        room = %death.room_id,
                        "mob respawned"
                    );
                    let notice = format!("{} appears.\n", capitalize(&fresh.combat_name()));
                    if let Err(e) = self.publisher.publish(
                        PlayerGroup::room(&death.zone_id, &death.room_id),
                        &[],
                        notice.as_bytes(),
                    ) {
                        warn!(error = %e, "failed to announce respawn");
                    }
                }
            }
            Combatant::Player(player) => {
                let mut character = player.character().write();
                character.hp = character.max_hp;
                info!(player = player.combat_id(), "player revived");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DiceRoll;
    use crate::config::{PlayerConfig, RoomConfig, SpawnConfig};

    /// Keeps every publish for inspection
    #[derive(Default)]
    struct Outbox(parking_lot::Mutex<Vec<(PlayerGroup, String)>>);

    impl Publisher for Outbox {
        fn publish(&self, target: PlayerGroup, _exclude: &[String], data: &[u8]) -> Result<(), PublishError> {
            self.0
                .lock()
                .push((target, String::from_utf8_lossy(data).into_owned()));
            Ok(())
        }
    }

    fn world_config() -> WorldConfig {
        WorldConfig {
            rooms: vec![RoomConfig {
                zone: "caves".to_string(),
                room: "passage".to_string(),
            }],
            mobs: vec![MobTemplate::new("bat", "a giant bat", 1, 4, DiceRoll::new(1, 2, 0))],
            spawns: vec![SpawnConfig {
                key: "bat1".to_string(),
                template: "bat".to_string(),
                zone: "caves".to_string(),
                room: "passage".to_string(),
            }],
            players: vec![PlayerConfig {
                id: "p1".to_string(),
                name: "Aldric".to_string(),
                level: 2,
                abilities: Default::default(),
                hp: Some(30),
                equipment: Default::default(),
                zone: "caves".to_string(),
                room: "passage".to_string(),
            }],
            engagements: vec![EngagementConfig {
                attacker: "p1".to_string(),
                target: "bat1".to_string(),
            }],
        }
    }

    #[test]
    fn test_world_from_config() {
        let world = SimWorld::from_config(&world_config()).unwrap();
        let room = world.find_room("caves", "passage").unwrap();
        assert_eq!(room.players, vec!["p1".to_string()]);
        assert!(world.find_room("caves", "nowhere").is_none());

        let (bat, zone, room) = world.combatant("bat1").unwrap();
        assert!(bat.combat_id().starts_with("mob:"));
        assert_eq!((zone.as_str(), room.as_str()), ("caves", "passage"));
        assert_eq!(world.player("p1").unwrap().hp(), 30);
    }

    #[test]
    fn test_unknown_references_rejected() {
        let mut config = world_config();
        config.spawns[0].template = "dragon".to_string();
        assert!(SimWorld::from_config(&config).is_err());

        let mut config = world_config();
        config.players[0].room = "attic".to_string();
        assert!(SimWorld::from_config(&config).is_err());
    }

    #[test]
    fn test_respawn_replaces_instance() {
        let world = Arc::new(SimWorld::from_config(&world_config()).unwrap());
        let (bat, _, _) = world.combatant("bat1").unwrap();
        bat.apply_damage(100);

        let outbox = Arc::new(Outbox::default());
        let respawner = Respawner::new(world.clone(), outbox.clone());
        respawner.on_death(&DeathContext {
            victim: bat.clone(),
            zone_id: "caves".to_string(),
            room_id: "passage".to_string(),
            opponents: vec![],
            damage_by: HashMap::new(),
        });

        let (fresh, _, _) = world.combatant("bat1").unwrap();
        assert!(!fresh.is(&bat));
        assert!(fresh.is_alive());

        let sent = outbox.0.lock();
        assert_eq!(
            *sent,
            vec![(
                PlayerGroup::room("caves", "passage"),
                "A giant bat appears.\n".to_string()
            )]
        );
    }

    #[test]
    fn test_player_revived() {
        let world = Arc::new(SimWorld::from_config(&world_config()).unwrap());
        let player = world.player("p1").unwrap();
        player.apply_damage(100);

        let outbox = Arc::new(Outbox::default());
        Respawner::new(world.clone(), outbox.clone()).on_death(&DeathContext {
            victim: player.clone().into(),
            zone_id: "caves".to_string(),
            room_id: "passage".to_string(),
            opponents: vec![],
            damage_by: HashMap::new(),
        });
        assert_eq!(player.hp(), 30);
        assert!(outbox.0.lock().is_empty());
    }

    #[test]
    fn test_log_publisher_never_fails() {
        let publisher = LogPublisher;
        assert!(publisher
            .publish(PlayerGroup::player("p1"), &[], b"A bat misses Aldric!\n")
            .is_ok());
        assert!(publisher
            .publish(PlayerGroup::room("caves", "passage"), &[], b"hello")
            .is_ok());
    }
}
