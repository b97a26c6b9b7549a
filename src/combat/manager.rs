//! Combat registry and round scheduler
//!
//! [`CombatManager`] owns every active fight in the world. An external
//! driver calls [`CombatManager::tick`] once per game round; the tick runs
//! in three strictly ordered phases:
//!
//! 1. Compute: each fight resolves one round of attacks, then deaths and
//!    experience.
//! 2. Deliver: combat text is published, one message per player.
//! 3. Effects: death handlers run, only after *all* of the tick's text has
//!    gone out.
//!
//! A single mutex guards the registry for the whole tick, so joining a
//! fight can never interleave with a round in progress.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::combatant::Combatant;
use super::death::DeathContext;
use super::events::{EventHandler, PlayerGroup, Publisher, RoomLocator};
use super::fight::{Fight, FightId, Fighter};
use super::verbs::xp_line;
use super::xp::{base_experience, calculate_xp_awards, XpParticipant};

/// Errors from combat registration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("{0} is already in combat")]
    AlreadyInCombat(String),

    #[error("{0} cannot attack itself")]
    SelfTarget(String),

    #[error("{0} is already dead")]
    AlreadyDead(String),
}

/// Counters from one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Fights processed
    pub fights: usize,
    /// Attacks rolled
    pub attacks: usize,
    pub deaths: usize,
    /// Fights torn down at the end of the tick
    pub pruned: usize,
}

/// Per-fight output of the compute phase
#[derive(Debug)]
struct FightResult {
    zone_id: String,
    room_id: String,
    /// Lines everyone in the room sees
    room_lines: Vec<String>,
    /// Extra lines for individual players, by character ID
    player_lines: BTreeMap<String, Vec<String>>,
    deaths: Vec<DeathContext>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: FightId,
    /// combat id → fight; authoritative membership
    combatants: HashMap<String, FightId>,
    fights: HashMap<FightId, Fight>,
    /// zone → room → fights, in creation order
    rooms: BTreeMap<String, BTreeMap<String, Vec<FightId>>>,
}

impl Registry {
    /// Fight ids in zone, room, creation order
    fn ordered_fights(&self) -> Vec<FightId> {
        self.rooms
            .values()
            .flat_map(|rooms| rooms.values())
            .flatten()
            .copied()
            .collect()
    }

    fn insert(&mut self, fight: Fight) {
        for fighter in fight.fighters() {
            self.combatants.insert(fighter.combat_id().to_string(), fight.id);
        }
        self.rooms
            .entry(fight.zone_id.clone())
            .or_default()
            .entry(fight.room_id.clone())
            .or_default()
            .push(fight.id);
        self.fights.insert(fight.id, fight);
    }

    /// Drop a fight from both indices, releasing anyone still in it
    fn teardown(&mut self, id: FightId) {
        let Some(mut fight) = self.fights.remove(&id) else {
            return;
        };

        for fighter in fight.side_a.drain(..).chain(fight.side_b.drain(..)) {
            fighter.combatant.set_in_combat(false);
            self.combatants.remove(fighter.combatant.combat_id());
        }
        self.combatants.retain(|_, fight_id| *fight_id != id);

        if let Some(rooms) = self.rooms.get_mut(&fight.zone_id) {
            if let Some(ids) = rooms.get_mut(&fight.room_id) {
                ids.retain(|fight_id| *fight_id != id);
                if ids.is_empty() {
                    rooms.remove(&fight.room_id);
                }
            }
            if rooms.is_empty() {
                self.rooms.remove(&fight.zone_id);
            }
        }

        info!(fight = id, zone = %fight.zone_id, room = %fight.room_id, "fight ended");
    }
}

/// The world's combat engine
pub struct CombatManager {
    registry: Mutex<Registry>,
    rooms: Arc<dyn RoomLocator>,
    publisher: Arc<dyn Publisher>,
    events: Arc<dyn EventHandler>,
}

impl std::fmt::Debug for CombatManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("CombatManager");
        // may be formatted from a death handler while a tick holds the lock
        match self.registry.try_lock() {
            Some(registry) => out
                .field("fights", &registry.fights.len())
                .field("combatants", &registry.combatants.len()),
            None => out.field("registry", &"<locked>"),
        };
        out.finish()
    }
}

impl CombatManager {
    /// Create a combat manager wired to its collaborators
    pub fn new(
        rooms: Arc<dyn RoomLocator>,
        publisher: Arc<dyn Publisher>,
        events: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            rooms,
            publisher,
            events,
        }
    }

    /// Create a shared instance
    pub fn shared(
        rooms: Arc<dyn RoomLocator>,
        publisher: Arc<dyn Publisher>,
        events: Arc<dyn EventHandler>,
    ) -> Arc<Self> {
        Arc::new(Self::new(rooms, publisher, events))
    }

    /// Put `attacker` into combat against `target`.
    ///
    /// If `target` is already fighting, the attacker joins the opposite
    /// side of that fight and the given location is ignored. Otherwise a
    /// new fight opens at `zone_id`/`room_id`.
    pub fn start_combat(
        &self,
        attacker: Combatant,
        target: Combatant,
        zone_id: &str,
        room_id: &str,
    ) -> Result<(), CombatError> {
        let mut guard = self.registry.lock();
        let registry = &mut *guard;

        if registry.combatants.contains_key(attacker.combat_id()) {
            return Err(CombatError::AlreadyInCombat(attacker.combat_id().to_string()));
        }
        if attacker.is(&target) {
            return Err(CombatError::SelfTarget(attacker.combat_id().to_string()));
        }
        for combatant in [&attacker, &target] {
            if !combatant.is_alive() {
                return Err(CombatError::AlreadyDead(combatant.combat_id().to_string()));
            }
        }

        if let Some(&fight_id) = registry.combatants.get(target.combat_id()) {
            let joined = registry.fights.get_mut(&fight_id).and_then(|fight| {
                let side = fight.side_of(target.combat_id())?.opposite();
                fight.join(side, attacker.clone(), target.clone());
                Some(side)
            });

            if let Some(side) = joined {
                attacker.set_in_combat(true);
                registry
                    .combatants
                    .insert(attacker.combat_id().to_string(), fight_id);
                info!(
                    fight = fight_id,
                    attacker = attacker.combat_id(),
                    target = target.combat_id(),
                    ?side,
                    "joined fight"
                );
                return Ok(());
            }

            // index pointed at a fight that no longer holds the target
            warn!(target = target.combat_id(), fight = fight_id, "stale combat registration");
            registry.combatants.remove(target.combat_id());
        }

        let id = registry.next_id;
        registry.next_id += 1;

        attacker.set_in_combat(true);
        target.set_in_combat(true);
        info!(
            fight = id,
            attacker = attacker.combat_id(),
            target = target.combat_id(),
            zone = zone_id,
            room = room_id,
            "fight started"
        );
        registry.insert(Fight::new(id, zone_id, room_id, attacker, target));

        Ok(())
    }

    /// Current fighter record for a combatant, if in combat
    pub fn get_fighter(&self, combat_id: &str) -> Option<Fighter> {
        let registry = self.registry.lock();
        let fight_id = registry.combatants.get(combat_id)?;
        registry.fights.get(fight_id)?.fighter(combat_id).cloned()
    }

    /// Fighter record for a player character
    pub fn get_player_fighter(&self, character_id: &str) -> Option<Fighter> {
        self.get_fighter(&format!("player:{}", character_id))
    }

    /// Zone and room of the fight a combatant is in
    pub fn fight_location(&self, combat_id: &str) -> Option<(String, String)> {
        let registry = self.registry.lock();
        let fight = registry.fights.get(registry.combatants.get(combat_id)?)?;
        Some((fight.zone_id.clone(), fight.room_id.clone()))
    }

    pub fn is_in_combat(&self, combat_id: &str) -> bool {
        self.registry.lock().combatants.contains_key(combat_id)
    }

    /// Number of active fights
    pub fn fight_count(&self) -> usize {
        self.registry.lock().fights.len()
    }

    /// Pull a combatant out of its fight (flee, disconnect).
    ///
    /// Opponents aiming at it lose their target and pick a new one next
    /// round. Returns false if it was not in combat.
    pub fn leave_combat(&self, combat_id: &str) -> bool {
        let mut guard = self.registry.lock();
        let registry = &mut *guard;

        let Some(fight_id) = registry.combatants.remove(combat_id) else {
            return false;
        };

        let mut over = false;
        if let Some(fight) = registry.fights.get_mut(&fight_id) {
            if let Some(fighter) = fight.remove(combat_id) {
                fighter.combatant.set_in_combat(false);
            }
            for side in [&mut fight.side_a, &mut fight.side_b] {
                for fighter in side.iter_mut() {
                    if fighter.target.as_ref().is_some_and(|t| t.combat_id() == combat_id) {
                        fighter.target = None;
                    }
                }
            }
            over = fight.is_over();
        }

        info!(combatant = combat_id, fight = fight_id, "left combat");
        if over {
            registry.teardown(fight_id);
        }
        true
    }

    /// Advance every fight by one round
    pub fn tick(&self) -> TickSummary {
        self.tick_with(&mut rand::rng())
    }

    /// One round with a caller-supplied rng
    pub fn tick_with(&self, rng: &mut impl Rng) -> TickSummary {
        let mut guard = self.registry.lock();
        let registry = &mut *guard;
        let mut summary = TickSummary::default();

        // Compute
        let mut results = Vec::new();
        for id in registry.ordered_fights() {
            let Some(fight) = registry.fights.get_mut(&id) else {
                continue;
            };

            let round = fight.process_with(rng);
            let deaths = fight.resolve_deaths(&mut registry.combatants);

            summary.fights += 1;
            summary.attacks += round.attacks;
            summary.deaths += deaths.deaths.len();

            let mut result = FightResult {
                zone_id: fight.zone_id.clone(),
                room_id: fight.room_id.clone(),
                room_lines: round.lines,
                player_lines: BTreeMap::new(),
                deaths: Vec::new(),
            };
            result.room_lines.extend(deaths.lines);
            for death in &deaths.deaths {
                award_experience(death, &mut result.player_lines);
            }
            result.deaths = deaths.deaths;
            results.push(result);
        }

        // Deliver
        for result in &results {
            self.deliver(result);
        }

        // Effects
        for death in results.iter().flat_map(|r| r.deaths.iter()) {
            self.events.on_death(death);
        }

        let finished: Vec<FightId> = registry
            .ordered_fights()
            .into_iter()
            .filter(|id| registry.fights.get(id).is_some_and(|f| f.is_over()))
            .collect();
        summary.pruned = finished.len();
        for id in finished {
            registry.teardown(id);
        }

        debug!(
            fights = summary.fights,
            attacks = summary.attacks,
            deaths = summary.deaths,
            pruned = summary.pruned,
            "combat tick"
        );
        summary
    }

    /// Publish one fight's text: one message per player with anything to see
    fn deliver(&self, result: &FightResult) {
        if result.room_lines.is_empty() && result.player_lines.is_empty() {
            return;
        }

        let Some(room) = self.rooms.find_room(&result.zone_id, &result.room_id) else {
            debug!(zone = %result.zone_id, room = %result.room_id, "room not found, dropping combat text");
            return;
        };

        let mut recipients = room.players.clone();
        for player in result.player_lines.keys() {
            if !recipients.contains(player) {
                recipients.push(player.clone());
            }
        }

        for player in recipients {
            let mut lines: Vec<&str> = result.room_lines.iter().map(String::as_str).collect();
            if let Some(extra) = result.player_lines.get(&player) {
                lines.extend(extra.iter().map(String::as_str));
            }
            if lines.is_empty() {
                continue;
            }

            let mut text = lines.join("\n");
            text.push('\n');

            if let Err(e) = self
                .publisher
                .publish(PlayerGroup::Player(player.clone()), &[], text.as_bytes())
            {
                warn!(player = %player, error = %e, "failed to deliver combat text");
            }
        }
    }
}

/// Grant experience for a mob death to the players who fought it
fn award_experience(death: &DeathContext, player_lines: &mut BTreeMap<String, Vec<String>>) {
    let Some(mob) = death.victim.as_mob() else {
        return;
    };

    let players: Vec<_> = death
        .opponents
        .iter()
        .filter_map(Combatant::as_player)
        .collect();
    if players.is_empty() {
        return;
    }

    let participants: Vec<XpParticipant> = players
        .iter()
        .map(|p| XpParticipant::new(p.combat_id(), p.level(), death.damage_from(p.combat_id())))
        .collect();

    let base = base_experience(mob.level(), mob.exp_reward());
    let awards = calculate_xp_awards(mob.level(), base, &participants);

    for (player, award) in players.iter().zip(awards) {
        if award.amount == 0 {
            continue;
        }
        player.award_experience(award.amount);
        info!(player = player.combat_id(), amount = award.amount, victim = mob.combat_id(), "experience awarded");
        player_lines
            .entry(player.character_id())
            .or_default()
            .push(xp_line(award.amount));
    }
}
