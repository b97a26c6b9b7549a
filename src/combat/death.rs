//! Death detection and the snapshots handed to death handlers

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use super::combatant::{Combatant, CombatantKind};
use super::fight::{pick_living, Fight, FightId, Side};
use super::verbs::rip_line;

/// Immutable snapshot of one death, taken before the victim is removed
#[derive(Debug, Clone)]
pub struct DeathContext {
    pub victim: Combatant,
    pub zone_id: String,
    pub room_id: String,
    /// Everyone on the opposing side at the moment of death
    pub opponents: Vec<Combatant>,
    /// Damage dealt to the victim over the fight, by attacker id
    pub damage_by: HashMap<String, i32>,
}

/// Loggable summary of a death
#[derive(Debug, Clone, Serialize)]
pub struct DeathRecord {
    pub victim_id: String,
    pub victim_name: String,
    pub victim_kind: &'static str,
    pub zone_id: String,
    pub room_id: String,
    pub opponents: Vec<String>,
    pub damage_by: HashMap<String, i32>,
}

impl DeathContext {
    pub fn record(&self) -> DeathRecord {
        DeathRecord {
            victim_id: self.victim.combat_id().to_string(),
            victim_name: self.victim.combat_name(),
            victim_kind: match self.victim.kind() {
                CombatantKind::Player => "player",
                CombatantKind::Mob => "mob",
            },
            zone_id: self.zone_id.clone(),
            room_id: self.room_id.clone(),
            opponents: self
                .opponents
                .iter()
                .map(|c| c.combat_id().to_string())
                .collect(),
            damage_by: self.damage_by.clone(),
        }
    }

    /// Total damage attributed to one attacker
    pub fn damage_from(&self, combat_id: &str) -> i32 {
        self.damage_by.get(combat_id).copied().unwrap_or(0)
    }
}

/// R.I.P. lines for the room plus the deaths to hand off later
#[derive(Debug, Default)]
pub struct DeathReport {
    pub lines: Vec<String>,
    pub deaths: Vec<DeathContext>,
}

impl Fight {
    /// Remove dead fighters after a round.
    ///
    /// Dead combatants leave their side and `registry`. If a side empties,
    /// every survivor is released as well and both sides are cleared so
    /// the fight gets pruned. Otherwise survivors that lost their target
    /// are re-aimed at the first living opponent.
    pub fn resolve_deaths(&mut self, registry: &mut HashMap<String, FightId>) -> DeathReport {
        let mut dead: Vec<(Combatant, Side)> = Vec::new();
        for side in [Side::A, Side::B] {
            for fighter in self.side(side) {
                if !fighter.combatant.is_alive() {
                    dead.push((fighter.combatant.clone(), side));
                }
            }
        }

        if dead.is_empty() {
            return DeathReport::default();
        }

        let snapshot_a: Vec<Combatant> = self.side_a.iter().map(|f| f.combatant.clone()).collect();
        let snapshot_b: Vec<Combatant> = self.side_b.iter().map(|f| f.combatant.clone()).collect();

        let mut report = DeathReport::default();

        for (victim, _) in &dead {
            report.lines.push(rip_line(&victim.combat_name()));
            self.remove(victim.combat_id());
            victim.set_in_combat(false);
            registry.remove(victim.combat_id());
            info!(
                victim = victim.combat_id(),
                zone = %self.zone_id,
                room = %self.room_id,
                "combatant died"
            );
        }

        if self.is_over() {
            for fighter in self.side_a.drain(..).chain(self.side_b.drain(..)) {
                fighter.combatant.set_in_combat(false);
                registry.remove(fighter.combatant.combat_id());
            }
        } else {
            for side in [Side::A, Side::B] {
                let replacement = pick_living(self.side(side.opposite()));
                for fighter in self.side_mut(side).iter_mut() {
                    if !fighter.has_live_target() {
                        fighter.target = replacement.clone();
                    }
                }
            }
        }

        for (victim, side) in dead {
            let opponents = match side {
                Side::A => snapshot_b.clone(),
                Side::B => snapshot_a.clone(),
            };
            report.deaths.push(DeathContext {
                damage_by: self.damage_taken_by(victim.combat_id()),
                victim,
                zone_id: self.zone_id.clone(),
                room_id: self.room_id.clone(),
                opponents,
            });
        }

        report
    }
}
