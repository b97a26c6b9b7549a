//! A single engagement between two sides
//!
//! Each round every living fighter on side A, then side B, in join order,
//! swings every attack it has at its current target. Damage dealt is
//! accumulated in a per-fight attacker → victim ledger.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::combatant::Combatant;
use super::dice::{roll_attack_with, roll_damage_with};
use super::verbs::{attack_line, damage_verb};

/// Registry handle for a fight
pub type FightId = u64;

/// One of the two opposing teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// A combatant plus whoever it is currently swinging at
#[derive(Debug, Clone)]
pub struct Fighter {
    pub combatant: Combatant,
    /// May be unset or dead; re-resolved before acting
    pub target: Option<Combatant>,
}

impl Fighter {
    pub fn new(combatant: Combatant, target: Option<Combatant>) -> Self {
        Self { combatant, target }
    }

    pub fn combat_id(&self) -> &str {
        self.combatant.combat_id()
    }

    /// Whether the current target is set and alive
    pub fn has_live_target(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.is_alive())
    }
}

/// Output of one round of attacks
#[derive(Debug, Default)]
pub struct RoundReport {
    /// One line per attack, in resolution order
    pub lines: Vec<String>,
    /// Attacks rolled
    pub attacks: usize,
}

/// One engagement in one room
#[derive(Debug)]
pub struct Fight {
    pub id: FightId,
    pub zone_id: String,
    pub room_id: String,
    pub side_a: Vec<Fighter>,
    pub side_b: Vec<Fighter>,
    /// attacker id → victim id → cumulative damage
    damage: HashMap<String, HashMap<String, i32>>,
}

impl Fight {
    /// Open a fight with `attacker` on side A and `target` on side B,
    /// each targeting the other
    pub fn new(
        id: FightId,
        zone_id: &str,
        room_id: &str,
        attacker: Combatant,
        target: Combatant,
    ) -> Self {
        Self {
            id,
            zone_id: zone_id.to_string(),
            room_id: room_id.to_string(),
            side_a: vec![Fighter::new(attacker.clone(), Some(target.clone()))],
            side_b: vec![Fighter::new(target, Some(attacker))],
            damage: HashMap::new(),
        }
    }

    pub fn side(&self, side: Side) -> &Vec<Fighter> {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Vec<Fighter> {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    /// Which side a combatant is on, if any
    pub fn side_of(&self, combat_id: &str) -> Option<Side> {
        if self.side_a.iter().any(|f| f.combat_id() == combat_id) {
            Some(Side::A)
        } else if self.side_b.iter().any(|f| f.combat_id() == combat_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn fighter(&self, combat_id: &str) -> Option<&Fighter> {
        self.side_a
            .iter()
            .chain(self.side_b.iter())
            .find(|f| f.combat_id() == combat_id)
    }

    /// Append a fighter to a side, aimed at `target`
    pub fn join(&mut self, side: Side, combatant: Combatant, target: Combatant) {
        self.side_mut(side)
            .push(Fighter::new(combatant, Some(target)));
    }

    /// Remove a fighter from whichever side holds it
    pub fn remove(&mut self, combat_id: &str) -> Option<Fighter> {
        for side in [Side::A, Side::B] {
            let fighters = self.side_mut(side);
            if let Some(pos) = fighters.iter().position(|f| f.combat_id() == combat_id) {
                return Some(fighters.remove(pos));
            }
        }
        None
    }

    /// A fight with an empty side is finished
    pub fn is_over(&self) -> bool {
        self.side_a.is_empty() || self.side_b.is_empty()
    }

    /// Every combatant still on either side
    pub fn fighters(&self) -> impl Iterator<Item = &Fighter> {
        self.side_a.iter().chain(self.side_b.iter())
    }

    /// Damage taken by `victim`, keyed by attacker id
    pub fn damage_taken_by(&self, victim: &str) -> HashMap<String, i32> {
        self.damage
            .iter()
            .filter_map(|(attacker, victims)| {
                victims.get(victim).map(|dmg| (attacker.clone(), *dmg))
            })
            .collect()
    }

    fn record_damage(&mut self, attacker: &str, victim: &str, amount: i32) {
        *self
            .damage
            .entry(attacker.to_string())
            .or_default()
            .entry(victim.to_string())
            .or_insert(0) += amount;
    }

    /// Run one round of attacks with the thread-local rng
    pub fn process(&mut self) -> RoundReport {
        self.process_with(&mut rand::rng())
    }

    /// Run one round of attacks: side A first, then side B
    pub fn process_with(&mut self, rng: &mut impl Rng) -> RoundReport {
        let mut report = RoundReport::default();

        for side in [Side::A, Side::B] {
            for index in 0..self.side(side).len() {
                if !self.side(side)[index].combatant.is_alive() {
                    continue;
                }
                self.process_attacks(side, index, rng, &mut report);
            }
        }

        report
    }

    fn process_attacks(
        &mut self,
        side: Side,
        index: usize,
        rng: &mut impl Rng,
        report: &mut RoundReport,
    ) {
        let fighter = self.side(side)[index].clone();
        if !fighter.combatant.is_alive() {
            return;
        }

        let target = match fighter.target.filter(|t| t.is_alive()) {
            Some(t) => t,
            None => {
                let Some(t) = pick_living(self.side(side.opposite())) else {
                    return;
                };
                debug!(
                    fighter = fighter.combatant.combat_id(),
                    target = t.combat_id(),
                    "retargeted"
                );
                self.side_mut(side)[index].target = Some(t.clone());
                t
            }
        };

        let attacker_name = fighter.combatant.combat_name();
        let target_name = target.combat_name();

        for attack in fighter.combatant.attacks() {
            if !target.is_alive() {
                break;
            }

            report.attacks += 1;
            let roll = roll_attack_with(rng, attack.modifier);
            let damage = if roll >= target.ac() {
                let dmg =
                    roll_damage_with(rng, attack.damage_dice, attack.damage_sides, attack.damage_mod);
                target.apply_damage(dmg);
                self.record_damage(fighter.combatant.combat_id(), target.combat_id(), dmg);
                dmg
            } else {
                0
            };

            report
                .lines
                .push(attack_line(&attacker_name, damage_verb(damage), &target_name));
        }
    }
}

/// First living combatant on a side, in join order
pub fn pick_living(side: &[Fighter]) -> Option<Combatant> {
    side.iter()
        .find(|f| f.combatant.is_alive())
        .map(|f| f.combatant.clone())
}
