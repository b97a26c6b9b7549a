//! The combat-facing view of anything that can fight
//!
//! Players and mobs are bridged through [`Combatant`], a closed sum type.
//! Death and XP handling dispatch on [`Combatant::kind`].

use super::dice::DiceRoll;
use super::mob::MobCombatant;
use super::player::PlayerCombatant;

/// One strike a combatant can make per round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attack {
    /// Added to the d20 attack roll
    pub modifier: i32,
    /// Number of damage dice
    pub damage_dice: u32,
    /// Sides per damage die
    pub damage_sides: u32,
    /// Added to the damage roll
    pub damage_mod: i32,
}

impl Attack {
    /// Build an attack from a to-hit modifier and damage dice
    pub fn new(modifier: i32, damage: DiceRoll) -> Self {
        Self {
            modifier,
            damage_dice: damage.count,
            damage_sides: damage.sides,
            damage_mod: damage.modifier,
        }
    }
}

/// Which concrete entity backs a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatantKind {
    Player,
    Mob,
}

/// Anything that can take part in a fight
#[derive(Debug, Clone)]
pub enum Combatant {
    Player(PlayerCombatant),
    Mob(MobCombatant),
}

impl Combatant {
    /// Globally unique, namespaced id ("player:<id>" or "mob:<instance>")
    pub fn combat_id(&self) -> &str {
        match self {
            Combatant::Player(p) => p.combat_id(),
            Combatant::Mob(m) => m.combat_id(),
        }
    }

    /// Display name used in combat messages
    pub fn combat_name(&self) -> String {
        match self {
            Combatant::Player(p) => p.combat_name(),
            Combatant::Mob(m) => m.combat_name(),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Combatant::Player(p) => p.is_alive(),
            Combatant::Mob(m) => m.is_alive(),
        }
    }

    /// Armor class
    pub fn ac(&self) -> i32 {
        match self {
            Combatant::Player(p) => p.ac(),
            Combatant::Mob(m) => m.ac(),
        }
    }

    /// Attacks available this round, in resolution order
    pub fn attacks(&self) -> Vec<Attack> {
        match self {
            Combatant::Player(p) => p.attacks(),
            Combatant::Mob(m) => m.attacks(),
        }
    }

    pub fn apply_damage(&self, amount: i32) {
        match self {
            Combatant::Player(p) => p.apply_damage(amount),
            Combatant::Mob(m) => m.apply_damage(amount),
        }
    }

    pub fn set_in_combat(&self, in_combat: bool) {
        match self {
            Combatant::Player(p) => p.set_in_combat(in_combat),
            Combatant::Mob(m) => m.set_in_combat(in_combat),
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            Combatant::Player(p) => p.level(),
            Combatant::Mob(m) => m.level(),
        }
    }

    pub fn kind(&self) -> CombatantKind {
        match self {
            Combatant::Player(_) => CombatantKind::Player,
            Combatant::Mob(_) => CombatantKind::Mob,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerCombatant> {
        match self {
            Combatant::Player(p) => Some(p),
            Combatant::Mob(_) => None,
        }
    }

    pub fn as_mob(&self) -> Option<&MobCombatant> {
        match self {
            Combatant::Mob(m) => Some(m),
            Combatant::Player(_) => None,
        }
    }

    /// Identity comparison by combat id
    pub fn is(&self, other: &Combatant) -> bool {
        self.combat_id() == other.combat_id()
    }
}

impl From<PlayerCombatant> for Combatant {
    fn from(p: PlayerCombatant) -> Self {
        Combatant::Player(p)
    }
}

impl From<MobCombatant> for Combatant {
    fn from(m: MobCombatant) -> Self {
        Combatant::Mob(m)
    }
}
