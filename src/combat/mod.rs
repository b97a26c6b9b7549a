//! Combat system module
//!
//! Resolves every melee engagement in the world, one round per tick:
//! - Dice rolling (d20 to-hit, NdS damage)
//! - Player and mob combatant adapters
//! - Fights with two opposing sides and a damage ledger
//! - Death detection and deferred death handling
//! - Anti-power-leveling experience awards

mod combatant;
mod death;
mod dice;
mod events;
mod fight;
mod manager;
mod mob;
mod player;
mod verbs;
mod xp;

pub use combatant::{Attack, Combatant, CombatantKind};
pub use death::{DeathContext, DeathRecord, DeathReport};
pub use dice::{
    parse_dice, roll_attack, roll_attack_with, roll_damage, roll_damage_with, DiceRoll,
};
pub use events::{EventHandler, PlayerGroup, PublishError, Publisher, RoomLocator, RoomView};
pub use fight::{pick_living, Fight, FightId, Fighter, RoundReport, Side};
pub use manager::{CombatError, CombatManager, TickSummary};
pub use mob::{MobCombatant, MobInstance, MobTemplate};
pub use player::{
    ability_modifier, AbilityScores, Character, EquipSlot, Equipment, Item, PlayerCombatant,
    SessionState, WeaponStats,
};
pub use verbs::{capitalize, damage_verb};
pub use xp::{
    base_experience, calculate_xp_awards, effective_group_level, group_divisor, level_multiplier,
    XpAward, XpParticipant,
};
