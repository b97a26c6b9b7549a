//! Player-backed combatants
//!
//! A player's combat numbers are derived from their character sheet:
//! - AC = 10 + DEX modifier + equipment AC bonus
//! - one attack per wielded weapon (or an unarmed 1d2 punch)
//! - to-hit = STR modifier + half level + weapon hit bonus

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::combatant::Attack;
use super::dice::DiceRoll;

/// Damage of an empty-handed strike
pub const UNARMED_DAMAGE: DiceRoll = DiceRoll {
    count: 1,
    sides: 2,
    modifier: 0,
};

/// Standard ability modifier: floor((score - 10) / 2)
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Core ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(default = "default_score")]
    pub strength: i32,
    #[serde(default = "default_score")]
    pub dexterity: i32,
    #[serde(default = "default_score")]
    pub constitution: i32,
}

fn default_score() -> i32 {
    10
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
        }
    }
}

/// Equipment slots. Declaration order is attack order for wielded slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Head,
    Body,
    Hands,
    Feet,
}

impl EquipSlot {
    /// Whether an item in this slot is wielded
    pub fn is_wield(&self) -> bool {
        matches!(self, EquipSlot::MainHand | EquipSlot::OffHand)
    }
}

/// Offensive stats of a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: DiceRoll,
    #[serde(default)]
    pub hit_bonus: i32,
    #[serde(default)]
    pub damage_bonus: i32,
}

/// An equippable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub ac_bonus: i32,
    #[serde(default)]
    pub weapon: Option<WeaponStats>,
}

impl Item {
    /// A weapon with no AC contribution
    pub fn weapon(name: &str, damage: DiceRoll) -> Self {
        Self {
            name: name.to_string(),
            ac_bonus: 0,
            weapon: Some(WeaponStats {
                damage,
                hit_bonus: 0,
                damage_bonus: 0,
            }),
        }
    }

    /// A piece of armor
    pub fn armor(name: &str, ac_bonus: i32) -> Self {
        Self {
            name: name.to_string(),
            ac_bonus,
            weapon: None,
        }
    }
}

/// Items currently worn or wielded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an item in a slot, returning whatever was there
    pub fn equip(&mut self, slot: EquipSlot, item: Item) -> Option<Item> {
        self.slots.insert(slot, item)
    }

    /// Sum of AC bonuses over every equipped item
    pub fn ac_bonus(&self) -> i32 {
        self.slots.values().map(|i| i.ac_bonus).sum()
    }

    /// Wielded weapons in slot order
    pub fn wielded(&self) -> impl Iterator<Item = &WeaponStats> {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.is_wield())
            .filter_map(|(_, item)| item.weapon.as_ref())
    }
}

/// A player character sheet
#[derive(Debug, Clone)]
pub struct Character {
    /// Character ID (without the "player:" namespace)
    pub id: String,
    pub name: String,
    pub level: i32,
    pub abilities: AbilityScores,
    pub hp: i32,
    pub max_hp: i32,
    pub experience: u64,
    pub equipment: Equipment,
}

impl Character {
    /// Create a character with average abilities and level-scaled HP
    pub fn new(id: &str, name: &str, level: i32) -> Self {
        let max_hp = 10 + level.max(1) * 8;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            abilities: AbilityScores::default(),
            hp: max_hp,
            max_hp,
            experience: 0,
            equipment: Equipment::new(),
        }
    }

    /// Override both current and maximum HP
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_item(mut self, slot: EquipSlot, item: Item) -> Self {
        self.equipment.equip(slot, item);
        self
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

/// Live per-connection state
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub in_combat: bool,
}

/// Player character bridged into combat
#[derive(Debug, Clone)]
pub struct PlayerCombatant {
    combat_id: String,
    character: Arc<RwLock<Character>>,
    session: Arc<RwLock<SessionState>>,
}

impl PlayerCombatant {
    /// Wrap shared character and session handles
    pub fn new(character: Arc<RwLock<Character>>, session: Arc<RwLock<SessionState>>) -> Self {
        let combat_id = format!("player:{}", character.read().id);
        Self {
            combat_id,
            character,
            session,
        }
    }

    /// Wrap a standalone character with a fresh session
    pub fn from_character(character: Character) -> Self {
        Self::new(
            Arc::new(RwLock::new(character)),
            Arc::new(RwLock::new(SessionState::default())),
        )
    }

    pub fn combat_id(&self) -> &str {
        &self.combat_id
    }

    /// Character ID, as used for message delivery
    pub fn character_id(&self) -> String {
        self.character.read().id.clone()
    }

    pub fn character(&self) -> &Arc<RwLock<Character>> {
        &self.character
    }

    pub fn session(&self) -> &Arc<RwLock<SessionState>> {
        &self.session
    }

    pub fn combat_name(&self) -> String {
        self.character.read().name.clone()
    }

    pub fn is_alive(&self) -> bool {
        !self.character.read().is_dead()
    }

    pub fn ac(&self) -> i32 {
        let c = self.character.read();
        10 + ability_modifier(c.abilities.dexterity) + c.equipment.ac_bonus()
    }

    pub fn attacks(&self) -> Vec<Attack> {
        let c = self.character.read();
        let str_mod = ability_modifier(c.abilities.strength);
        let to_hit = str_mod + c.level / 2;

        let mut attacks: Vec<Attack> = c
            .equipment
            .wielded()
            .map(|w| Attack {
                modifier: to_hit + w.hit_bonus,
                damage_dice: w.damage.count,
                damage_sides: w.damage.sides,
                damage_mod: w.damage.modifier + str_mod + w.damage_bonus,
            })
            .collect();

        if attacks.is_empty() {
            let mut unarmed = Attack::new(to_hit, UNARMED_DAMAGE);
            unarmed.damage_mod += str_mod;
            attacks.push(unarmed);
        }

        attacks
    }

    /// Subtract HP, clamping at zero
    pub fn apply_damage(&self, amount: i32) {
        let mut c = self.character.write();
        c.hp = (c.hp - amount).max(0);
    }

    pub fn set_in_combat(&self, in_combat: bool) {
        self.session.write().in_combat = in_combat;
    }

    pub fn in_combat(&self) -> bool {
        self.session.read().in_combat
    }

    pub fn level(&self) -> i32 {
        self.character.read().level
    }

    pub fn hp(&self) -> i32 {
        self.character.read().hp
    }

    /// Add to the character's experience total
    pub fn award_experience(&self, amount: u32) {
        self.character.write().experience += u64::from(amount);
    }

    pub fn experience(&self) -> u64 {
        self.character.read().experience
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(12), 1);
        assert_eq!(ability_modifier(18), 4);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(3), -4);
    }

    #[test]
    fn test_ac_from_dex_and_armor() {
        let character = Character::new("1", "Brin", 1)
            .with_abilities(AbilityScores {
                dexterity: 14,
                ..Default::default()
            })
            .with_item(EquipSlot::Body, Item::armor("leather jerkin", 2))
            .with_item(EquipSlot::Head, Item::armor("iron cap", 1));
        let player = PlayerCombatant::from_character(character);
        assert_eq!(player.ac(), 10 + 2 + 3);
    }

    #[test]
    fn test_unarmed_fallback() {
        let player = PlayerCombatant::from_character(Character::new("1", "Brin", 4));
        let attacks = player.attacks();
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].modifier, 2);
        assert_eq!(attacks[0].damage_dice, 1);
        assert_eq!(attacks[0].damage_sides, 2);
        assert_eq!(attacks[0].damage_mod, 0);
    }

    #[test]
    fn test_dual_wield_attacks() {
        let mut sword = Item::weapon("longsword", DiceRoll::new(1, 8, 0));
        sword.weapon.as_mut().unwrap().hit_bonus = 1;
        let character = Character::new("1", "Brin", 6)
            .with_abilities(AbilityScores {
                strength: 16,
                ..Default::default()
            })
            .with_item(EquipSlot::OffHand, Item::weapon("dagger", DiceRoll::new(1, 4, 0)))
            .with_item(EquipSlot::MainHand, sword)
            .with_item(EquipSlot::Body, Item::armor("chain shirt", 4));
        let player = PlayerCombatant::from_character(character);

        let attacks = player.attacks();
        assert_eq!(attacks.len(), 2);
        // main hand first: STR +3, half level +3, weapon +1
        assert_eq!(attacks[0].modifier, 7);
        assert_eq!(attacks[0].damage_sides, 8);
        assert_eq!(attacks[0].damage_mod, 3);
        assert_eq!(attacks[1].modifier, 6);
        assert_eq!(attacks[1].damage_sides, 4);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let player = PlayerCombatant::from_character(Character::new("1", "Brin", 1).with_hp(5));
        player.apply_damage(3);
        assert_eq!(player.hp(), 2);
        assert!(player.is_alive());
        player.apply_damage(10);
        assert_eq!(player.hp(), 0);
        assert!(!player.is_alive());
    }

    #[test]
    fn test_session_flag_and_experience() {
        let player = PlayerCombatant::from_character(Character::new("7", "Brin", 1));
        assert_eq!(player.combat_id(), "player:7");
        assert!(!player.in_combat());
        player.set_in_combat(true);
        assert!(player.session().read().in_combat);
        player.award_experience(120);
        player.award_experience(5);
        assert_eq!(player.experience(), 125);
    }
}
