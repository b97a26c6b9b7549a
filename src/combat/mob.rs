//! Mob-backed combatants
//!
//! Mob stats come straight from the static template. Each spawned
//! instance gets its own UUID and HP pool.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::combatant::Attack;
use super::dice::DiceRoll;

/// Static mob definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobTemplate {
    pub id: String,
    pub name: String,
    pub level: i32,
    #[serde(default = "default_ac")]
    pub armor_class: i32,
    #[serde(default)]
    pub hit_modifier: i32,
    /// Damage in dice notation, e.g. "1d6+1"
    pub damage: DiceRoll,
    pub max_hp: i32,
    /// XP granted on kill; 0 means derive from level
    #[serde(default)]
    pub exp_reward: u32,
}

fn default_ac() -> i32 {
    10
}

impl MobTemplate {
    pub fn new(id: &str, name: &str, level: i32, max_hp: i32, damage: DiceRoll) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            armor_class: default_ac(),
            hit_modifier: 0,
            damage,
            max_hp,
            exp_reward: 0,
        }
    }

    pub fn with_armor_class(mut self, ac: i32) -> Self {
        self.armor_class = ac;
        self
    }

    pub fn with_hit_modifier(mut self, modifier: i32) -> Self {
        self.hit_modifier = modifier;
        self
    }

    pub fn with_exp_reward(mut self, exp: u32) -> Self {
        self.exp_reward = exp;
        self
    }

    /// Spawn a fresh instance at full HP
    pub fn spawn(self: &Arc<Self>) -> MobCombatant {
        MobCombatant::new(MobInstance::new(self.clone()))
    }
}

/// A live mob in the world
#[derive(Debug, Clone)]
pub struct MobInstance {
    pub instance_id: String,
    pub template: Arc<MobTemplate>,
    pub hp: i32,
    pub in_combat: bool,
}

impl MobInstance {
    pub fn new(template: Arc<MobTemplate>) -> Self {
        Self {
            instance_id: uuid::Uuid::new_v4().to_string(),
            hp: template.max_hp,
            template,
            in_combat: false,
        }
    }
}

/// Mob instance bridged into combat
#[derive(Debug, Clone)]
pub struct MobCombatant {
    combat_id: String,
    instance: Arc<RwLock<MobInstance>>,
}

impl MobCombatant {
    pub fn new(instance: MobInstance) -> Self {
        Self {
            combat_id: format!("mob:{}", instance.instance_id),
            instance: Arc::new(RwLock::new(instance)),
        }
    }

    pub fn combat_id(&self) -> &str {
        &self.combat_id
    }

    pub fn combat_name(&self) -> String {
        self.instance.read().template.name.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.instance.read().hp > 0
    }

    pub fn ac(&self) -> i32 {
        self.instance.read().template.armor_class
    }

    /// Mobs currently strike exactly once per round
    pub fn attacks(&self) -> Vec<Attack> {
        let inst = self.instance.read();
        vec![Attack::new(inst.template.hit_modifier, inst.template.damage)]
    }

    /// Subtract HP, clamping at zero
    pub fn apply_damage(&self, amount: i32) {
        let mut inst = self.instance.write();
        inst.hp = (inst.hp - amount).max(0);
    }

    pub fn set_in_combat(&self, in_combat: bool) {
        self.instance.write().in_combat = in_combat;
    }

    pub fn in_combat(&self) -> bool {
        self.instance.read().in_combat
    }

    pub fn level(&self) -> i32 {
        self.instance.read().template.level
    }

    pub fn hp(&self) -> i32 {
        self.instance.read().hp
    }

    /// Configured kill reward (0 = derive from level)
    pub fn exp_reward(&self) -> u32 {
        self.instance.read().template.exp_reward
    }
}
