//! Daemon configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `COMBATD_*` environment variables.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::combat::{AbilityScores, EquipSlot, Item, MobTemplate};

/// Default game round length
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2000;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COMBATD_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Milliseconds between combat rounds
    pub tick_interval_ms: u64,
    /// Stop after this many rounds (run until fights end if unset)
    pub max_ticks: Option<u64>,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Initial world contents
    pub world: WorldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_ticks: None,
            log_json: false,
            world: WorldConfig::default(),
        }
    }
}

/// Rooms, mobs and players to seed the simulation with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
    #[serde(default)]
    pub mobs: Vec<MobTemplate>,
    #[serde(default)]
    pub spawns: Vec<SpawnConfig>,
    #[serde(default)]
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub engagements: Vec<EngagementConfig>,
}

/// A location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub zone: String,
    pub room: String,
}

/// A mob placed in a room; `key` names it for engagements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub key: String,
    /// Template ID from `mobs`
    pub template: String,
    pub zone: String,
    pub room: String,
}

/// A player character placed in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub id: String,
    pub name: String,
    pub level: i32,
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Defaults to the level-derived maximum
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub equipment: BTreeMap<EquipSlot, Item>,
    pub zone: String,
    pub room: String,
}

/// A fight to start at boot. Names are player IDs or spawn keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementConfig {
    pub attacker: String,
    pub target: String,
}

impl Config {
    /// Load configuration, reading `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;

        if config.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be greater than zero");
        }

        Ok(config)
    }
}
