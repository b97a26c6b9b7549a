//! Dice rolling
//!
//! Attack rolls (d20 + modifier), damage rolls (NdS + modifier, never
//! below 1) and dice notation like "2d6+3" for mob definitions.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A parsed dice roll specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i32,
}

impl DiceRoll {
    /// Create a new dice roll
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }
}

impl FromStr for DiceRoll {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

impl Serialize for DiceRoll {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DiceRoll {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_dice(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse_dice(notation: &str) -> Result<DiceRoll, String> {
    let notation = notation.trim().to_lowercase();

    let d_pos = notation.find('d').ok_or("Missing 'd' in dice notation")?;

    // "d6" means "1d6"
    let count_str = &notation[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse()
            .map_err(|_| format!("Invalid dice count: {}", count_str))?
    };

    let rest = &notation[d_pos + 1..];

    let (sides_str, modifier) = if let Some(plus_pos) = rest.find('+') {
        let mod_str = &rest[plus_pos + 1..];
        let modifier: i32 = mod_str
            .parse()
            .map_err(|_| format!("Invalid modifier: {}", mod_str))?;
        (&rest[..plus_pos], modifier)
    } else if let Some(minus_pos) = rest.rfind('-').filter(|&p| p > 0) {
        // includes the minus sign
        let mod_str = &rest[minus_pos..];
        let modifier: i32 = mod_str
            .parse()
            .map_err(|_| format!("Invalid modifier: {}", mod_str))?;
        (&rest[..minus_pos], modifier)
    } else {
        (rest, 0)
    };

    let sides: u32 = sides_str
        .parse()
        .map_err(|_| format!("Invalid die sides: {}", sides_str))?;

    if sides == 0 {
        return Err("Die sides must be at least 1".to_string());
    }

    Ok(DiceRoll {
        count,
        sides,
        modifier,
    })
}

/// Roll a d20 and add `modifier`
pub fn roll_attack(modifier: i32) -> i32 {
    roll_attack_with(&mut rand::rng(), modifier)
}

/// Attack roll with a caller-supplied rng
pub fn roll_attack_with(rng: &mut impl Rng, modifier: i32) -> i32 {
    rng.random_range(1..=20) + modifier
}

/// Roll `dice` dice of `sides` sides plus `modifier`, never less than 1.
///
/// A hit always deals at least one point regardless of modifiers.
pub fn roll_damage(dice: u32, sides: u32, modifier: i32) -> i32 {
    roll_damage_with(&mut rand::rng(), dice, sides, modifier)
}

/// Damage roll with a caller-supplied rng
pub fn roll_damage_with(rng: &mut impl Rng, dice: u32, sides: u32, modifier: i32) -> i32 {
    let sides = sides.max(1);
    let mut total: i32 = 0;

    for _ in 0..dice {
        total += rng.random_range(1..=sides) as i32;
    }

    (total + modifier).max(1)
}
