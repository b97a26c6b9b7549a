//! Experience rewards for mob kills
//!
//! Awards are shaped by two factors:
//! - a group divisor, so splitting a kill N ways is not free
//! - a level multiplier against the *effective group level*, the
//!   damage-weighted mean level of everyone involved
//!
//! Because the effective level is damage weighted, a high-level ally who
//! does most of the work drags everyone's reward toward zero.

/// A player who took part in a kill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpParticipant {
    pub combat_id: String,
    pub level: i32,
    /// Damage this participant dealt to the victim
    pub damage: i32,
}

impl XpParticipant {
    pub fn new(combat_id: &str, level: i32, damage: i32) -> Self {
        Self {
            combat_id: combat_id.to_string(),
            level,
            damage,
        }
    }
}

/// Experience granted to one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpAward {
    pub combat_id: String,
    pub amount: u32,
}

/// Extra divisor weight per additional group member
const GROUP_PENALTY_PER_MEMBER: f64 = 0.5;

/// Multiplier gained per level the mob is above the group
const PUNCH_UP_BONUS_PER_LEVEL: f64 = 0.1;

/// Ceiling on the punch-up bonus
const MAX_LEVEL_MULTIPLIER: f64 = 1.5;

/// Multiplier lost per level the mob is below the group; zero at 5 below
const PUNCH_DOWN_PENALTY_PER_LEVEL: f64 = 0.2;

/// Absorbs float error so exact products don't floor one short
const FLOOR_EPSILON: f64 = 1e-9;

/// Base reward: the configured value, or `50 + level² · 10` when unset
pub fn base_experience(mob_level: i32, configured: u32) -> u32 {
    if configured > 0 {
        return configured;
    }
    let level = i64::from(mob_level.max(0));
    (50 + level * level * 10).min(i64::from(u32::MAX)) as u32
}

/// `1.0` solo, `1.0 + 0.5·(N-1)` for N participants
pub fn group_divisor(participants: usize) -> f64 {
    if participants <= 1 {
        1.0
    } else {
        1.0 + GROUP_PENALTY_PER_MEMBER * (participants - 1) as f64
    }
}

/// Damage-weighted mean level. Falls back to the plain mean when nobody
/// landed a hit.
pub fn effective_group_level(participants: &[XpParticipant]) -> f64 {
    if participants.is_empty() {
        return 0.0;
    }

    let total_damage: i64 = participants.iter().map(|p| i64::from(p.damage.max(0))).sum();
    if total_damage == 0 {
        let sum: f64 = participants.iter().map(|p| f64::from(p.level)).sum();
        return sum / participants.len() as f64;
    }

    participants
        .iter()
        .map(|p| f64::from(p.level) * f64::from(p.damage.max(0)))
        .sum::<f64>()
        / total_damage as f64
}

/// Reward multiplier for a mob `mob_level` fought by a group of
/// `effective_level`
pub fn level_multiplier(mob_level: i32, effective_level: f64) -> f64 {
    let diff = f64::from(mob_level) - effective_level;
    if diff >= 0.0 {
        (1.0 + PUNCH_UP_BONUS_PER_LEVEL * diff).min(MAX_LEVEL_MULTIPLIER)
    } else {
        (1.0 + PUNCH_DOWN_PENALTY_PER_LEVEL * diff).max(0.0)
    }
}

/// Split a kill's experience among its participants.
///
/// Every participant gets `floor(base · multiplier / divisor)`, at least 1
/// unless the multiplier is zero. A kill nobody landed a hit on pays
/// nothing. Output order matches input order.
pub fn calculate_xp_awards(
    mob_level: i32,
    base_exp: u32,
    participants: &[XpParticipant],
) -> Vec<XpAward> {
    if participants.is_empty() {
        return Vec::new();
    }

    let earned = participants.iter().any(|p| p.damage > 0);
    let multiplier = level_multiplier(mob_level, effective_group_level(participants));
    let divisor = group_divisor(participants.len());

    let amount = if earned && multiplier > 0.0 {
        let raw = f64::from(base_exp) * multiplier / divisor;
        ((raw + FLOOR_EPSILON).floor() as u32).max(1)
    } else {
        0
    };

    participants
        .iter()
        .map(|p| XpAward {
            combat_id: p.combat_id.clone(),
            amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_experience() {
        assert_eq!(base_experience(5, 0), 300);
        assert_eq!(base_experience(1, 0), 60);
        assert_eq!(base_experience(0, 0), 50);
        assert_eq!(base_experience(5, 123), 123);
    }

    #[test]
    fn test_group_divisor() {
        assert_eq!(group_divisor(1), 1.0);
        assert_eq!(group_divisor(2), 1.5);
        assert_eq!(group_divisor(4), 2.5);
    }

    #[test]
    fn test_effective_level_is_damage_weighted() {
        let group = [
            XpParticipant::new("player:low", 5, 10),
            XpParticipant::new("player:high", 20, 90),
        ];
        let eff = effective_group_level(&group);
        assert!((eff - 18.5).abs() < 1e-9);

        let idle = [
            XpParticipant::new("player:a", 4, 0),
            XpParticipant::new("player:b", 8, 0),
        ];
        assert!((effective_group_level(&idle) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_multiplier_curve() {
        assert_eq!(level_multiplier(5, 5.0), 1.0);
        assert!(level_multiplier(8, 5.0) > 1.0);
        assert_eq!(level_multiplier(30, 5.0), MAX_LEVEL_MULTIPLIER);
        assert!(level_multiplier(3, 5.0) < 1.0);
        assert_eq!(level_multiplier(5, 10.0), 0.0);
        assert_eq!(level_multiplier(1, 40.0), 0.0);
    }

    #[test]
    fn test_solo_even_level_gets_base() {
        let awards = calculate_xp_awards(5, 300, &[XpParticipant::new("player:1", 5, 40)]);
        assert_eq!(
            awards,
            vec![XpAward {
                combat_id: "player:1".to_string(),
                amount: 300
            }]
        );
    }

    #[test]
    fn test_power_leveling_is_suppressed() {
        let base = 300;
        let awards = calculate_xp_awards(
            5,
            base,
            &[
                XpParticipant::new("player:low", 5, 10),
                XpParticipant::new("player:high", 20, 90),
            ],
        );
        assert_eq!(awards.len(), 2);
        for award in &awards {
            assert!(award.amount < base / 2, "{:?} not suppressed", award);
        }
    }

    #[test]
    fn test_even_group_split() {
        let awards = calculate_xp_awards(
            5,
            300,
            &[
                XpParticipant::new("player:a", 5, 20),
                XpParticipant::new("player:b", 5, 20),
            ],
        );
        assert!(awards.iter().all(|a| a.amount == 200));
    }

    #[test]
    fn test_punching_up_bonus() {
        let awards = calculate_xp_awards(8, 100, &[XpParticipant::new("player:1", 5, 1)]);
        assert_eq!(awards[0].amount, 130);
    }

    #[test]
    fn test_minimum_one_when_nonzero() {
        // mob 4 levels under: multiplier 0.2, base 1
        let awards = calculate_xp_awards(1, 1, &[XpParticipant::new("player:1", 5, 3)]);
        assert_eq!(awards[0].amount, 1);
    }

    #[test]
    fn test_no_damage_no_reward() {
        let awards = calculate_xp_awards(
            5,
            300,
            &[
                XpParticipant::new("player:a", 5, 0),
                XpParticipant::new("player:b", 5, 0),
            ],
        );
        assert_eq!(awards.len(), 2);
        assert!(awards.iter().all(|a| a.amount == 0));
    }

    #[test]
    fn test_no_participants() {
        assert!(calculate_xp_awards(5, 300, &[]).is_empty());
    }
}
