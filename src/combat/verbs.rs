//! Combat message vocabulary

/// Damage thresholds, ascending. The first entry whose max is >= the
/// damage dealt supplies the verb.
const DAMAGE_VERBS: &[(i32, &str)] = &[
    (0, "misses"),
    (2, "barely scratches"),
    (4, "scratches"),
    (6, "grazes"),
    (10, "hits"),
    (14, "injures"),
    (18, "wounds"),
    (22, "mauls"),
    (28, "decimates"),
    (35, "devastates"),
    (45, "maims"),
    (55, "MUTILATES"),
    (65, "DISEMBOWELS"),
    (80, "annihilates"),
];

/// Verb used once damage exceeds every threshold
const OVERKILL_VERB: &str = "does UNSPEAKABLE things to";

const RED_BOLD: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Map a damage amount to the verb shown to the room
pub fn damage_verb(damage: i32) -> &'static str {
    DAMAGE_VERBS
        .iter()
        .find(|(max, _)| *max >= damage)
        .map(|(_, verb)| *verb)
        .unwrap_or(OVERKILL_VERB)
}

/// Uppercase the first character
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One attack line, e.g. "A giant rat grazes Aldric!"
pub fn attack_line(attacker: &str, verb: &str, target: &str) -> String {
    format!("{} {} {}!", capitalize(attacker), verb, target)
}

/// The death announcement
pub fn rip_line(name: &str) -> String {
    format!("{}{} is dead! R.I.P.{}", RED_BOLD, capitalize(name), RESET)
}

/// Per-player experience notice
pub fn xp_line(amount: u32) -> String {
    format!("You receive {} experience points.", amount)
}
