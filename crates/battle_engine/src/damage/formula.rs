//! Core damage formula and roll math.
//!
//! All arithmetic is floating point with a single floor at the end, which
//! is what the battle screen has always shown players.

/// Probability that an attack lands a critical hit (1/16).
pub const CRIT_CHANCE: f64 = 1.0 / 16.0;

/// Damage multiplier applied on a critical hit.
pub const CRIT_MULTIPLIER: f64 = 1.5;

/// Lowest random spread factor.
pub const SPREAD_MIN: f64 = 0.85;

/// Highest random spread factor.
pub const SPREAD_MAX: f64 = 1.0;

/// Calculate base damage before type, critical and spread modifiers.
///
/// Formula: `((2 * Level / 5 + 2) * Power * Attack / Defense) / 50 + 2`
///
/// Nothing is truncated here. A defense of 0 counts as 1.
///
/// # Arguments
/// * `level` - Attacker's level (1-100)
/// * `power` - Move's base power
/// * `attack` - Attacking stat
/// * `defense` - Defending stat
pub fn get_base_damage(level: u8, power: u16, attack: u16, defense: u16) -> f64 {
    let defense = f64::from(defense.max(1));

    // Level factor: 2 * level / 5 + 2
    let level_factor = 2.0 * f64::from(level) / 5.0 + 2.0;

    (level_factor * f64::from(power) * f64::from(attack) / defense) / 50.0 + 2.0
}

/// Display-only level modifier `1 + level / 50`.
///
/// The formula above already scales with level; this value is never
/// multiplied into damage.
#[inline]
pub fn level_modifier(level: u8) -> f64 {
    1.0 + f64::from(level) / 50.0
}

/// Whether a uniform roll in `[0, 1)` is a critical hit.
#[inline]
pub fn is_critical_roll(roll: f64) -> bool {
    roll < CRIT_CHANCE
}

/// Multiplier for a critical flag.
#[inline]
pub fn crit_multiplier(is_critical: bool) -> f64 {
    if is_critical {
        CRIT_MULTIPLIER
    } else {
        1.0
    }
}

/// Map a uniform roll in `[0, 1)` onto the spread range `(0.85, 1.0]`.
///
/// A roll of 0 gives the full-damage spread of 1.0.
#[inline]
pub fn spread_from_roll(roll: f64) -> f64 {
    SPREAD_MAX - roll * (SPREAD_MAX - SPREAD_MIN)
}

/// Floor the raw damage and clamp it to `1..=u16::MAX`.
#[inline]
pub fn finalize_damage(raw: f64) -> u16 {
    let floored = raw.floor();
    if floored.is_nan() || floored < 1.0 {
        1
    } else if floored >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        floored as u16
    }
}
