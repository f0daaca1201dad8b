//! Damage calculation.
//!
//! `resolve_attack` is the entry point: it rolls a critical hit and a spread
//! factor from the injected [`RandomSource`], then hands both to the
//! deterministic [`calculate_damage`].
//!
//! # Formula
//!
//! ```text
//! raw    = (((2 * Level / 5 + 2) * Power * Atk / Def) / 50 + 2)
//!          * Effectiveness * Critical * Spread
//! damage = max(1, floor(raw))
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use battle_engine::damage::resolve_attack;
//! use battle_engine::rng::SeededRandom;
//!
//! let mut rng = SeededRandom::new(42);
//! let outcome = resolve_attack(&thunderbolt, &pikachu, &gyarados, &mut rng);
//! assert!(outcome.damage >= 1);
//! ```

mod context;
mod effectiveness;
mod formula;

pub use context::AttackContext;
pub use effectiveness::{effectiveness_message, effectiveness_multiplier};
pub use formula::{
    crit_multiplier, finalize_damage, get_base_damage, is_critical_roll, level_modifier,
    spread_from_roll, CRIT_CHANCE, CRIT_MULTIPLIER, SPREAD_MAX, SPREAD_MIN,
};

use serde::{Deserialize, Serialize};

use crate::entities::Creature;
use crate::moves::Move;
use crate::rng::RandomSource;

/// Result of a damage calculation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Final damage, never below 1
    pub damage: u16,

    /// Whether the attack was a critical hit
    pub is_critical: bool,

    /// Type effectiveness multiplier (1.0 = neutral)
    pub effectiveness: f64,
}

/// The random inputs of one attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackRolls {
    pub is_critical: bool,

    /// Spread factor in `[0.85, 1.0]`
    pub spread: f64,
}

impl AttackRolls {
    /// Non-critical, full spread.
    pub const MAX_NEUTRAL: AttackRolls = AttackRolls {
        is_critical: false,
        spread: SPREAD_MAX,
    };

    /// Draw the critical roll, then the spread roll.
    pub fn roll<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let is_critical = is_critical_roll(rng.next_f64());
        let spread = spread_from_roll(rng.next_f64());
        Self {
            is_critical,
            spread,
        }
    }
}

/// Calculate damage for a context and fixed rolls.
pub fn calculate_damage(ctx: &AttackContext<'_>, rolls: AttackRolls) -> AttackOutcome {
    let raw = ctx.base_damage()
        * ctx.effectiveness
        * crit_multiplier(rolls.is_critical)
        * rolls.spread;

    AttackOutcome {
        damage: finalize_damage(raw),
        is_critical: rolls.is_critical,
        effectiveness: ctx.effectiveness,
    }
}

/// Resolve one attack with injected randomness.
///
/// Neither creature is modified.
pub fn resolve_attack<R: RandomSource + ?Sized>(
    move_data: &Move,
    attacker: &Creature,
    defender: &Creature,
    rng: &mut R,
) -> AttackOutcome {
    let ctx = AttackContext::new(move_data, attacker, defender);
    let rolls = AttackRolls::roll(rng);
    calculate_damage(&ctx, rolls)
}
