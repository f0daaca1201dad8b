//! Damage calculation context.
//!
//! The `AttackContext` struct gathers everything about one attack that does
//! not depend on randomness: the stat pair in play and the type matchup.

use crate::entities::Creature;
use crate::moves::{is_special_type, Move, MoveCategory};

use super::effectiveness::effectiveness_multiplier;
use super::formula;

/// Context for a single damage calculation.
#[derive(Clone, Debug)]
pub struct AttackContext<'a> {
    /// Move being used
    pub move_data: &'a Move,

    pub attacker: &'a Creature,

    pub defender: &'a Creature,

    pub category: MoveCategory,

    /// Attacker's attack or special-attack
    pub attack_stat: u16,

    /// Defender's defense or special-defense
    pub defense_stat: u16,

    /// Product of chart multipliers against every defending type
    pub effectiveness: f64,
}

impl<'a> AttackContext<'a> {
    pub fn new(move_data: &'a Move, attacker: &'a Creature, defender: &'a Creature) -> Self {
        let (attack_stat, defense_stat) = stat_pair(move_data, attacker, defender);
        Self {
            move_data,
            attacker,
            defender,
            category: move_data.category(),
            attack_stat,
            defense_stat,
            effectiveness: effectiveness_multiplier(move_data.move_type, &defender.types),
        }
    }

    /// Damage before type, critical and spread modifiers.
    pub fn base_damage(&self) -> f64 {
        formula::get_base_damage(
            self.attacker.level,
            self.move_data.power,
            self.attack_stat,
            self.defense_stat,
        )
    }

    /// `1 + level / 50`, for display.
    pub fn level_modifier(&self) -> f64 {
        formula::level_modifier(self.attacker.level)
    }
}

/// Special types use special-attack vs special-defense, everything else
/// attack vs defense. Status moves follow their type too; with zero power
/// the pair only matters for the zero-defense guard.
fn stat_pair(move_data: &Move, attacker: &Creature, defender: &Creature) -> (u16, u16) {
    if is_special_type(move_data.move_type) {
        (attacker.stats.special_attack, defender.stats.special_defense)
    } else {
        (attacker.stats.attack, defender.stats.defense)
    }
}
