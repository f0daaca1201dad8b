//! Type effectiveness across every defending type.

use crate::types::{type_effectiveness, Type};

/// Product of the chart multipliers of `move_type` against each defending type.
///
/// Missing chart entries count as 1.0, so `Type::Unknown` on either side is
/// neutral and an empty type list gives 1.0.
pub fn effectiveness_multiplier(move_type: Type, defender_types: &[Type]) -> f64 {
    defender_types
        .iter()
        .map(|&defender| type_effectiveness(move_type, defender).multiplier())
        .product()
}

/// Battle message for an effectiveness multiplier, `None` when neutral.
pub fn effectiveness_message(effectiveness: f64) -> Option<&'static str> {
    if effectiveness > 1.0 {
        Some("It's super effective!")
    } else if effectiveness < 1.0 {
        Some("It's not very effective...")
    } else {
        None
    }
}
