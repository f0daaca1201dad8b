//! Creature and move builders shared by the integration tests.

use battle_engine::catalog::CreatureDefinition;
use battle_engine::entities::{BaseStats, Creature, CreatureConfig};
use battle_engine::moves::Move;
use battle_engine::types::Type;

/// Stats that make a level 50, power 50 neutral physical hit deal 40.
pub const FORTY_DAMAGE_STATS: BaseStats = BaseStats::new(95, 55, 95, 55, 50, 50);

/// Four moves: two power-50 normal hits, a status move and a water move.
pub fn standard_moves() -> Vec<Move> {
    vec![
        Move::new("tackle", "Tackle", Type::Normal, 50),
        Move::new("growl", "Growl", Type::Normal, 0),
        Move::new("slam", "Slam", Type::Normal, 50),
        Move::new("water-gun", "Water Gun", Type::Water, 40),
    ]
}

/// Build a creature with the given move leading the loadout and fillers
/// for the other three slots.
pub fn creature_with_move(
    name: &str,
    level: u8,
    types: &[Type],
    stats: BaseStats,
    lead: Move,
) -> Creature {
    let mut moves = vec![lead];
    moves.extend(
        [
            Move::new("filler-1", "Filler 1", Type::Normal, 10),
            Move::new("filler-2", "Filler 2", Type::Normal, 10),
            Move::new("filler-3", "Filler 3", Type::Normal, 10),
        ]
        .into_iter(),
    );
    CreatureConfig::new(name.to_lowercase())
        .name(name)
        .level(level)
        .types(types.iter().copied())
        .stats(stats)
        .moves(moves)
        .expect("four moves")
        .build()
        .expect("valid creature")
}

/// Level 50 normal-type creature using [`standard_moves`].
pub fn brawler(name: &str) -> Creature {
    CreatureConfig::new(name.to_lowercase())
        .name(name)
        .level(50)
        .types([Type::Normal])
        .stats(FORTY_DAMAGE_STATS)
        .moves(standard_moves())
        .expect("four moves")
        .build()
        .expect("valid creature")
}

/// Catalog definition matching [`brawler`], with learn levels.
pub fn brawler_definition(id: &str, name: &str) -> CreatureDefinition {
    CreatureDefinition {
        id: id.to_string(),
        name: name.to_string(),
        level: 50,
        types: vec![Type::Normal],
        stats: FORTY_DAMAGE_STATS,
        moves: standard_moves()
            .into_iter()
            .enumerate()
            .map(|(i, m)| m.learned_at(i as u8 * 5 + 1))
            .chain(std::iter::once(
                Move::new("hyper-beam", "Hyper Beam", Type::Normal, 150).learned_at(60),
            ))
            .collect(),
        loadout: None,
    }
}
