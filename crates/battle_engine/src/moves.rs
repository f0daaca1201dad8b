//! Moves, four-move loadouts, and the loadout picker.
//!
//! A creature fights with exactly [`MAX_MOVES`] moves. [`Loadout`] can only be
//! built with four moves, and selections address it through [`MoveSlot`], so a
//! move outside the loadout cannot be chosen.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Type;

/// Number of move slots per creature
pub const MAX_MOVES: usize = 4;

/// Types whose moves hit with special-attack against special-defense.
pub const SPECIAL_TYPES: [Type; 7] = [
    Type::Psychic,
    Type::Fire,
    Type::Water,
    Type::Grass,
    Type::Electric,
    Type::Ice,
    Type::Dragon,
];

/// Which stat pair a move uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// A move as supplied by the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    /// 0 = status move
    #[serde(default)]
    pub power: u16,
    /// Reserved; the damage formula ignores it
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    #[serde(default)]
    pub level_learned: u8,
}

fn default_accuracy() -> u8 {
    100
}

impl Move {
    pub fn new(id: impl Into<String>, name: impl Into<String>, move_type: Type, power: u16) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            move_type,
            power,
            accuracy: default_accuracy(),
            level_learned: 0,
        }
    }

    /// Set the level at which the move is learned
    pub fn learned_at(mut self, level: u8) -> Self {
        self.level_learned = level;
        self
    }

    /// Set accuracy (clamped to 0-100)
    pub fn accuracy(mut self, accuracy: u8) -> Self {
        self.accuracy = accuracy.min(100);
        self
    }

    /// Category is decided by power and type alone.
    pub fn category(&self) -> MoveCategory {
        if self.power == 0 {
            MoveCategory::Status
        } else if is_special_type(self.move_type) {
            MoveCategory::Special
        } else {
            MoveCategory::Physical
        }
    }

    /// Whether a creature of `level` can know this move
    #[inline]
    pub fn is_learnable_at(&self, level: u8) -> bool {
        self.level_learned <= level
    }
}

/// Whether moves of this type use the special stat pair
#[inline]
pub fn is_special_type(move_type: Type) -> bool {
    SPECIAL_TYPES.contains(&move_type)
}

/// Filter a move pool down to the moves learnable at `level`.
pub fn learnable_moves(pool: &[Move], level: u8) -> Vec<Move> {
    pool.iter()
        .filter(|m| m.is_learnable_at(level))
        .cloned()
        .collect()
}

// ============================================================================
// Loadout
// ============================================================================

/// Index into a four-move loadout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoveSlot(u8);

impl MoveSlot {
    pub const ALL: [MoveSlot; MAX_MOVES] = [MoveSlot(0), MoveSlot(1), MoveSlot(2), MoveSlot(3)];

    /// Slot for a raw index, `None` if out of range
    pub const fn new(index: usize) -> Option<Self> {
        if index < MAX_MOVES {
            Some(MoveSlot(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadoutError {
    #[error("a loadout needs exactly 4 moves, got {0}")]
    WrongMoveCount(usize),

    #[error("move {0} is not in the move pool")]
    UnknownMove(String),

    #[error("move {0} was chosen twice")]
    DuplicateMove(String),
}

/// Exactly four moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Move>", into = "Vec<Move>")]
pub struct Loadout([Move; MAX_MOVES]);

impl Loadout {
    pub fn new(moves: [Move; MAX_MOVES]) -> Self {
        Self(moves)
    }

    /// Pick the moves named by `ids` out of `pool`, in the order given.
    pub fn from_pool(pool: &[Move], ids: &[String]) -> Result<Self, LoadoutError> {
        if ids.len() != MAX_MOVES {
            return Err(LoadoutError::WrongMoveCount(ids.len()));
        }
        let mut chosen = Vec::with_capacity(MAX_MOVES);
        for id in ids {
            if chosen.iter().any(|m: &Move| &m.id == id) {
                return Err(LoadoutError::DuplicateMove(id.clone()));
            }
            let mv = pool
                .iter()
                .find(|m| &m.id == id)
                .ok_or_else(|| LoadoutError::UnknownMove(id.clone()))?;
            chosen.push(mv.clone());
        }
        Self::try_from(chosen)
    }

    #[inline]
    pub fn get(&self, slot: MoveSlot) -> &Move {
        &self.0[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoveSlot, &Move)> {
        MoveSlot::ALL.into_iter().zip(self.0.iter())
    }

    pub fn moves(&self) -> &[Move; MAX_MOVES] {
        &self.0
    }

    /// Slot of the move with the given id
    pub fn slot_of(&self, id: &str) -> Option<MoveSlot> {
        self.iter().find(|(_, m)| m.id == id).map(|(slot, _)| slot)
    }
}

impl TryFrom<Vec<Move>> for Loadout {
    type Error = LoadoutError;

    fn try_from(moves: Vec<Move>) -> Result<Self, Self::Error> {
        let count = moves.len();
        let moves: [Move; MAX_MOVES] = moves
            .try_into()
            .map_err(|_| LoadoutError::WrongMoveCount(count))?;
        Ok(Self(moves))
    }
}

impl From<Loadout> for Vec<Move> {
    fn from(loadout: Loadout) -> Self {
        loadout.0.into()
    }
}

// ============================================================================
// Loadout picker
// ============================================================================

/// Interactive loadout selection over the moves learnable at a level.
///
/// Toggling a selected move removes it; toggling an unselected move adds it
/// while fewer than four are selected. Confirmation needs exactly four.
#[derive(Clone, Debug)]
pub struct LoadoutPicker {
    available: Vec<Move>,
    selected: Vec<usize>,
}

impl LoadoutPicker {
    pub fn new(pool: &[Move], level: u8) -> Self {
        Self {
            available: learnable_moves(pool, level),
            selected: Vec::with_capacity(MAX_MOVES),
        }
    }

    pub fn available(&self) -> &[Move] {
        &self.available
    }

    pub fn selected(&self) -> impl Iterator<Item = &Move> {
        self.selected.iter().map(|&i| &self.available[i])
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Moves still needed before the loadout can be confirmed
    pub fn remaining(&self) -> usize {
        MAX_MOVES - self.selected.len()
    }

    /// Toggle the available move at `index`. Returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.available.len() {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
            false
        } else if self.selected.len() < MAX_MOVES {
            self.selected.push(index);
            true
        } else {
            false
        }
    }

    /// The chosen loadout, once exactly four moves are selected
    pub fn confirm(&self) -> Option<Loadout> {
        if self.selected.len() != MAX_MOVES {
            return None;
        }
        Loadout::try_from(self.selected().cloned().collect::<Vec<_>>()).ok()
    }
}
