//! Creature blueprints.
//!
//! The `CreatureConfig` struct serves as a builder for configuring a creature
//! before handing it to a battle session. Creatures are read-only once built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moves::{Loadout, LoadoutError};
use crate::types::Type;

/// Default level (matches the catalog's starting level)
pub const DEFAULT_LEVEL: u8 = 5;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 100;

/// Clamp a level into `MIN_LEVEL..=MAX_LEVEL`
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}

/// Base stats as reported by the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BaseStats {
    #[serde(default)]
    pub hp: u16,
    #[serde(default)]
    pub attack: u16,
    #[serde(default)]
    pub defense: u16,
    #[serde(default)]
    pub special_attack: u16,
    #[serde(default)]
    pub special_defense: u16,
    #[serde(default)]
    pub speed: u16,
}

impl BaseStats {
    /// Stats in catalog order [attack, defense, special-attack, special-defense, speed, hp]
    pub const fn new(
        attack: u16,
        defense: u16,
        special_attack: u16,
        special_defense: u16,
        speed: u16,
        hp: u16,
    ) -> Self {
        Self {
            hp,
            attack,
            defense,
            special_attack,
            special_defense,
            speed,
        }
    }
}

/// A combatant: identity, level, stats, types and a four-move loadout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Creature {
    pub id: String,
    pub name: String,
    pub level: u8,
    pub stats: BaseStats,
    pub types: Vec<Type>,
    pub loadout: Loadout,
}

impl Creature {
    /// Whether the creature has the given type
    pub fn has_type(&self, ty: Type) -> bool {
        self.types.contains(&ty)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreatureError {
    #[error("creature {0} has no types")]
    NoTypes(String),

    #[error("creature {0} has no loadout")]
    MissingLoadout(String),

    #[error("creature {id}: {source}")]
    Loadout {
        id: String,
        #[source]
        source: LoadoutError,
    },
}

/// Blueprint for a creature.
///
/// Use builder methods to customize, then call `build()` to validate.
#[derive(Clone, Debug)]
pub struct CreatureConfig {
    pub id: String,
    pub name: String,

    /// Level (1-100)
    pub level: u8,

    pub stats: BaseStats,

    /// Elemental types, duplicates removed
    pub types: Vec<Type>,

    pub loadout: Option<Loadout>,
}

impl CreatureConfig {
    /// Create a new config; the display name defaults to the id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            level: DEFAULT_LEVEL,
            stats: BaseStats::default(),
            types: Vec::new(),
            loadout: None,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set level
    pub fn level(mut self, level: u8) -> Self {
        self.level = clamp_level(level);
        self
    }

    /// Set base stats
    pub fn stats(mut self, stats: BaseStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set types (order kept, duplicates dropped)
    pub fn types(mut self, types: impl IntoIterator<Item = Type>) -> Self {
        self.types.clear();
        for ty in types {
            if !self.types.contains(&ty) {
                self.types.push(ty);
            }
        }
        self
    }

    /// Set the loadout
    pub fn loadout(mut self, loadout: Loadout) -> Self {
        self.loadout = Some(loadout);
        self
    }

    /// Set the loadout from exactly four moves
    pub fn moves(mut self, moves: Vec<crate::moves::Move>) -> Result<Self, CreatureError> {
        let loadout = Loadout::try_from(moves).map_err(|source| CreatureError::Loadout {
            id: self.id.clone(),
            source,
        })?;
        self.loadout = Some(loadout);
        Ok(self)
    }

    /// Validate and produce the creature
    pub fn build(self) -> Result<Creature, CreatureError> {
        if self.types.is_empty() {
            return Err(CreatureError::NoTypes(self.id));
        }
        let Some(loadout) = self.loadout else {
            return Err(CreatureError::MissingLoadout(self.id));
        };
        Ok(Creature {
            id: self.id,
            name: self.name,
            level: self.level,
            stats: self.stats,
            types: self.types,
            loadout,
        })
    }
}
