//! Creature catalog.
//!
//! A [`CatalogProvider`] turns a creature id into a battle-ready
//! [`Creature`]. Definitions carry a full move pool; the loadout is either
//! the definition's explicit choice or the first four moves learnable at
//! the creature's level.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{
    clamp_level, BaseStats, Creature, CreatureConfig, CreatureError, DEFAULT_LEVEL,
};
use crate::moves::{learnable_moves, Loadout, LoadoutError, Move, MAX_MOVES};
use crate::types::Type;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("creature {0} is not in the catalog")]
    NotFound(String),

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid definition for {id}: {source}")]
    InvalidDefinition {
        id: String,
        #[source]
        source: CreatureError,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Source of creature data.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch a battle-ready creature by id.
    async fn fetch_creature(&self, id: &str) -> Result<Creature>;
}

// ============================================================================
// Definitions
// ============================================================================

/// A creature as listed in a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureDefinition {
    pub id: String,
    /// Display name; the id is used when empty
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u8,
    pub types: Vec<Type>,
    #[serde(default)]
    pub stats: BaseStats,
    /// Every move the creature can learn
    #[serde(default)]
    pub moves: Vec<Move>,
    /// Ids of the four moves to fight with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Vec<String>>,
}

fn default_level() -> u8 {
    DEFAULT_LEVEL
}

impl CreatureDefinition {
    /// Level the creature battles at; out-of-range values are clamped
    pub fn effective_level(&self) -> u8 {
        clamp_level(self.level)
    }

    /// Moves this creature may use at its effective level
    pub fn learnable(&self) -> Vec<Move> {
        learnable_moves(&self.moves, self.effective_level())
    }

    /// Build the battle-ready creature.
    pub fn to_creature(&self) -> Result<Creature> {
        let invalid = |source| CatalogError::InvalidDefinition {
            id: self.id.clone(),
            source,
        };
        let loadout_error = |source: LoadoutError| {
            invalid(CreatureError::Loadout {
                id: self.id.clone(),
                source,
            })
        };

        let learnable = self.learnable();
        let loadout = match &self.loadout {
            Some(ids) => Loadout::from_pool(&learnable, ids).map_err(loadout_error)?,
            None => {
                let first: Vec<Move> = learnable.into_iter().take(MAX_MOVES).collect();
                Loadout::try_from(first).map_err(loadout_error)?
            }
        };

        let name = if self.name.is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        };

        CreatureConfig::new(self.id.clone())
            .name(name)
            .level(self.effective_level())
            .types(self.types.iter().copied())
            .stats(self.stats)
            .loadout(loadout)
            .build()
            .map_err(invalid)
    }
}

/// On-disk catalog layout.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub creatures: Vec<CreatureDefinition>,
}

impl CatalogFile {
    pub fn find(&self, id: &str) -> Option<&CreatureDefinition> {
        self.creatures
            .iter()
            .find(|def| def.id.eq_ignore_ascii_case(id))
    }
}

// ============================================================================
// JSON file catalog
// ============================================================================

/// Catalog backed by a JSON file, read on every fetch.
#[derive(Clone, Debug)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file
    pub async fn load(&self) -> Result<CatalogFile> {
        let display = || self.path.display().to_string();
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: display(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| CatalogError::Malformed {
            path: display(),
            source,
        })
    }
}

#[async_trait]
impl CatalogProvider for JsonCatalog {
    async fn fetch_creature(&self, id: &str) -> Result<Creature> {
        let catalog = self.load().await?;
        let def = catalog
            .find(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        tracing::debug!(id, path = %self.path.display(), "creature loaded from catalog");
        def.to_creature()
    }
}

// ============================================================================
// In-memory catalog
// ============================================================================

/// Catalog held in memory, keyed by lowercase id.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    definitions: HashMap<String, CreatureDefinition>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: CreatureDefinition) {
        self.definitions
            .insert(definition.id.to_ascii_lowercase(), definition);
    }

    pub fn with(mut self, definition: CreatureDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl From<CatalogFile> for MemoryCatalog {
    fn from(file: CatalogFile) -> Self {
        file.creatures
            .into_iter()
            .fold(Self::new(), |catalog, def| catalog.with(def))
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn fetch_creature(&self, id: &str) -> Result<Creature> {
        self.definitions
            .get(&id.to_ascii_lowercase())
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?
            .to_creature()
    }
}
