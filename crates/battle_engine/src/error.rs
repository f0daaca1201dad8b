//! Crate-level error type.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::entities::CreatureError;
use crate::history::HistoryError;
use crate::turn::TurnError;

/// Errors surfaced by the battle controller.
///
/// None of these are fatal: a rejected selection leaves the session as it
/// was, and an unavailable catalog only means the battle cannot start.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] TurnError),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),

    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] HistoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Creature(#[from] CreatureError),
}

pub type Result<T> = std::result::Result<T, BattleError>;
