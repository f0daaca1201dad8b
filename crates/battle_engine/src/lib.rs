//! battle_engine - turn-based creature battle engine
//!
//! Two creatures trade moves until one side's health reaches zero. The
//! damage calculator and the turn state machine are pure; timers, catalog
//! lookups and battle history sit behind small traits so a session can be
//! replayed deterministically.

/// Type definitions and type chart
pub mod types {
    include!(concat!(env!("OUT_DIR"), "/types.rs"));

    impl std::fmt::Display for Type {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.name())
        }
    }

    impl serde::Serialize for Type {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.name())
        }
    }

    // Catalogs may carry types the chart does not know; they fold into
    // `Unknown`, which is neutral against everything.
    impl<'de> serde::Deserialize<'de> for Type {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
            Ok(Type::from_str(&name).unwrap_or(Type::Unknown))
        }
    }
}

/// Move definitions, loadouts and loadout selection
pub mod moves;

/// Creature blueprints
pub mod entities;

/// Damage calculation
pub mod damage;

/// Injectable randomness
pub mod rng;

/// Battle session state
pub mod state;

/// Turn state machine transitions
pub mod turn;

/// Cancelable timers
pub mod scheduler;

/// Session controller driving a battle through timers
pub mod session;

/// Creature catalog collaborator
pub mod catalog;

/// Battle history collaborator
pub mod history;

/// Engine configuration
pub mod config;

/// Crate-level error type
pub mod error;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogProvider, JsonCatalog, MemoryCatalog};
pub use config::{BattleConfig, TimingConfig};
pub use damage::{calculate_damage, resolve_attack, AttackOutcome, AttackRolls};
pub use entities::{BaseStats, Creature, CreatureConfig};
pub use error::{BattleError, Result};
pub use history::{BattleRecord, HistoryStore, HistorySummary, JsonLinesHistory, MemoryHistory};
pub use moves::{Loadout, Move, MoveCategory, MoveSlot};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use scheduler::{Scheduler, TimerId, TokioScheduler, VirtualScheduler};
pub use session::{BattleController, ControlMode, TimerEvent, TimerKind};
pub use state::{BattleSession, Phase, Side};
pub use turn::TurnError;
pub use types::{Type, TypeEffectiveness};
