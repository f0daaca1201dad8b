//! Engine configuration.
//!
//! Defaults reproduce the classic battle screen: 100 health per side, five
//! log lines, one-second entrance beats and half-second animations. Values
//! can come from a JSON file and be overridden from the environment.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{DEFAULT_BASELINE_HEALTH, DEFAULT_LOG_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Battle session settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Health each side starts with
    pub baseline_health: u16,
    /// Lines kept in the battle log
    pub log_capacity: usize,
    pub timing: TimingConfig,
    /// Whether the player's moves are picked automatically
    pub player_auto: bool,
    /// Whether the opponent's moves are picked automatically
    pub opponent_auto: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            baseline_health: DEFAULT_BASELINE_HEALTH,
            log_capacity: DEFAULT_LOG_CAPACITY,
            timing: TimingConfig::default(),
            player_auto: false,
            opponent_auto: true,
        }
    }
}

impl BattleConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_BASELINE_HEALTH` - Starting health per side (default: 100)
    /// - `BATTLE_LOG_CAPACITY` - Battle log lines kept (default: 5)
    /// - `BATTLE_AUTO_DELAY_MS` - Delay before an automatic move (default: 1000)
    /// - `BATTLE_PLAYER_AUTO` - Pick the player's moves automatically (default: false)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(health) = parse::<u16>(lookup("BATTLE_BASELINE_HEALTH")) {
            self.baseline_health = health.max(1);
        }
        if let Some(capacity) = parse::<usize>(lookup("BATTLE_LOG_CAPACITY")) {
            self.log_capacity = capacity.max(1);
        }
        if let Some(delay) = parse::<u64>(lookup("BATTLE_AUTO_DELAY_MS")) {
            self.timing.auto_move_delay_ms = delay;
        }
        if let Some(auto) = lookup("BATTLE_PLAYER_AUTO").and_then(|v| parse_bool(&v)) {
            self.player_auto = auto;
        }
        self
    }
}

/// Delays between the scheduled steps of a battle, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Gap between entrance beats (player shown, opponent shown, battle on)
    pub entrance_step_ms: u64,
    /// From move selection to damage
    pub attack_animation_ms: u64,
    /// From damage to the next turn
    pub damage_animation_ms: u64,
    /// Before an automatic move is picked
    pub auto_move_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            entrance_step_ms: 1000,
            attack_animation_ms: 500,
            damage_animation_ms: 500,
            auto_move_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Every delay set to zero
    pub const fn instant() -> Self {
        Self {
            entrance_step_ms: 0,
            attack_animation_ms: 0,
            damage_animation_ms: 0,
            auto_move_delay_ms: 0,
        }
    }

    pub fn entrance_step(&self) -> Duration {
        Duration::from_millis(self.entrance_step_ms)
    }

    pub fn attack_animation(&self) -> Duration {
        Duration::from_millis(self.attack_animation_ms)
    }

    pub fn damage_animation(&self) -> Duration {
        Duration::from_millis(self.damage_animation_ms)
    }

    pub fn auto_move_delay(&self) -> Duration {
        Duration::from_millis(self.auto_move_delay_ms)
    }
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
