//! Battle session state.
//!
//! A [`BattleSession`] is a plain value: the two combatants, their health,
//! the current [`Phase`], the winner once decided, a bounded event log and
//! the one-line banner. Transitions live in [`crate::turn`] and always
//! produce a new session rather than mutating this one.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::damage::AttackOutcome;
use crate::entities::Creature;
use crate::moves::MoveSlot;

/// Health both sides start a battle with
pub const DEFAULT_BASELINE_HEALTH: u16 = 100;

/// Number of log lines kept
pub const DEFAULT_LOG_CAPACITY: usize = 5;

// ============================================================================
// Side
// ============================================================================

/// One of the two combatants. The player always opens the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    Player = 0,
    Opponent = 1,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Player, Side::Opponent];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The side across the field
    #[inline]
    pub const fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("player"),
            Side::Opponent => f.write_str("opponent"),
        }
    }
}

// ============================================================================
// Phase
// ============================================================================

/// Where the session is in the turn cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Phase {
    /// No battle running
    #[default]
    Idle,

    /// Combatants are being introduced
    Entrance,

    /// Waiting for the given side to pick a move
    WaitingForMove(Side),

    /// A move has been chosen and is about to land
    Resolving { slot: MoveSlot, attacker: Side },

    /// Damage has been applied; the next turn has not started yet
    TurnComplete {
        attacker: Side,
        outcome: AttackOutcome,
    },

    /// A winner is decided; only ending the session leaves this phase
    Finished,
}

impl Phase {
    /// Short name used in logs and errors
    pub const fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Entrance => "entrance",
            Phase::WaitingForMove(_) => "waiting-for-move",
            Phase::Resolving { .. } => "resolving",
            Phase::TurnComplete { .. } => "turn-complete",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Battle log
// ============================================================================

/// Log keeping only the most recent `capacity` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, dropping the oldest when full
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for BattleLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

// ============================================================================
// Battle session
// ============================================================================

/// A battle between two creatures.
///
/// Cloning is cheap: the combatants are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleSession {
    pub(crate) phase: Phase,
    pub(crate) combatants: Option<Arc<[Creature; 2]>>,
    pub(crate) health: [u16; 2],
    pub(crate) revealed: [bool; 2],
    pub(crate) baseline_health: u16,
    pub(crate) winner: Option<Side>,
    pub(crate) log: BattleLog,
    pub(crate) banner: String,
}

impl BattleSession {
    /// A session ready to begin its entrance, with default limits.
    pub fn new(player: Creature, opponent: Creature) -> Self {
        Self::with_limits(
            player,
            opponent,
            DEFAULT_BASELINE_HEALTH,
            DEFAULT_LOG_CAPACITY,
        )
    }

    /// A session with a custom starting health and log size.
    ///
    /// A baseline of 0 is raised to 1 so that a battle always needs a hit.
    pub fn with_limits(
        player: Creature,
        opponent: Creature,
        baseline_health: u16,
        log_capacity: usize,
    ) -> Self {
        let baseline_health = baseline_health.max(1);
        Self {
            phase: Phase::Idle,
            combatants: Some(Arc::new([player, opponent])),
            health: [baseline_health; 2],
            revealed: [false; 2],
            baseline_health,
            winner: None,
            log: BattleLog::new(log_capacity),
            banner: String::new(),
        }
    }

    /// An idle session with nobody on the field.
    pub fn empty() -> Self {
        Self {
            phase: Phase::Idle,
            combatants: None,
            health: [DEFAULT_BASELINE_HEALTH; 2],
            revealed: [false; 2],
            baseline_health: DEFAULT_BASELINE_HEALTH,
            winner: None,
            log: BattleLog::default(),
            banner: String::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Creature fighting for `side`, if a battle is set up
    pub fn creature(&self, side: Side) -> Option<&Creature> {
        self.combatants.as_deref().map(|c| &c[side.index()])
    }

    #[inline]
    pub fn health(&self, side: Side) -> u16 {
        self.health[side.index()]
    }

    /// Whether `side` has been shown during the entrance
    #[inline]
    pub fn is_revealed(&self, side: Side) -> bool {
        self.revealed[side.index()]
    }

    #[inline]
    pub fn baseline_health(&self) -> u16 {
        self.baseline_health
    }

    #[inline]
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Side whose move is awaited
    pub fn turn_owner(&self) -> Option<Side> {
        match self.phase {
            Phase::WaitingForMove(side) => Some(side),
            _ => None,
        }
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    /// Current one-line battle message
    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Display name for `side`, empty when nobody is on the field
    pub(crate) fn name_of(&self, side: Side) -> &str {
        self.creature(side).map(|c| c.name.as_str()).unwrap_or("")
    }
}

impl Default for BattleSession {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_other() {
        assert_eq!(Side::Player.other(), Side::Opponent);
        assert_eq!(Side::Opponent.other(), Side::Player);
        assert_eq!(Side::Opponent.index(), 1);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = BattleLog::new(5);
        for i in 0..8 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.len(), 5);
        let lines: Vec<&str> = log.iter().collect();
        assert_eq!(lines, ["line 3", "line 4", "line 5", "line 6", "line 7"]);
        assert_eq!(log.latest(), Some("line 7"));
    }

    #[test]
    fn test_log_capacity_at_least_one() {
        let mut log = BattleLog::new(0);
        log.push("a");
        log.push("b");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.latest(), Some("b"));
    }

    #[test]
    fn test_empty_session() {
        let session = BattleSession::empty();
        assert!(session.is_idle());
        assert!(session.creature(Side::Player).is_none());
        assert_eq!(session.winner(), None);
        assert_eq!(session.turn_owner(), None);
    }
}
