//! Turn state machine.
//!
//! Every transition borrows the current [`BattleSession`] and returns the
//! next one, leaving the receiver untouched. A rejected transition returns
//! a [`TurnError`] and the caller simply keeps the session it had.
//!
//! ```text
//! Idle -> Entrance -> WaitingForMove(Player) -> Resolving -> TurnComplete
//!                          ^                                      |
//!                          +------ WaitingForMove(other) ---------+
//!                                                                 |
//!                                         Finished <---- winner --+
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::damage::{effectiveness_message, resolve_attack, AttackOutcome};
use crate::history::BattleRecord;
use crate::moves::{Move, MoveSlot, MAX_MOVES};
use crate::rng::RandomSource;
use crate::state::{BattleLog, BattleSession, Phase, Side};

/// Why a transition was refused. The session is unchanged in every case.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TurnError {
    #[error("it is the {owner}'s turn, not the {requested}'s")]
    WrongTurn { owner: Side, requested: Side },

    #[error("the battle is already over")]
    BattleOver,

    #[error("cannot {operation} while {phase}")]
    UnexpectedPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("move slot {0} is out of range (0..{MAX})", MAX = MAX_MOVES)]
    SlotOutOfRange(usize),

    #[error("no creatures on the field")]
    NoCombatants,
}

impl BattleSession {
    fn unexpected(&self, operation: &'static str) -> TurnError {
        TurnError::UnexpectedPhase {
            operation,
            phase: self.phase,
        }
    }

    fn prompt(&self, side: Side) -> String {
        match side {
            Side::Player => format!("What will {} do?", self.name_of(side)),
            Side::Opponent => format!("{}'s turn!", self.name_of(side)),
        }
    }

    // ========================================================================
    // Entrance
    // ========================================================================

    /// Idle -> Entrance. Health is reset to the baseline and the log cleared.
    pub fn begin_entrance(&self) -> Result<BattleSession, TurnError> {
        if !self.is_idle() {
            return Err(self.unexpected("begin the entrance"));
        }
        if self.combatants.is_none() {
            return Err(TurnError::NoCombatants);
        }

        let mut next = self.clone();
        next.phase = Phase::Entrance;
        next.health = [self.baseline_health; 2];
        next.revealed = [false; 2];
        next.winner = None;
        next.log.clear();
        next.banner.clear();
        debug!(
            player = next.name_of(Side::Player),
            opponent = next.name_of(Side::Opponent),
            "entrance started"
        );
        Ok(next)
    }

    /// Show one side during the entrance.
    pub fn reveal(&self, side: Side) -> Result<BattleSession, TurnError> {
        if self.phase != Phase::Entrance {
            return Err(self.unexpected("reveal a creature"));
        }
        let mut next = self.clone();
        next.revealed[side.index()] = true;
        next.banner = match side {
            Side::Player => format!("Go, {}!", self.name_of(side)),
            Side::Opponent => format!("{} appeared!", self.name_of(side)),
        };
        Ok(next)
    }

    /// Entrance -> WaitingForMove(Player). Both sides end up revealed.
    pub fn finish_entrance(&self) -> Result<BattleSession, TurnError> {
        if self.phase != Phase::Entrance {
            return Err(self.unexpected("finish the entrance"));
        }
        let mut next = self.clone();
        next.revealed = [true; 2];
        next.phase = Phase::WaitingForMove(Side::Player);
        next.banner = next.prompt(Side::Player);
        debug!("entrance finished");
        Ok(next)
    }

    // ========================================================================
    // Turn
    // ========================================================================

    /// WaitingForMove(side) -> Resolving.
    ///
    /// Refused once a winner is decided or when `side` does not own the turn.
    pub fn select_move(&self, side: Side, slot: MoveSlot) -> Result<BattleSession, TurnError> {
        if self.winner.is_some() || self.is_finished() {
            return Err(TurnError::BattleOver);
        }
        let owner = match self.phase {
            Phase::WaitingForMove(owner) => owner,
            _ => return Err(self.unexpected("select a move")),
        };
        if owner != side {
            return Err(TurnError::WrongTurn {
                owner,
                requested: side,
            });
        }
        let Some(creature) = self.creature(side) else {
            return Err(TurnError::NoCombatants);
        };

        let move_name = creature.loadout.get(slot).name.clone();
        let mut next = self.clone();
        next.phase = Phase::Resolving {
            slot,
            attacker: side,
        };
        next.banner = format!("{} used {}!", creature.name, move_name);
        debug!(%side, slot = slot.index(), %move_name, "move selected");
        Ok(next)
    }

    /// Like [`select_move`](Self::select_move) with a raw slot index.
    pub fn select_move_index(&self, side: Side, index: usize) -> Result<BattleSession, TurnError> {
        let slot = MoveSlot::new(index).ok_or(TurnError::SlotOutOfRange(index))?;
        self.select_move(side, slot)
    }

    /// The move about to land while resolving
    pub fn pending_move(&self) -> Option<&Move> {
        match self.phase {
            Phase::Resolving { slot, attacker } => {
                self.creature(attacker).map(|c| c.loadout.get(slot))
            }
            _ => None,
        }
    }

    /// Resolving -> TurnComplete, rolling the attack from `rng`.
    pub fn resolve<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<BattleSession, TurnError> {
        let Phase::Resolving { slot, attacker } = self.phase else {
            return Err(self.unexpected("resolve an attack"));
        };
        let (Some(att), Some(def)) = (self.creature(attacker), self.creature(attacker.other()))
        else {
            return Err(TurnError::NoCombatants);
        };
        let outcome = resolve_attack(att.loadout.get(slot), att, def, rng);
        self.resolve_with(outcome)
    }

    /// Resolving -> TurnComplete with a precomputed outcome.
    ///
    /// Damage is subtracted from the defender, floored at 0. Reaching 0 makes
    /// the attacker the winner.
    pub fn resolve_with(&self, outcome: AttackOutcome) -> Result<BattleSession, TurnError> {
        let Phase::Resolving { slot, attacker } = self.phase else {
            return Err(self.unexpected("resolve an attack"));
        };
        let Some(creature) = self.creature(attacker) else {
            return Err(TurnError::NoCombatants);
        };
        let defender = attacker.other();
        let move_used = format!("{} used {}!", creature.name, creature.loadout.get(slot).name);

        let mut next = self.clone();
        let health = &mut next.health[defender.index()];
        *health = health.saturating_sub(outcome.damage);
        let remaining = *health;

        let damage_line = format!("{} damage!", outcome.damage);
        let effectiveness_line = effectiveness_message(outcome.effectiveness);
        let critical_line = outcome.is_critical.then_some("A critical hit!");

        push_event_lines(
            &mut next.log,
            move_used,
            damage_line.clone(),
            effectiveness_line,
            critical_line,
        );
        next.banner = critical_line
            .or(effectiveness_line)
            .map(str::to_owned)
            .unwrap_or(damage_line);

        if remaining == 0 {
            next.winner = Some(attacker);
        }
        next.phase = Phase::TurnComplete { attacker, outcome };
        debug!(
            %attacker,
            damage = outcome.damage,
            critical = outcome.is_critical,
            effectiveness = outcome.effectiveness,
            remaining,
            "attack resolved"
        );
        Ok(next)
    }

    /// TurnComplete -> Finished when a winner exists, else
    /// WaitingForMove(other side).
    pub fn complete_turn(&self) -> Result<BattleSession, TurnError> {
        let Phase::TurnComplete { attacker, .. } = self.phase else {
            return Err(self.unexpected("complete the turn"));
        };
        let mut next = self.clone();
        match self.winner {
            Some(winner) => {
                next.phase = Phase::Finished;
                next.banner = format!("{} wins!", self.name_of(winner));
                debug!(%winner, "battle finished");
            }
            None => {
                let owner = attacker.other();
                next.phase = Phase::WaitingForMove(owner);
                next.banner = next.prompt(owner);
            }
        }
        Ok(next)
    }

    // ========================================================================
    // Session end
    // ========================================================================

    /// End a finished battle.
    ///
    /// A finished session yields a fresh idle session and the battle record.
    /// Any other session is returned unchanged with no record, so ending
    /// twice emits one record.
    pub fn conclude(&self, now: DateTime<Utc>) -> (BattleSession, Option<BattleRecord>) {
        let winner = match (self.phase, self.winner) {
            (Phase::Finished, Some(winner)) => winner,
            _ => return (self.clone(), None),
        };
        let record = BattleRecord::new(
            self.name_of(winner),
            self.name_of(winner.other()),
            now,
        );

        let mut idle = BattleSession::empty();
        idle.baseline_health = self.baseline_health;
        idle.health = [self.baseline_health; 2];
        idle.log = BattleLog::new(self.log.capacity());
        (idle, Some(record))
    }
}

fn push_event_lines(
    log: &mut BattleLog,
    move_used: String,
    damage: String,
    effectiveness: Option<&str>,
    critical: Option<&str>,
) {
    log.push(move_used);
    log.push(damage);
    if let Some(line) = effectiveness {
        log.push(line);
    }
    if let Some(line) = critical {
        log.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BaseStats, Creature, CreatureConfig};
    use crate::rng::ScriptedRandom;
    use crate::types::Type;
    use chrono::TimeZone;

    fn creature(id: &str, name: &str, ty: Type) -> Creature {
        CreatureConfig::new(id)
            .name(name)
            .level(50)
            .types([ty])
            .stats(BaseStats::new(95, 55, 95, 55, 50, 50))
            .moves(vec![
                Move::new("tackle", "Tackle", Type::Normal, 50),
                Move::new("growl", "Growl", Type::Normal, 0),
                Move::new("ember", "Ember", Type::Fire, 40),
                Move::new("bubble", "Bubble", Type::Water, 40),
            ])
            .unwrap()
            .build()
            .unwrap()
    }

    fn waiting() -> BattleSession {
        BattleSession::new(
            creature("a", "Alpha", Type::Normal),
            creature("b", "Beta", Type::Normal),
        )
        .begin_entrance()
        .unwrap()
        .finish_entrance()
        .unwrap()
    }

    fn hit(damage: u16) -> AttackOutcome {
        AttackOutcome {
            damage,
            is_critical: false,
            effectiveness: 1.0,
        }
    }

    fn slot(i: usize) -> MoveSlot {
        MoveSlot::new(i).unwrap()
    }

    #[test]
    fn test_entrance_flow() {
        let idle = BattleSession::new(
            creature("a", "Alpha", Type::Normal),
            creature("b", "Beta", Type::Normal),
        );
        let entrance = idle.begin_entrance().unwrap();
        assert_eq!(entrance.phase(), Phase::Entrance);

        let shown = entrance.reveal(Side::Player).unwrap();
        assert!(shown.is_revealed(Side::Player));
        assert!(!shown.is_revealed(Side::Opponent));
        assert_eq!(shown.banner(), "Go, Alpha!");

        let ready = shown.finish_entrance().unwrap();
        assert_eq!(ready.phase(), Phase::WaitingForMove(Side::Player));
        assert_eq!(ready.banner(), "What will Alpha do?");
        assert!(ready.is_revealed(Side::Opponent));
    }

    #[test]
    fn test_empty_session_cannot_begin() {
        assert_eq!(
            BattleSession::empty().begin_entrance(),
            Err(TurnError::NoCombatants)
        );
    }

    #[test]
    fn test_select_move_for_owner() {
        let session = waiting();
        let next = session.select_move(Side::Player, slot(0)).unwrap();
        assert_eq!(
            next.phase(),
            Phase::Resolving {
                slot: slot(0),
                attacker: Side::Player
            }
        );
        assert_eq!(next.banner(), "Alpha used Tackle!");
        assert_eq!(next.pending_move().map(|m| m.id.as_str()), Some("tackle"));
        // Original untouched
        assert_eq!(session.phase(), Phase::WaitingForMove(Side::Player));
    }

    #[test]
    fn test_select_move_wrong_side() {
        let session = waiting();
        assert_eq!(
            session.select_move(Side::Opponent, slot(0)),
            Err(TurnError::WrongTurn {
                owner: Side::Player,
                requested: Side::Opponent
            })
        );
    }

    #[test]
    fn test_select_move_index_out_of_range() {
        assert_eq!(
            waiting().select_move_index(Side::Player, 4),
            Err(TurnError::SlotOutOfRange(4))
        );
    }

    #[test]
    fn test_select_outside_waiting_phase() {
        let resolving = waiting().select_move(Side::Player, slot(0)).unwrap();
        assert!(matches!(
            resolving.select_move(Side::Player, slot(1)),
            Err(TurnError::UnexpectedPhase { .. })
        ));
    }

    #[test]
    fn test_resolve_and_flip() {
        let session = waiting()
            .select_move(Side::Player, slot(0))
            .unwrap()
            .resolve_with(hit(40))
            .unwrap();
        assert_eq!(session.health(Side::Opponent), 60);
        assert_eq!(session.health(Side::Player), 100);
        assert_eq!(session.winner(), None);
        assert_eq!(session.banner(), "40 damage!");

        let lines: Vec<&str> = session.log().iter().collect();
        assert_eq!(lines, ["Alpha used Tackle!", "40 damage!"]);

        let next = session.complete_turn().unwrap();
        assert_eq!(next.phase(), Phase::WaitingForMove(Side::Opponent));
        assert_eq!(next.banner(), "Beta's turn!");
    }

    #[test]
    fn test_resolve_logs_effectiveness_and_crit() {
        let outcome = AttackOutcome {
            damage: 12,
            is_critical: true,
            effectiveness: 2.0,
        };
        let session = waiting()
            .select_move(Side::Player, slot(3))
            .unwrap()
            .resolve_with(outcome)
            .unwrap();
        let lines: Vec<&str> = session.log().iter().collect();
        assert_eq!(
            lines,
            [
                "Alpha used Bubble!",
                "12 damage!",
                "It's super effective!",
                "A critical hit!"
            ]
        );
        assert_eq!(session.banner(), "A critical hit!");
    }

    #[test]
    fn test_lethal_hit_finishes() {
        let session = waiting()
            .select_move(Side::Player, slot(0))
            .unwrap()
            .resolve_with(hit(250))
            .unwrap();
        assert_eq!(session.health(Side::Opponent), 0);
        assert_eq!(session.winner(), Some(Side::Player));

        let done = session.complete_turn().unwrap();
        assert!(done.is_finished());
        assert_eq!(done.banner(), "Alpha wins!");
        assert_eq!(
            done.select_move(Side::Opponent, slot(0)),
            Err(TurnError::BattleOver)
        );
    }

    #[test]
    fn test_resolve_with_rng() {
        let mut rng = ScriptedRandom::new([0.5, 0.0]);
        let session = waiting()
            .select_move(Side::Player, slot(0))
            .unwrap()
            .resolve(&mut rng)
            .unwrap();
        // Level 50, power 50, 95 vs 55, neutral, spread 1.0 = 40
        assert_eq!(session.health(Side::Opponent), 60);
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn test_conclude_once() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let finished = waiting()
            .select_move(Side::Player, slot(0))
            .unwrap()
            .resolve_with(hit(100))
            .unwrap()
            .complete_turn()
            .unwrap();

        let (idle, record) = finished.conclude(now);
        let record = record.unwrap();
        assert_eq!(record.winner, "Alpha");
        assert_eq!(record.loser, "Beta");
        assert_eq!(record.date, now);
        assert!(idle.is_idle());
        assert!(idle.creature(Side::Player).is_none());

        let (again, none) = idle.conclude(now);
        assert!(none.is_none());
        assert_eq!(again, idle);
    }

    #[test]
    fn test_conclude_mid_battle_is_noop() {
        let session = waiting();
        let (same, record) = session.conclude(Utc::now());
        assert!(record.is_none());
        assert_eq!(same, session);
    }
}
