//! Session controller.
//!
//! [`BattleController`] owns the current [`BattleSession`] and drives it
//! through the turn state machine. Delayed steps are scheduled on a
//! [`Scheduler`] as [`TimerEvent`]s, and every fired event applies exactly
//! one transition through [`BattleController::handle`].
//!
//! Events are stamped with the session epoch. Starting, ending or tearing
//! down a session bumps the epoch, so an event from an older session is
//! ignored even if it fires after its cancellation raced.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::CatalogProvider;
use crate::config::BattleConfig;
use crate::entities::Creature;
use crate::error::Result;
use crate::history::{BattleRecord, HistoryStore, HistorySummary};
use crate::moves::{MoveSlot, MAX_MOVES};
use crate::rng::RandomSource;
use crate::scheduler::{Scheduler, TimerId, VirtualScheduler};
use crate::state::{BattleSession, Phase, Side};
use crate::turn::TurnError;

/// Scheduled step of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Entrance: the player's creature is shown
    ShowPlayer,
    /// Entrance: the opponent's creature is shown
    ShowOpponent,
    /// Entrance over, first turn begins
    EntranceDone,
    /// Pick a random move for this side. The ticket tells a live pick
    /// from one that was withdrawn after scheduling.
    AutoMove { side: Side, ticket: u64 },
    /// Attack animation over, apply damage
    ResolveAttack,
    /// Damage animation over, next turn or finish
    CompleteTurn,
}

/// A scheduled step tagged with the session it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerEvent {
    pub epoch: u64,
    pub kind: TimerKind,
}

/// Who supplies a side's moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    /// Moves come from [`BattleController::select_move`]
    #[default]
    Manual,
    /// Moves are picked uniformly from the loadout after a delay
    Automatic,
}

impl ControlMode {
    pub const fn from_flag(automatic: bool) -> Self {
        if automatic {
            ControlMode::Automatic
        } else {
            ControlMode::Manual
        }
    }
}

/// Drives battle sessions.
///
/// # Type Parameters
///
/// - `S`: timer backend
/// - `R`: randomness for attacks and automatic picks
/// - `H`: where finished battles are recorded
pub struct BattleController<S, R, H> {
    config: BattleConfig,
    scheduler: S,
    rng: R,
    history: H,
    session: BattleSession,
    epoch: u64,
    modes: [ControlMode; 2],
    auto_timer: Option<(TimerId, u64)>,
    next_ticket: u64,
    records: Vec<BattleRecord>,
}

impl<S, R, H> BattleController<S, R, H>
where
    S: Scheduler<TimerEvent>,
    R: RandomSource,
    H: HistoryStore,
{
    pub fn new(config: BattleConfig, scheduler: S, rng: R, history: H) -> Self {
        let modes = [
            ControlMode::from_flag(config.player_auto),
            ControlMode::from_flag(config.opponent_auto),
        ];
        Self {
            config,
            scheduler,
            rng,
            history,
            session: BattleSession::empty(),
            epoch: 0,
            modes,
            auto_timer: None,
            next_ticket: 0,
            records: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    /// Records of battles ended through this controller, oldest first
    pub fn records(&self) -> &[BattleRecord] {
        &self.records
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn mode(&self, side: Side) -> ControlMode {
        self.modes[side.index()]
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Summary of the persisted history
    pub fn summary(&self) -> Result<HistorySummary> {
        Ok(HistorySummary::load(&self.history)?)
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Start a new battle.
    ///
    /// Pending timers are cancelled. A finished battle that was never ended
    /// is ended first so its record is not lost.
    pub fn start(&mut self, player: Creature, opponent: Creature) -> Result<()> {
        if self.session.is_finished() {
            self.end_session();
        }
        self.reset_timers();

        let session = BattleSession::with_limits(
            player,
            opponent,
            self.config.baseline_health,
            self.config.log_capacity,
        )
        .begin_entrance()?;
        info!(
            epoch = self.epoch,
            player = session.creature(Side::Player).map(|c| c.name.as_str()),
            opponent = session.creature(Side::Opponent).map(|c| c.name.as_str()),
            "battle started"
        );
        self.session = session;
        self.schedule(self.config.timing.entrance_step(), TimerKind::ShowPlayer);
        Ok(())
    }

    /// Fetch both creatures from `catalog`, then [`start`](Self::start).
    ///
    /// Any catalog failure leaves the controller untouched and is reported
    /// as `CatalogUnavailable`.
    pub async fn start_from_catalog<C>(
        &mut self,
        catalog: &C,
        player_id: &str,
        opponent_id: &str,
    ) -> Result<()>
    where
        C: CatalogProvider + ?Sized,
    {
        let player = catalog.fetch_creature(player_id).await.map_err(|e| {
            warn!(id = player_id, error = %e, "player creature unavailable");
            e
        })?;
        let opponent = catalog.fetch_creature(opponent_id).await.map_err(|e| {
            warn!(id = opponent_id, error = %e, "opponent creature unavailable");
            e
        })?;
        self.start(player, opponent)
    }

    /// End a finished battle, returning its record.
    ///
    /// Returns `None` unless the battle is finished, so calling twice yields
    /// one record. A record that cannot be persisted is still kept in
    /// [`records`](Self::records).
    pub fn end_session(&mut self) -> Option<BattleRecord> {
        self.end_session_at(Utc::now())
    }

    /// [`end_session`](Self::end_session) with an explicit timestamp.
    pub fn end_session_at(&mut self, now: DateTime<Utc>) -> Option<BattleRecord> {
        let (next, record) = self.session.conclude(now);
        let record = record?;

        self.reset_timers();
        self.session = next;
        self.records.push(record.clone());
        if let Err(e) = self.history.append(&record) {
            warn!(error = %e, "failed to persist battle record, keeping it in memory");
        }
        info!(winner = %record.winner, loser = %record.loser, "battle ended");
        Some(record)
    }

    /// Cancel every pending timer. The session keeps its current state.
    pub fn teardown(&mut self) {
        self.reset_timers();
        debug!(epoch = self.epoch, "controller torn down");
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Select a move for `side`.
    ///
    /// A rejected selection changes nothing.
    pub fn select_move(&mut self, side: Side, slot: MoveSlot) -> Result<()> {
        match self.session.select_move(side, slot) {
            Ok(next) => {
                self.apply_selection(next);
                Ok(())
            }
            Err(e) => {
                warn!(%side, slot = slot.index(), error = %e, "selection ignored");
                Err(e.into())
            }
        }
    }

    /// Select by raw slot index.
    pub fn select_move_index(&mut self, side: Side, index: usize) -> Result<()> {
        let slot = MoveSlot::new(index).ok_or(TurnError::SlotOutOfRange(index))?;
        self.select_move(side, slot)
    }

    /// Switch a side between manual and automatic play.
    ///
    /// Turning automatic on during that side's turn schedules a pick;
    /// turning it off cancels a pending one.
    pub fn set_automatic(&mut self, side: Side, automatic: bool) {
        self.modes[side.index()] = ControlMode::from_flag(automatic);
        debug!(%side, automatic, "control mode changed");

        if self.session.turn_owner() != Some(side) {
            return;
        }
        if automatic {
            self.schedule_auto_move(side);
        } else if let Some((id, _)) = self.auto_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    // ========================================================================
    // Timer events
    // ========================================================================

    /// Apply the transition for a fired timer.
    ///
    /// Returns false when the event was ignored: it belonged to an older
    /// session, or the session was no longer in the phase it expected.
    pub fn handle(&mut self, event: TimerEvent) -> bool {
        if event.epoch != self.epoch {
            warn!(
                event_epoch = event.epoch,
                epoch = self.epoch,
                kind = ?event.kind,
                "stale timer event ignored"
            );
            return false;
        }

        let result = match event.kind {
            TimerKind::ShowPlayer => self.session.reveal(Side::Player).map(|next| {
                self.session = next;
                self.schedule(self.config.timing.entrance_step(), TimerKind::ShowOpponent);
            }),
            TimerKind::ShowOpponent => self.session.reveal(Side::Opponent).map(|next| {
                self.session = next;
                self.schedule(self.config.timing.entrance_step(), TimerKind::EntranceDone);
            }),
            TimerKind::EntranceDone => self.session.finish_entrance().map(|next| {
                self.session = next;
                self.turn_started();
            }),
            TimerKind::AutoMove { side, ticket } => {
                if self.auto_timer.map(|(_, live)| live) != Some(ticket) {
                    warn!(%side, ticket, "withdrawn automatic pick ignored");
                    return false;
                }
                self.auto_timer = None;
                self.auto_move(side)
            }
            TimerKind::ResolveAttack => self.session.resolve(&mut self.rng).map(|next| {
                self.session = next;
                self.schedule(
                    self.config.timing.damage_animation(),
                    TimerKind::CompleteTurn,
                );
            }),
            TimerKind::CompleteTurn => self.session.complete_turn().map(|next| {
                self.session = next;
                match self.session.winner() {
                    Some(winner) if self.session.is_finished() => {
                        info!(%winner, banner = self.session.banner(), "battle decided");
                    }
                    _ => self.turn_started(),
                }
            }),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = ?event.kind, error = %e, "timer event ignored");
                false
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn schedule(&mut self, delay: std::time::Duration, kind: TimerKind) -> TimerId {
        let event = TimerEvent {
            epoch: self.epoch,
            kind,
        };
        debug!(?kind, delay_ms = delay.as_millis() as u64, "timer scheduled");
        self.scheduler.schedule(delay, event)
    }

    fn reset_timers(&mut self) {
        self.scheduler.cancel_all();
        self.auto_timer = None;
        self.epoch += 1;
    }

    fn apply_selection(&mut self, next: BattleSession) {
        if let Some((id, _)) = self.auto_timer.take() {
            self.scheduler.cancel(id);
        }
        self.session = next;
        self.schedule(self.config.timing.attack_animation(), TimerKind::ResolveAttack);
    }

    fn turn_started(&mut self) {
        if let Phase::WaitingForMove(owner) = self.session.phase() {
            if self.mode(owner) == ControlMode::Automatic {
                self.schedule_auto_move(owner);
            }
        }
    }

    fn schedule_auto_move(&mut self, side: Side) {
        if self.auto_timer.is_some() {
            return;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let id = self.schedule(
            self.config.timing.auto_move_delay(),
            TimerKind::AutoMove { side, ticket },
        );
        self.auto_timer = Some((id, ticket));
    }

    fn auto_move(&mut self, side: Side) -> std::result::Result<(), TurnError> {
        if self.mode(side) != ControlMode::Automatic {
            return Err(TurnError::UnexpectedPhase {
                operation: "pick a move for a manual side",
                phase: self.session.phase(),
            });
        }
        let index = self.rng.pick_index(MAX_MOVES);
        let slot = MoveSlot::new(index).ok_or(TurnError::SlotOutOfRange(index))?;
        let next = self.session.select_move(side, slot)?;
        debug!(%side, slot = index, "automatic move picked");
        self.apply_selection(next);
        Ok(())
    }
}

// ============================================================================
// Virtual time helpers
// ============================================================================

impl<R, H> BattleController<VirtualScheduler<TimerEvent>, R, H>
where
    R: RandomSource,
    H: HistoryStore,
{
    /// Advance the virtual clock by `by`, handling every event that falls
    /// due, including ones scheduled along the way. Returns the number of
    /// events applied.
    pub fn advance(&mut self, by: std::time::Duration) -> usize {
        let target = self.scheduler.now() + by;
        let mut applied = 0;
        while let Some(wait) = self.scheduler.next_due_in() {
            if self.scheduler.now() + wait > target {
                break;
            }
            if let Some(event) = self.scheduler.advance_to_next() {
                applied += usize::from(self.handle(event));
            }
        }
        let rest = target.saturating_sub(self.scheduler.now());
        self.scheduler.advance(rest);
        applied
    }

    /// Handle events until none are pending or `max_events` have fired.
    ///
    /// Stops early when the battle waits on manual input. Returns the number
    /// of events applied.
    pub fn run_until_quiet(&mut self, max_events: usize) -> usize {
        let mut applied = 0;
        for _ in 0..max_events {
            let Some(event) = self.scheduler.advance_to_next() else {
                break;
            };
            applied += usize::from(self.handle(event));
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BaseStats, CreatureConfig};
    use crate::history::MemoryHistory;
    use crate::moves::Move;
    use crate::rng::ScriptedRandom;
    use crate::types::Type;
    use std::time::Duration;

    type TestController = BattleController<VirtualScheduler<TimerEvent>, ScriptedRandom, MemoryHistory>;

    fn creature(name: &str) -> Creature {
        CreatureConfig::new(name.to_lowercase())
            .name(name)
            .level(50)
            .types([Type::Normal])
            .stats(BaseStats::new(95, 55, 95, 55, 50, 50))
            .moves(vec![
                Move::new("tackle", "Tackle", Type::Normal, 50),
                Move::new("slam", "Slam", Type::Normal, 50),
                Move::new("strike", "Strike", Type::Normal, 50),
                Move::new("pound", "Pound", Type::Normal, 50),
            ])
            .unwrap()
            .build()
            .unwrap()
    }

    fn controller_with(config: BattleConfig, draws: &[f64]) -> TestController {
        BattleController::new(
            config,
            VirtualScheduler::new(),
            ScriptedRandom::new(draws.to_vec()),
            MemoryHistory::new(),
        )
    }

    fn controller(config: BattleConfig) -> TestController {
        // Resolving draws: no crit, full spread
        controller_with(config, &[0.5, 0.0])
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_entrance_timing() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        assert_eq!(ctl.session().phase(), Phase::Entrance);

        ctl.advance(ms(999));
        assert!(!ctl.session().is_revealed(Side::Player));
        ctl.advance(ms(1));
        assert!(ctl.session().is_revealed(Side::Player));
        ctl.advance(ms(1000));
        assert!(ctl.session().is_revealed(Side::Opponent));
        assert_eq!(ctl.session().phase(), Phase::Entrance);
        ctl.advance(ms(1000));
        assert_eq!(ctl.session().phase(), Phase::WaitingForMove(Side::Player));
        // Player is manual: nothing scheduled
        assert_eq!(ctl.pending_timers(), 0);
    }

    #[test]
    fn test_manual_select_then_auto_reply() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        ctl.advance(ms(3000));

        ctl.select_move_index(Side::Player, 1).unwrap();
        assert!(matches!(ctl.session().phase(), Phase::Resolving { .. }));

        ctl.advance(ms(500));
        assert_eq!(ctl.session().health(Side::Opponent), 60);
        ctl.advance(ms(500));
        assert_eq!(ctl.session().phase(), Phase::WaitingForMove(Side::Opponent));

        // Opponent picks after the automatic delay
        ctl.advance(ms(999));
        assert_eq!(ctl.session().phase(), Phase::WaitingForMove(Side::Opponent));
        ctl.advance(ms(1));
        assert!(matches!(
            ctl.session().phase(),
            Phase::Resolving {
                attacker: Side::Opponent,
                ..
            }
        ));
    }

    #[test]
    fn test_rejected_selection_changes_nothing() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        ctl.advance(ms(3000));
        let before = ctl.session().clone();

        assert!(ctl.select_move_index(Side::Opponent, 0).is_err());
        assert!(ctl.select_move_index(Side::Player, 7).is_err());
        assert_eq!(ctl.session(), &before);
        assert_eq!(ctl.pending_timers(), 0);
    }

    #[test]
    fn test_stale_event_ignored() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        let old_epoch = ctl.epoch();
        ctl.start(creature("Gamma"), creature("Delta")).unwrap();

        let stale = TimerEvent {
            epoch: old_epoch,
            kind: TimerKind::ShowPlayer,
        };
        assert!(!ctl.handle(stale));
        assert!(!ctl.session().is_revealed(Side::Player));
        // Only the new session's first beat is pending
        assert_eq!(ctl.pending_timers(), 1);
    }

    #[test]
    fn test_set_automatic_schedules_and_cancels() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        ctl.advance(ms(3000));

        ctl.set_automatic(Side::Player, true);
        assert_eq!(ctl.pending_timers(), 1);
        ctl.set_automatic(Side::Player, false);
        assert_eq!(ctl.pending_timers(), 0);

        ctl.set_automatic(Side::Player, true);
        ctl.advance(ms(1000));
        assert!(matches!(
            ctl.session().phase(),
            Phase::Resolving {
                attacker: Side::Player,
                ..
            }
        ));
    }

    #[test]
    fn test_withdrawn_auto_pick_keeps_live_timer() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        ctl.advance(ms(3000));

        // First pick is withdrawn, second one is live
        ctl.set_automatic(Side::Player, true);
        ctl.set_automatic(Side::Player, false);
        ctl.set_automatic(Side::Player, true);
        assert_eq!(ctl.pending_timers(), 1);

        // The withdrawn pick arrives anyway
        let late = TimerEvent {
            epoch: ctl.epoch(),
            kind: TimerKind::AutoMove {
                side: Side::Player,
                ticket: 0,
            },
        };
        assert!(!ctl.handle(late));
        assert_eq!(ctl.session().phase(), Phase::WaitingForMove(Side::Player));

        // A manual pick still cancels the live timer
        ctl.select_move_index(Side::Player, 0).unwrap();
        assert_eq!(ctl.pending_timers(), 1);
        ctl.advance(ms(500));
        assert_eq!(ctl.session().health(Side::Opponent), 60);
        assert_eq!(ctl.advance(ms(500)), 1);
        assert_eq!(ctl.session().phase(), Phase::WaitingForMove(Side::Opponent));
    }

    #[test]
    fn test_full_auto_battle_and_end() {
        let mut config = BattleConfig::default();
        config.player_auto = true;
        // Every turn draws pick, crit, spread: slot 0, no crit, full spread
        let mut ctl = controller_with(config, &[0.0, 0.5, 0.0]);
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();

        ctl.run_until_quiet(1000);
        let session = ctl.session();
        assert!(session.is_finished());
        // 40 per hit and the player strikes first, so the player lands the
        // third hit before taking a third
        assert_eq!(session.winner(), Some(Side::Player));
        assert_eq!(session.health(Side::Opponent), 0);
        assert_eq!(session.health(Side::Player), 20);
        assert_eq!(session.banner(), "Alpha wins!");

        let record = ctl.end_session().unwrap();
        assert_eq!((record.winner.as_str(), record.loser.as_str()), ("Alpha", "Beta"));
        assert!(ctl.end_session().is_none());
        assert_eq!(ctl.records().len(), 1);
        assert_eq!(ctl.history().records().len(), 1);
        assert!(ctl.session().is_idle());
    }

    #[test]
    fn test_teardown_cancels_timers() {
        let mut ctl = controller(BattleConfig::default());
        ctl.start(creature("Alpha"), creature("Beta")).unwrap();
        ctl.teardown();
        assert_eq!(ctl.pending_timers(), 0);
        assert_eq!(ctl.advance(ms(10_000)), 0);
        assert_eq!(ctl.session().phase(), Phase::Entrance);
    }
}
