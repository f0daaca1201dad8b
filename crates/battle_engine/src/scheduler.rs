//! Cancelable timers.
//!
//! A battle advances through delayed steps (entrance beats, animations,
//! automatic moves). Each step is scheduled as a typed event on a
//! [`Scheduler`] and handed back to the controller when it fires.
//!
//! - [`VirtualScheduler`] keeps a virtual clock that only moves when told
//!   to, so tests and instant runs are fully deterministic.
//! - [`TokioScheduler`] sleeps on the tokio timer and delivers fired events
//!   through an unbounded channel.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a scheduled event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Something that can run events after a delay.
pub trait Scheduler<E> {
    /// Schedule `event` to fire after `delay`.
    fn schedule(&mut self, delay: Duration, event: E) -> TimerId;

    /// Cancel a pending event. Returns false if it already fired or was
    /// cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;

    /// Cancel every pending event.
    fn cancel_all(&mut self);

    /// Number of events still pending.
    fn pending(&self) -> usize;
}

// ============================================================================
// Virtual clock
// ============================================================================

/// Deterministic scheduler over a virtual clock.
///
/// Events due at the same instant fire in scheduling order.
#[derive(Debug)]
pub struct VirtualScheduler<E> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), E>,
    due: HashMap<TimerId, Duration>,
}

impl<E> Default for VirtualScheduler<E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            due: HashMap::new(),
        }
    }
}

impl<E> VirtualScheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Delay until the next pending event
    pub fn next_due_in(&self) -> Option<Duration> {
        self.queue
            .keys()
            .next()
            .map(|(due, _)| due.saturating_sub(self.now))
    }

    /// Move the clock forward by `by`, returning every event that fell due,
    /// earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<E> {
        let target = self.now + by;
        let mut fired = Vec::new();
        while let Some(event) = self.pop_due(target) {
            fired.push(event);
        }
        self.now = target;
        fired
    }

    /// Jump to the next pending event and return it.
    pub fn advance_to_next(&mut self) -> Option<E> {
        let (due, _) = *self.queue.keys().next()?;
        self.pop_due(due)
    }

    fn pop_due(&mut self, limit: Duration) -> Option<E> {
        let key = *self.queue.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let event = self.queue.remove(&key)?;
        self.due.remove(&key.1);
        self.now = self.now.max(key.0);
        Some(event)
    }
}

impl<E> Scheduler<E> for VirtualScheduler<E> {
    fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.now + delay;
        self.queue.insert((due, id), event);
        self.due.insert(id, due);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.due.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    fn cancel_all(&mut self) {
        self.queue.clear();
        self.due.clear();
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

// ============================================================================
// Tokio timers
// ============================================================================

/// Scheduler backed by `tokio::time::sleep`.
///
/// Each event runs on its own task and is sent to the receiver returned by
/// [`TokioScheduler::new`] when its delay elapses. Cancelling aborts the
/// task. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler<E> {
    next_id: u64,
    tx: mpsc::UnboundedSender<(TimerId, E)>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl<E: Send + 'static> TokioScheduler<E> {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TimerId, E)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            tx,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Forget a timer that has fired. Call after receiving its event.
    pub fn acknowledge(&mut self, id: TimerId) {
        self.tasks.remove(&id);
    }
}

impl<E: Send + 'static> Scheduler<E> for TokioScheduler<E> {
    fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session was dropped
            let _ = tx.send((id, event));
        });
        self.tasks.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.tasks.remove(&id) {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.abort();
                live
            }
            None => false,
        }
    }

    fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl<E> Drop for TokioScheduler<E> {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_virtual_fires_in_order() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(ms(500), "b");
        sched.schedule(ms(100), "a");
        sched.schedule(ms(500), "c");

        assert_eq!(sched.advance(ms(99)), Vec::<&str>::new());
        assert_eq!(sched.advance(ms(1)), vec!["a"]);
        assert_eq!(sched.advance(ms(1000)), vec!["b", "c"]);
        assert_eq!(sched.now(), ms(1100));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_virtual_cancel() {
        let mut sched = VirtualScheduler::new();
        let a = sched.schedule(ms(10), 1);
        let b = sched.schedule(ms(20), 2);

        assert!(sched.cancel(a));
        assert!(!sched.cancel(a));
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.advance_to_next(), Some(2));
        assert!(!sched.cancel(b));
        assert_eq!(sched.advance_to_next(), None);
    }

    #[test]
    fn test_virtual_cancel_all() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(ms(10), 1);
        sched.schedule(ms(20), 2);
        sched.cancel_all();
        assert_eq!(sched.pending(), 0);
        assert!(sched.advance(ms(100)).is_empty());
    }

    #[test]
    fn test_virtual_advance_to_next_moves_clock() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(ms(250), ());
        assert_eq!(sched.next_due_in(), Some(ms(250)));
        sched.advance_to_next();
        assert_eq!(sched.now(), ms(250));

        // Relative to the new clock
        sched.schedule(ms(250), ());
        assert_eq!(sched.next_due_in(), Some(ms(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_delivers_after_delay() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let id = sched.schedule(ms(1000), "late");
        sched.schedule(ms(10), "early");

        let (first, event) = rx.recv().await.unwrap();
        assert_eq!(event, "early");
        sched.acknowledge(first);

        let (second, event) = rx.recv().await.unwrap();
        assert_eq!((second, event), (id, "late"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_cancel() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let doomed = sched.schedule(ms(10), 1);
        sched.schedule(ms(20), 2);
        assert!(sched.cancel(doomed));

        let (_, event) = rx.recv().await.unwrap();
        assert_eq!(event, 2);
    }
}
