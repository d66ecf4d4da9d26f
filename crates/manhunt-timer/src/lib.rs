//! Keyed, cancellable timer tasks for the Manhunt orchestrator.
//!
//! The orchestrator runs many logically concurrent timers at once: one
//! respawn pair (firing + countdown display) per dead runner, one proximity
//! scan, one start countdown, one reset countdown. Each is a plain Tokio
//! task that does nothing but sleep and send a message back into the engine
//! actor's command channel — all state mutation happens in the actor, on a
//! single logical timeline.
//!
//! Cancellation is a registry lookup, not closure-variable mutation: every
//! spawned timer is stored in a [`TaskRegistry`] under an explicit key, so
//! replacing or cancelling a timer can never leave a dangling callback
//! firing against a player whose role has since changed.
//!
//! # Integration
//!
//! ```ignore
//! let mut timers = TaskRegistry::new();
//! timers.insert(
//!     TimerKey::Respawn(player),
//!     send_after(duration, tx.clone(), Command::RespawnFired(player)),
//! );
//! // ... later, on role change away from Runner:
//! timers.cancel(&TimerKey::Respawn(player));
//! timers.cancel(&TimerKey::RespawnTicker(player));
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::trace;

// ---------------------------------------------------------------------------
// Task registry
// ---------------------------------------------------------------------------

/// A registry of running timer tasks, keyed by an explicit identifier.
///
/// Inserting under an occupied key aborts the previous task first, so the
/// "at most one timer per key" invariant holds even under duplicate event
/// delivery. Cancelling an absent key is a no-op — cancellation is always
/// idempotently safe.
///
/// Dropping the registry aborts every remaining task; timers never outlive
/// the component that scheduled them.
pub struct TaskRegistry<K: Eq + Hash> {
    tasks: HashMap<K, JoinHandle<()>>,
}

impl<K: Eq + Hash> TaskRegistry<K> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    /// Registers a task under `key`, aborting any task already there.
    pub fn insert(&mut self, key: K, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.insert(key, handle) {
            old.abort();
            trace!("replaced existing timer task");
        }
    }

    /// Aborts and removes the task under `key`.
    ///
    /// Returns `true` if a task was actually cancelled. Safe to call any
    /// number of times.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.tasks.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every registered task.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Cancels every task whose key matches the predicate.
    /// Used to purge one subsystem's timers (e.g. all respawn pairs) while
    /// leaving the rest running.
    pub fn cancel_matching(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.tasks.retain(|key, handle| {
            if pred(key) {
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    /// Whether a task is registered under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.tasks.contains_key(key)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` if no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<K: Eq + Hash> Default for TaskRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Drop for TaskRegistry<K> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// ---------------------------------------------------------------------------
// Timer spawners
// ---------------------------------------------------------------------------

/// Spawns a one-shot timer: after `delay`, send `msg` into `tx`.
///
/// If the receiver is gone by then (engine shut down), the message is
/// silently dropped — a timer must never keep a dead engine alive or panic.
pub fn send_after<T: Send + 'static>(
    delay: Duration,
    tx: mpsc::Sender<T>,
    msg: T,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(delay).await;
        if tx.send(msg).await.is_err() {
            trace!("one-shot timer target gone, dropping message");
        }
    })
}

/// Spawns a repeating timer: every `period`, send a clone of `msg` into `tx`.
///
/// The first message fires one full period after spawning. Missed ticks are
/// skipped rather than bunched up — if the engine stalls past a deadline,
/// the timer resumes from now instead of flooding the channel with
/// catch-up ticks.
///
/// `initial_jitter` (zero to disable) delays the start by a random amount
/// to desynchronize timers created at the same instant.
pub fn send_every<T: Clone + Send + 'static>(
    period: Duration,
    initial_jitter: Duration,
    tx: mpsc::Sender<T>,
    msg: T,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !initial_jitter.is_zero() {
            let max_us = initial_jitter.as_micros() as u64;
            let us = rand::rng().random_range(0..max_us);
            time::sleep(Duration::from_micros(us)).await;
        }

        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; consume it so
        // the first message goes out after one full period.
        interval.tick().await;

        loop {
            interval.tick().await;
            if tx.send(msg.clone()).await.is_err() {
                trace!("repeating timer target gone, stopping");
                break;
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Countdown cadence
// ---------------------------------------------------------------------------

/// Whether a reset-countdown second should be announced.
///
/// The reset countdown is long (minutes), so broadcasting every second
/// would be noise. Checkpoints: every full minute, then every second in
/// the final ten. Zero itself is the transition, not an announcement.
pub fn announce_reset_tick(remaining: u32) -> bool {
    remaining > 0 && (remaining % 60 == 0 || remaining <= 10)
}

/// Whether a respawn-countdown second gets the emphasized cue.
/// The final three seconds are urgent.
pub fn urgent_respawn_tick(remaining: u32) -> bool {
    remaining > 0 && remaining <= 3
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Time-dependent tests run with Tokio's paused clock
    //! (`start_paused = true`): sleeps resolve instantly once the runtime
    //! has no other work, and the clock advances deterministically.
    //! No real waiting, no flakiness.

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B(u64),
    }

    // =====================================================================
    // TaskRegistry
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_insert_same_key_aborts_previous_task() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut registry = TaskRegistry::new();

        // Two timers under the same key: only the second may fire.
        registry.insert(Key::A, send_after(Duration::from_secs(5), tx.clone(), 1u32));
        registry.insert(Key::A, send_after(Duration::from_secs(5), tx.clone(), 2u32));

        time::sleep(Duration::from_secs(6)).await;

        assert_eq!(rx.recv().await, Some(2));
        assert!(rx.try_recv().is_err(), "replaced timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing_and_is_idempotent() {
        let (tx, mut rx) = mpsc::channel::<u32>(8);
        let mut registry = TaskRegistry::new();
        registry.insert(Key::A, send_after(Duration::from_secs(5), tx, 1));

        assert!(registry.cancel(&Key::A));
        assert!(!registry.cancel(&Key::A), "second cancel is a clean no-op");

        time::sleep(Duration::from_secs(6)).await;
        assert!(rx.try_recv().is_err(), "cancelled timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_matching_purges_only_selected_keys() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut registry = TaskRegistry::new();
        registry.insert(Key::B(1), send_after(Duration::from_secs(2), tx.clone(), 1u32));
        registry.insert(Key::B(2), send_after(Duration::from_secs(2), tx.clone(), 2u32));
        registry.insert(Key::A, send_after(Duration::from_secs(2), tx.clone(), 99u32));

        registry.cancel_matching(|k| matches!(k, Key::B(_)));

        assert_eq!(registry.len(), 1);
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.recv().await, Some(99));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_drop_aborts_tasks() {
        let (tx, mut rx) = mpsc::channel::<u32>(8);
        {
            let mut registry = TaskRegistry::new();
            registry.insert(Key::A, send_after(Duration::from_secs(1), tx, 1));
        } // dropped here

        time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err(), "dropped registry must abort timers");
    }

    // =====================================================================
    // send_after / send_every
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_send_after_fires_once_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let _h = send_after(Duration::from_secs(3), tx, 7u32);

        time::sleep(Duration::from_secs(4)).await;

        assert_eq!(rx.recv().await, Some(7));
        assert!(rx.try_recv().is_err(), "one-shot must fire exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_every_fires_once_per_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let h = send_every(Duration::from_secs(1), Duration::ZERO, tx, ());

        time::sleep(Duration::from_millis(3500)).await;
        h.abort();

        let mut fired = 0;
        while rx.try_recv().is_ok() {
            fired += 1;
        }
        assert_eq!(fired, 3, "3.5 periods elapsed, first tick after one period");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_every_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel::<()>(1);
        let h = send_every(Duration::from_secs(1), Duration::ZERO, tx, ());
        drop(rx);

        time::sleep(Duration::from_secs(3)).await;

        assert!(h.is_finished(), "timer task must exit once its target is gone");
    }

    // =====================================================================
    // Cadence helpers
    // =====================================================================

    #[test]
    fn test_announce_reset_tick_minute_checkpoints() {
        assert!(announce_reset_tick(300));
        assert!(announce_reset_tick(240));
        assert!(announce_reset_tick(60));
        assert!(!announce_reset_tick(299));
        assert!(!announce_reset_tick(61));
    }

    #[test]
    fn test_announce_reset_tick_final_ten_seconds() {
        for s in 1..=10 {
            assert!(announce_reset_tick(s), "second {s} must be announced");
        }
        assert!(!announce_reset_tick(11));
        assert!(!announce_reset_tick(0), "zero is the transition, not a tick");
    }

    #[test]
    fn test_urgent_respawn_tick_final_three_seconds() {
        assert!(!urgent_respawn_tick(4));
        assert!(urgent_respawn_tick(3));
        assert!(urgent_respawn_tick(1));
        assert!(!urgent_respawn_tick(0));
    }
}
