//! Respawn ticket bookkeeping.
//!
//! This module owns the data only — *when* timers fire is the engine
//! actor's business (it holds the timer registry). Keeping the table pure
//! makes the duration arithmetic trivially testable.
//!
//! Timestamps use `tokio::time::Instant` rather than `std::time::Instant`
//! so that paused-clock tests can advance time deterministically.

use std::collections::HashMap;
use std::time::Duration;

use manhunt_core::{PlayerId, Position};
use tokio::time::Instant;

/// Bookkeeping for one dead runner serving a respawn countdown.
#[derive(Debug, Clone)]
pub struct RespawnTicket {
    /// When the death was recorded.
    pub died_at: Instant,
    /// Full death-to-respawn duration for this ticket.
    pub duration: Duration,
    /// Where the player died, if the spatial layer could tell us.
    /// Used to put them back on respawn.
    pub death_position: Option<Position>,
}

impl RespawnTicket {
    /// Seconds until this ticket's respawn is due, rounded up.
    /// Zero once the duration has fully elapsed.
    pub fn remaining_secs(&self) -> u32 {
        let elapsed = self.died_at.elapsed();
        if elapsed >= self.duration {
            0
        } else {
            (self.duration - elapsed).as_secs_f64().ceil() as u32
        }
    }

    /// Time left until the respawn is due, `None` if already elapsed.
    pub fn remaining(&self) -> Option<Duration> {
        let elapsed = self.died_at.elapsed();
        (elapsed < self.duration).then(|| self.duration - elapsed)
    }
}

/// The table of active respawn tickets, one per dead runner.
///
/// Invariant: at most one ticket per player. `insert` replaces, so the
/// invariant holds even under duplicate death reports — the engine pairs
/// every replace with a timer-registry replace.
#[derive(Default)]
pub struct RespawnTable {
    tickets: HashMap<PlayerId, RespawnTicket>,
}

impl RespawnTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) a ticket for a freshly reported death.
    /// Returns `true` if a previous ticket was replaced.
    pub fn insert(
        &mut self,
        player: PlayerId,
        duration: Duration,
        death_position: Option<Position>,
    ) -> bool {
        self.tickets
            .insert(
                player,
                RespawnTicket {
                    died_at: Instant::now(),
                    duration,
                    death_position,
                },
            )
            .is_some()
    }

    /// Removes and returns a player's ticket.
    pub fn remove(&mut self, player: PlayerId) -> Option<RespawnTicket> {
        self.tickets.remove(&player)
    }

    /// Borrows a player's ticket.
    pub fn get(&self, player: PlayerId) -> Option<&RespawnTicket> {
        self.tickets.get(&player)
    }

    /// Rewrites the duration on an existing ticket, keeping `died_at`.
    /// Returns the ticket's new remaining time, or `None` if the player
    /// has no ticket or the new duration has already elapsed (the caller
    /// should respawn them immediately in that case).
    pub fn reschedule(&mut self, player: PlayerId, duration: Duration) -> Option<Duration> {
        let ticket = self.tickets.get_mut(&player)?;
        ticket.duration = duration;
        ticket.remaining()
    }

    /// Whether a player currently has a ticket.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.tickets.contains_key(&player)
    }

    /// Seconds until a player's respawn, `None` if they have no ticket.
    pub fn remaining_secs(&self, player: PlayerId) -> Option<u32> {
        self.tickets.get(&player).map(RespawnTicket::remaining_secs)
    }

    /// All ticketed players.
    pub fn players(&self) -> Vec<PlayerId> {
        self.tickets.keys().copied().collect()
    }

    /// Number of active tickets.
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// `true` if no tickets are active.
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Drops every ticket (match end / reset).
    pub fn clear(&mut self) {
        self.tickets.clear();
    }
}

// =========================================================================
// Tests
// =========================================================================
