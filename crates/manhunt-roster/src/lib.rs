//! Player roster and role bookkeeping for Manhunt.
//!
//! This crate owns three of the orchestrator's shared aggregates:
//!
//! 1. **Roster** — who is connected and which role they hold
//! 2. **Role cache** — short-lived memoized team lists derived from the
//!    roster, invalidated on every mutation (never by timer alone)
//! 3. **Disconnected roles** — the last-held role of players who dropped
//!    mid-match, kept so a rejoin can restore them
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)  ← enforces phase guards, decides WHAT a removal means
//!     ↕
//! Roster (this crate)  ← executes mutations, keeps the cache coherent
//! ```
//!
//! The roster itself is phase-agnostic: it exposes plain mutations and the
//! engine — the single owner of the session phase — picks which one to call.
//! Keeping the guard logic in one place avoids the roster and the engine
//! disagreeing about what "locked" means.

mod entry;
mod error;
mod roster;

pub use entry::{PlayerEntry, TeamCounts};
pub use error::RosterError;
pub use roster::{Roster, DEFAULT_CACHE_TTL};
