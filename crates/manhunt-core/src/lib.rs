//! Core vocabulary for the Manhunt orchestrator.
//!
//! This crate defines every type that crosses a component boundary — player
//! identity, roles, the session phase machine, spatial primitives, and the
//! structured events the orchestrator emits to its collaborators (UI and
//! economy/statistics).
//!
//! Nothing in here does any work: these are plain data types plus the small
//! pure helpers that belong with them (phase transition legality, per-role
//! behavior lookup, proximity tier ordering). The heavy lifting lives in
//! `manhunt-engine`.

mod events;
mod types;

pub use events::{Notice, Stat, WinRecord, WinTrigger};
pub use types::{
    PlayerId, Position, ProximityTier, RespawnPolicy, Role, SessionPhase, Team, WorldId,
    CHUNK_BLOCKS,
};
