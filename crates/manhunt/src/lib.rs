//! # Manhunt
//!
//! A session orchestrator for asymmetric hunt matches: one shared session
//! that cycles Waiting → Starting → Running → Ended and back, with a
//! hunter team chasing a runner team while spectators watch.
//!
//! The crate family:
//!
//! - `manhunt-core` — shared vocabulary: ids, roles, phases, events
//! - `manhunt-roster` — who is playing what, plus the derived team cache
//! - `manhunt-timer` — keyed cancellable timer tasks
//! - `manhunt-engine` — the actor that owns all session state
//! - `manhunt` (this crate) — the facade: wiring, event fan-out, prelude
//!
//! # Quick start
//!
//! Implement [`SpatialQuery`] over your world, build an [`Orchestrator`],
//! and drive it through the [`EngineHandle`](manhunt_engine::EngineHandle)
//! it exposes. Session events come back through the sinks you register.
//! See `examples/quick_match.rs` for a complete scripted match.

mod error;
mod hub;
mod orchestrator;

pub use error::ManhuntError;
pub use hub::{EventHub, NoticeSink, SinkError, StatSink};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};

pub use manhunt_engine::{
    spawn_engine, EngineConfig, EngineError, EngineHandle, EventStreams, JoinOutcome,
    ProximityConfig, SessionInfo, SpatialError, SpatialQuery,
};

/// The types nearly every embedding needs.
pub mod prelude {
    pub use manhunt_core::{
        Notice, PlayerId, Position, ProximityTier, Role, SessionPhase, Stat, Team, WinRecord,
        WinTrigger, WorldId,
    };
    pub use manhunt_engine::{
        EngineConfig, EngineError, EngineHandle, JoinOutcome, SessionInfo, SpatialQuery,
    };
    pub use manhunt_roster::TeamCounts;

    pub use crate::{ManhuntError, NoticeSink, Orchestrator, StatSink};
}
