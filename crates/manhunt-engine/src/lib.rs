//! The Manhunt orchestration engine.
//!
//! One engine actor runs in its own Tokio task and owns every piece of
//! mutable session state: the roster, the respawn table, the proximity
//! map, and the lifecycle phase. The outside world — connection handlers,
//! admin commands, timers — talks to it exclusively through an mpsc
//! command channel. This is the "actor model": no shared mutable state,
//! just message passing, which gives the ordering guarantee the session
//! needs for free (roster mutation → cache invalidation → win/start check
//! happen atomically per command, and no command ever observes a
//! half-updated roster).
//!
//! # Key types
//!
//! - [`EngineHandle`] — send commands to the running engine actor
//! - [`EngineConfig`] — every tunable the orchestrator has
//! - [`SpatialQuery`] — the trait the embedding server implements for
//!   positions, distance, and teleportation
//! - [`EventBus`] / [`EventStreams`] — outbound notice/stat channels

mod bus;
mod config;
mod engine;
mod error;
mod proximity;
mod respawn;
mod spatial;
mod win;

pub use bus::{EventBus, EventStreams};
pub use config::{EngineConfig, ProximityConfig};
pub use engine::{spawn_engine, EngineHandle, JoinOutcome, SessionInfo};
pub use error::EngineError;
pub use proximity::classify_distance;
pub use respawn::{RespawnTable, RespawnTicket};
pub use spatial::{SpatialError, SpatialQuery};
pub use win::{evaluate, WinInputs};
