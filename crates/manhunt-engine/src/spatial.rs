//! The spatial collaborator boundary.
//!
//! The orchestrator never touches world data directly — terrain, chunk
//! loading, and spawn-point search belong to the embedding server. It
//! defines this one trait and asks three things of it: where a player is,
//! how far apart two positions are, and "put this player there".
//!
//! Implementations are expected to be fallible: a position read can race a
//! world unload, a teleport can target a missing entity. The engine treats
//! every failure as "no information this tick" — logged, never retried,
//! never allowed to abort a scan or a state transition.

use manhunt_core::{PlayerId, Position};

/// Errors a spatial implementation can report.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The player's position could not be read right now
    /// (not spawned, world unloading, transient entity lookup miss).
    #[error("no readable position for player {0}")]
    PositionUnavailable(PlayerId),

    /// The teleport was rejected or failed.
    #[error("teleport failed: {0}")]
    TeleportFailed(String),
}

/// Spatial queries the orchestrator needs from the embedding server.
///
/// `distance` and `same_world` have default implementations in terms of
/// [`Position`]; an implementation only overrides them if its geometry
/// differs (e.g. scaled nether-style coordinate spaces).
pub trait SpatialQuery: Send + 'static {
    /// The player's current position, if readable.
    fn locate(&self, player: PlayerId) -> Result<Position, SpatialError>;

    /// Moves a player to the given position.
    fn teleport(&self, player: PlayerId, pos: Position) -> Result<(), SpatialError>;

    /// Distance in blocks between two positions in the same world.
    fn distance(&self, a: &Position, b: &Position) -> f64 {
        a.distance(b)
    }

    /// Whether two positions are mutually reachable.
    fn same_world(&self, a: &Position, b: &Position) -> bool {
        a.same_world(b)
    }
}
