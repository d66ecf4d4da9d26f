//! Error types for the roster layer.

use manhunt_core::PlayerId;

/// Errors that can occur during roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The player is not on the active roster.
    /// Happens when mutating a player who never joined, already left,
    /// or was moved to the disconnected-roles table.
    #[error("player {0} is not on the roster")]
    UnknownPlayer(PlayerId),

    /// No disconnected role is stored for this player, so there is
    /// nothing to restore on rejoin. Callers fall through to normal
    /// join handling.
    #[error("no disconnected role stored for player {0}")]
    NoDisconnectedRole(PlayerId),
}
