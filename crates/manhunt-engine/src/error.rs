//! Error types for the engine layer.

use manhunt_core::SessionPhase;
use manhunt_roster::RosterError;

/// Errors surfaced by engine operations.
///
/// These are *refusals*: invariant violations rejected synchronously with
/// a reason the caller can show the player. Collaborator failures never
/// appear here; they are logged at the call site and degrade to "no
/// information this tick".
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A roster-level problem (unknown player, no stored role).
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// A player asked to change role outside the waiting phase.
    /// Only the rejoin and admin-override paths bypass this.
    #[error("role changes are locked during the match")]
    RolesLocked,

    /// A forced transition was requested from the wrong phase.
    #[error("cannot {action} while session is {actual}")]
    InvalidPhase {
        action: &'static str,
        actual: SessionPhase,
    },

    /// The engine actor is gone (shut down or channel closed).
    #[error("the session engine is unavailable")]
    Unavailable,
}
