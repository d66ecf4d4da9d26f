//! Win-condition evaluation.
//!
//! Pure function over a snapshot of session state. The engine calls
//! [`evaluate`] after every event that can decide a match: a death, a
//! departure, a concession, a respawn reversal. Objective completion does
//! not come through here — it ends the match directly, before any roster
//! arithmetic could argue.
//!
//! Hunters are checked before runners, so in the degenerate case where
//! both sides empty out in the same command, the hunters' claim wins.

use std::collections::HashSet;

use manhunt_core::{PlayerId, Team, WinRecord, WinTrigger};

/// A snapshot of everything win evaluation looks at.
///
/// Team lists contain rostered, connected players only; a disconnected
/// player is off their team list until they rejoin. The `dead` set covers
/// both ticketed runners and down hunters.
pub struct WinInputs<'a> {
    /// Connected hunters.
    pub hunters: &'a [PlayerId],
    /// Connected runners.
    pub runners: &'a [PlayerId],
    /// Every player currently dead, regardless of role.
    pub dead: &'a HashSet<PlayerId>,
    /// Dead hunters with an instant respawn already scheduled.
    /// These are down, not out, and do not count toward elimination.
    pub hunter_respawn_pending: &'a HashSet<PlayerId>,
    /// Whether a runner was ever fielded this match. Guards against
    /// declaring a hunter win over a team that never existed.
    pub runner_ever_joined: bool,
}

/// Decides whether the match is over, and if so how.
///
/// Returns `None` while the match should continue. Ticketed runners count
/// as dead here: a hunter win by elimination requires every runner down
/// *simultaneously*, pending respawns notwithstanding.
pub fn evaluate(inputs: &WinInputs<'_>) -> Option<WinRecord> {
    // Hunters win: every runner gone, or every runner simultaneously dead.
    if inputs.runners.is_empty() {
        if inputs.runner_ever_joined {
            return Some(WinRecord {
                winner: Some(Team::Hunters),
                trigger: WinTrigger::Abandoned,
            });
        }
    } else if inputs.runners.iter().all(|r| inputs.dead.contains(r)) {
        return Some(WinRecord {
            winner: Some(Team::Hunters),
            trigger: WinTrigger::Eliminated,
        });
    }

    // Runners win: every hunter gone, or every hunter out for the round.
    if inputs.hunters.is_empty() {
        return Some(WinRecord {
            winner: Some(Team::Runners),
            trigger: WinTrigger::Abandoned,
        });
    }
    let all_hunters_out = inputs.hunters.iter().all(|h| {
        inputs.dead.contains(h) && !inputs.hunter_respawn_pending.contains(h)
    });
    if all_hunters_out {
        return Some(WinRecord {
            winner: Some(Team::Runners),
            trigger: WinTrigger::Eliminated,
        });
    }

    None
}
