//! Roster entry types.

use manhunt_core::Role;

/// One connected player's roster record.
///
/// Created on first join. The entry stores only what the orchestrator
/// needs for bookkeeping — identity is the map key, everything else
/// (position, inventory, connection) belongs to external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEntry {
    /// The player's current role. Exactly one at a time.
    pub role: Role,

    /// Whether the role was explicitly pinned by the player or an admin.
    /// Pinned roles are exempt from auto-assignment at match start.
    pub pinned: bool,
}

impl PlayerEntry {
    /// A fresh, unpinned entry with the given role.
    pub fn new(role: Role) -> Self {
        Self { role, pinned: false }
    }
}

/// Team sizes at a point in time, served from the role cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamCounts {
    pub hunters: usize,
    pub runners: usize,
    pub spectators: usize,
}

impl TeamCounts {
    /// Hunters plus runners — the number that counts toward the
    /// minimum-players start check. Spectators never do.
    pub fn competitors(&self) -> usize {
        self.hunters + self.runners
    }
}
