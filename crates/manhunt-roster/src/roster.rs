//! The roster: active players, their roles, and the derived team cache.
//!
//! # Concurrency note
//!
//! `Roster` is NOT thread-safe by itself — it uses plain `HashMap`s, not
//! concurrent ones. This is intentional: the roster is owned by a single
//! task (the engine actor) and all mutation flows through that actor's
//! command channel. Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use manhunt_core::{PlayerId, Role};

use crate::{PlayerEntry, RosterError, TeamCounts};

/// How long a built team list stays servable before the next read
/// rebuilds it. Purely a read-path optimization: any mutation drops the
/// cache immediately regardless of age.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(250);

/// Memoized team lists derived from the roster.
///
/// Lists are kept sorted by player id so iteration order is stable —
/// auto-assignment at match start depends on "first unassigned player"
/// being deterministic.
struct TeamCache {
    hunters: Vec<PlayerId>,
    runners: Vec<PlayerId>,
    spectators: Vec<PlayerId>,
    built_at: Instant,
}

/// The active-player roster plus the disconnected-roles table.
///
/// ## Ownership
///
/// Exactly one component (the engine actor) owns the roster; everything
/// else reads through the engine's public contract. The roster never
/// decides phase semantics — whether a removal is a concession, a
/// disconnect, or a plain leave is the engine's call.
pub struct Roster {
    /// Connected players, keyed by id. A player appears here or in
    /// `disconnected`, never both.
    entries: HashMap<PlayerId, PlayerEntry>,

    /// Last-held role of players who dropped mid-match. Cleared on
    /// rejoin or session reset.
    disconnected: HashMap<PlayerId, Role>,

    cache: Option<TeamCache>,
    cache_ttl: Duration,
}

impl Roster {
    /// Creates an empty roster with the default cache window.
    pub fn new() -> Self {
        Self::with_cache_ttl(DEFAULT_CACHE_TTL)
    }

    /// Creates an empty roster with a custom cache window.
    /// A zero duration effectively disables the cache (every read rebuilds).
    pub fn with_cache_ttl(cache_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            disconnected: HashMap::new(),
            cache: None,
            cache_ttl,
        }
    }

    // -- Mutations ---------------------------------------------------------

    /// Inserts or overwrites a player's entry with the given role.
    ///
    /// Returns the previous role if the player was already on the roster.
    /// Overwriting resets the pin — a fresh join is a fresh choice.
    pub fn add(&mut self, player: PlayerId, role: Role) -> Option<Role> {
        let old = self.entries.insert(player, PlayerEntry::new(role));
        self.invalidate();
        tracing::debug!(%player, %role, "roster add");
        old.map(|e| e.role)
    }

    /// Changes a player's role. Returns the previous role.
    ///
    /// No phase guard here — the engine checks the session phase before
    /// calling, because only it knows whether this is a player request,
    /// auto-assignment, or an admin override.
    pub fn set_role(&mut self, player: PlayerId, role: Role) -> Result<Role, RosterError> {
        let entry = self
            .entries
            .get_mut(&player)
            .ok_or(RosterError::UnknownPlayer(player))?;
        let old = entry.role;
        entry.role = role;
        self.invalidate();
        tracing::debug!(%player, from = %old, to = %role, "role changed");
        Ok(old)
    }

    /// Pins or unpins a player's role against auto-assignment.
    pub fn set_pinned(&mut self, player: PlayerId, pinned: bool) -> Result<(), RosterError> {
        let entry = self
            .entries
            .get_mut(&player)
            .ok_or(RosterError::UnknownPlayer(player))?;
        entry.pinned = pinned;
        // Pinning doesn't change team composition, but invalidating
        // anyway keeps the rule simple: every mutation drops the cache.
        self.invalidate();
        Ok(())
    }

    /// Removes a player outright (intentional leave while not running).
    pub fn remove(&mut self, player: PlayerId) -> Result<PlayerEntry, RosterError> {
        let entry = self
            .entries
            .remove(&player)
            .ok_or(RosterError::UnknownPlayer(player))?;
        self.invalidate();
        tracing::debug!(%player, "roster remove");
        Ok(entry)
    }

    /// Moves a player's role to the disconnected table (mid-match drop).
    ///
    /// The entry leaves the active roster, which upholds the invariant
    /// that a disconnected-role record exists only for players who are
    /// not currently present.
    pub fn mark_disconnected(&mut self, player: PlayerId) -> Result<Role, RosterError> {
        let entry = self
            .entries
            .remove(&player)
            .ok_or(RosterError::UnknownPlayer(player))?;
        self.disconnected.insert(player, entry.role);
        self.invalidate();
        tracing::info!(%player, role = %entry.role, "player disconnected, role retained for rejoin");
        Ok(entry.role)
    }

    /// Takes the stored role for a rejoining player, removing the record.
    ///
    /// The caller (engine) re-adds the player with the returned role.
    pub fn take_disconnected(&mut self, player: PlayerId) -> Result<Role, RosterError> {
        self.disconnected
            .remove(&player)
            .ok_or(RosterError::NoDisconnectedRole(player))
    }

    /// Clears everything: entries, disconnected roles, and the cache.
    /// Called on session reset.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.disconnected.clear();
        self.cache = None;
        tracing::debug!("roster cleared");
    }

    // -- Reads -------------------------------------------------------------

    /// A player's current role, if they are on the active roster.
    pub fn role_of(&self, player: PlayerId) -> Option<Role> {
        self.entries.get(&player).map(|e| e.role)
    }

    /// Whether a player's role is pinned against auto-assignment.
    pub fn is_pinned(&self, player: PlayerId) -> bool {
        self.entries.get(&player).is_some_and(|e| e.pinned)
    }

    /// Whether a player is on the active roster.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.entries.contains_key(&player)
    }

    /// The stored role of a disconnected player, without consuming it.
    pub fn disconnected_role(&self, player: PlayerId) -> Option<Role> {
        self.disconnected.get(&player).copied()
    }

    /// Whether any disconnected player last held the given role.
    pub fn has_disconnected(&self, role: Role) -> bool {
        self.disconnected.values().any(|r| *r == role)
    }

    /// All player ids with the given role, sorted by id.
    ///
    /// Served from the cache when it is fresh; rebuilt otherwise. The
    /// cache can only ever be stale by age, never by content — every
    /// mutation drops it synchronously.
    pub fn all_with_role(&mut self, role: Role) -> Vec<PlayerId> {
        let cache = self.fresh_cache();
        match role {
            Role::Hunter => cache.hunters.clone(),
            Role::Runner => cache.runners.clone(),
            Role::Spectator => cache.spectators.clone(),
        }
    }

    /// Current team sizes, served from the cache.
    pub fn counts(&mut self) -> TeamCounts {
        let cache = self.fresh_cache();
        TeamCounts {
            hunters: cache.hunters.len(),
            runners: cache.runners.len(),
            spectators: cache.spectators.len(),
        }
    }

    /// Number of players on the active roster.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no players are on the active roster.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All active player ids, sorted.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.entries.keys().copied().collect();
        ids.sort_by_key(|p| p.0);
        ids
    }

    // -- Internals ---------------------------------------------------------

    /// Drops the cache. Called from every mutation — never from a timer.
    fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Returns a fresh cache, rebuilding it if missing or past its window.
    fn fresh_cache(&mut self) -> &TeamCache {
        let expired = self
            .cache
            .as_ref()
            .is_none_or(|c| c.built_at.elapsed() > self.cache_ttl);

        if expired {
            let mut hunters = Vec::new();
            let mut runners = Vec::new();
            let mut spectators = Vec::new();
            for (player, entry) in &self.entries {
                match entry.role {
                    Role::Hunter => hunters.push(*player),
                    Role::Runner => runners.push(*player),
                    Role::Spectator => spectators.push(*player),
                }
            }
            hunters.sort_by_key(|p| p.0);
            runners.sort_by_key(|p| p.0);
            spectators.sort_by_key(|p| p.0);
            self.cache = Some(TeamCache {
                hunters,
                runners,
                spectators,
                built_at: Instant::now(),
            });
        }

        self.cache.as_ref().expect("cache was just rebuilt")
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
