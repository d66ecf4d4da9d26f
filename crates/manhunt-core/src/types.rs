//! Identity, role, phase, and spatial types shared by every layer.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// A newtype wrapper around `u64` so a player id can never be confused with
/// any other numeric id in a signature, and so it can be used directly as a
/// `HashMap` key.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`,
/// which is what the UI layer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a world (a mutually reachable region).
///
/// Two players can only be "near" each other if they share a world; the
/// proximity monitor treats different worlds as infinitely far apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles and teams
// ---------------------------------------------------------------------------

/// The three mutually exclusive roles a player can hold.
///
/// A player has exactly one role at a time. Role is freely mutable only
/// while the session is waiting; once a match runs, role changes go through
/// the rejoin or admin-override paths in the engine.
///
/// Per-role behavior (respawn policy, team color) is centralized in the
/// lookup methods below instead of being re-branched at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Chases runners; respawns almost immediately when killed.
    Hunter,
    /// Tries to complete the objective; serves a full respawn countdown.
    Runner,
    /// Watches. Never counted toward start eligibility or win conditions.
    Spectator,
}

impl Role {
    /// `true` for roles that count toward start eligibility and win
    /// conditions (hunters and runners).
    pub fn is_competitor(self) -> bool {
        !matches!(self, Self::Spectator)
    }

    /// The competitive team this role belongs to, if any.
    pub fn team(self) -> Option<Team> {
        match self {
            Self::Hunter => Some(Team::Hunters),
            Self::Runner => Some(Team::Runners),
            Self::Spectator => None,
        }
    }

    /// How a death of this role is handled.
    pub fn respawn_policy(self) -> RespawnPolicy {
        match self {
            Self::Hunter => RespawnPolicy::Quick,
            Self::Runner => RespawnPolicy::Ticketed,
            Self::Spectator => RespawnPolicy::NotApplicable,
        }
    }

    /// Display color for scoreboards and name tags.
    pub fn color(self) -> &'static str {
        match self {
            Self::Hunter => "red",
            Self::Runner => "green",
            Self::Spectator => "gray",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hunter => write!(f, "Hunter"),
            Self::Runner => write!(f, "Runner"),
            Self::Spectator => write!(f, "Spectator"),
        }
    }
}

/// One of the two competing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Hunters,
    Runners,
}

impl Team {
    /// The side this team is playing against.
    pub fn opponent(self) -> Team {
        match self {
            Self::Hunters => Self::Runners,
            Self::Runners => Self::Hunters,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hunters => write!(f, "Hunters"),
            Self::Runners => write!(f, "Runners"),
        }
    }
}

/// How a role's death is handled by the respawn scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnPolicy {
    /// Full ticket: countdown broadcast, cancellable, custom durations.
    Ticketed,
    /// Short fixed delay, no ticket bookkeeping (config-gated).
    Quick,
    /// Deaths of this role are ignored by the scheduler.
    NotApplicable,
}

// ---------------------------------------------------------------------------
// Session phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of the single shared session.
///
/// ```text
/// Waiting → Starting → Running → Ended ──(reset)──→ Waiting
///              │
///              └──(team empty / force end)──→ Waiting | Ended
/// ```
///
/// - **Waiting**: accepting joins and role changes; auto-start eligibility
///   is re-checked on every roster mutation.
/// - **Starting**: roles frozen, auto-assignment done, start countdown
///   running. Can fall back to Waiting if a team empties out.
/// - **Running**: the match proper. Timers live, win checks armed.
/// - **Ended**: outcome recorded; reset countdown running until the
///   session re-arms back to Waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Waiting,
    Starting,
    Running,
    Ended,
}

impl SessionPhase {
    /// `true` while roles may be changed by players themselves.
    pub fn roles_unlocked(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// `true` while a match is actually being played.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// `true` once the match has concluded.
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns `true` if transitioning to `target` is legal.
    ///
    /// The graph is one-directional except for two explicit back edges:
    /// start cancellation (Starting → Waiting) and reset (Ended → Waiting).
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Waiting)
                | (Self::Starting, Self::Ended)
                | (Self::Running, Self::Ended)
                | (Self::Ended, Self::Waiting)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spatial primitives
// ---------------------------------------------------------------------------

/// Side length of one world chunk in blocks. Proximity tier thresholds are
/// configured in chunks, so distances are divided by this before
/// classification.
pub const CHUNK_BLOCKS: f64 = 16.0;

/// A player position: which world, and where in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Euclidean distance in blocks. Only meaningful within one world;
    /// callers must check [`same_world`](Self::same_world) first.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Whether two positions are mutually reachable (same world).
    pub fn same_world(&self, other: &Position) -> bool {
        self.world == other.world
    }

    /// Distance in chunks (blocks / 16), the unit tier thresholds use.
    pub fn chunk_distance(&self, other: &Position) -> f64 {
        self.distance(other) / CHUNK_BLOCKS
    }
}

// ---------------------------------------------------------------------------
// Proximity tiers
// ---------------------------------------------------------------------------

/// Threat level shown to a runner based on the nearest hunter.
///
/// Derives `Ord` so tiers compare by severity: `Clear < Warning < Danger <
/// Critical`. The monitor overwrites a runner's tier on every scan; the
/// ordering is only used for display and change detection, never smoothing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ProximityTier {
    /// No hunter within the outermost threshold (or none in this world).
    #[default]
    Clear,
    /// A hunter crossed the outermost threshold.
    Warning,
    /// A hunter crossed the middle threshold.
    Danger,
    /// A hunter crossed the innermost threshold.
    Critical,
}

impl ProximityTier {
    /// Numeric level: 0 for Clear, 1–3 for the ascending warning tiers.
    pub fn level(self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Warning => 1,
            Self::Danger => 2,
            Self::Critical => 3,
        }
    }
}

impl fmt::Display for ProximityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "Clear"),
            Self::Warning => write!(f, "Warning"),
            Self::Danger => write!(f, "Danger"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means PlayerId(42) → `42`, not `{"0":42}`.
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_world_id_display() {
        assert_eq!(WorldId(3).to_string(), "W-3");
    }

    // =====================================================================
    // Role
    // =====================================================================

    #[test]
    fn test_role_is_competitor_excludes_spectator() {
        assert!(Role::Hunter.is_competitor());
        assert!(Role::Runner.is_competitor());
        assert!(!Role::Spectator.is_competitor());
    }

    #[test]
    fn test_role_team_lookup() {
        assert_eq!(Role::Hunter.team(), Some(Team::Hunters));
        assert_eq!(Role::Runner.team(), Some(Team::Runners));
        assert_eq!(Role::Spectator.team(), None);
    }

    #[test]
    fn test_role_respawn_policy_table() {
        assert_eq!(Role::Runner.respawn_policy(), RespawnPolicy::Ticketed);
        assert_eq!(Role::Hunter.respawn_policy(), RespawnPolicy::Quick);
        assert_eq!(
            Role::Spectator.respawn_policy(),
            RespawnPolicy::NotApplicable
        );
    }

    #[test]
    fn test_team_opponent_is_symmetric() {
        assert_eq!(Team::Hunters.opponent(), Team::Runners);
        assert_eq!(Team::Runners.opponent(), Team::Hunters);
        assert_eq!(Team::Hunters.opponent().opponent(), Team::Hunters);
    }

    // =====================================================================
    // SessionPhase
    // =====================================================================

    #[test]
    fn test_phase_forward_transitions_are_legal() {
        assert!(SessionPhase::Waiting.can_transition_to(SessionPhase::Starting));
        assert!(SessionPhase::Starting.can_transition_to(SessionPhase::Running));
        assert!(SessionPhase::Running.can_transition_to(SessionPhase::Ended));
        assert!(SessionPhase::Ended.can_transition_to(SessionPhase::Waiting));
    }

    #[test]
    fn test_phase_back_edges_start_cancel_and_force_end() {
        // A start can be cancelled (team emptied out during countdown)...
        assert!(SessionPhase::Starting.can_transition_to(SessionPhase::Waiting));
        // ...or force-ended by an admin.
        assert!(SessionPhase::Starting.can_transition_to(SessionPhase::Ended));
    }

    #[test]
    fn test_phase_skipping_states_is_illegal() {
        assert!(!SessionPhase::Waiting.can_transition_to(SessionPhase::Running));
        assert!(!SessionPhase::Waiting.can_transition_to(SessionPhase::Ended));
        assert!(!SessionPhase::Running.can_transition_to(SessionPhase::Waiting));
        assert!(!SessionPhase::Ended.can_transition_to(SessionPhase::Running));
    }

    #[test]
    fn test_phase_roles_unlocked_only_while_waiting() {
        assert!(SessionPhase::Waiting.roles_unlocked());
        assert!(!SessionPhase::Starting.roles_unlocked());
        assert!(!SessionPhase::Running.roles_unlocked());
        assert!(!SessionPhase::Ended.roles_unlocked());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Waiting.to_string(), "Waiting");
        assert_eq!(SessionPhase::Running.to_string(), "Running");
    }

    // =====================================================================
    // Position
    // =====================================================================

    #[test]
    fn test_position_distance_euclidean() {
        let a = Position { world: WorldId(0), x: 0.0, y: 0.0, z: 0.0 };
        let b = Position { world: WorldId(0), x: 3.0, y: 4.0, z: 0.0 };
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_same_world_compares_world_only() {
        let a = Position { world: WorldId(0), x: 0.0, y: 0.0, z: 0.0 };
        let b = Position { world: WorldId(1), x: 0.0, y: 0.0, z: 0.0 };
        assert!(a.same_world(&a));
        assert!(!a.same_world(&b));
    }

    #[test]
    fn test_position_chunk_distance_divides_by_chunk_size() {
        let a = Position { world: WorldId(0), x: 0.0, y: 0.0, z: 0.0 };
        let b = Position { world: WorldId(0), x: 160.0, y: 0.0, z: 0.0 };
        assert!((a.chunk_distance(&b) - 10.0).abs() < f64::EPSILON);
    }

    // =====================================================================
    // ProximityTier
    // =====================================================================

    #[test]
    fn test_proximity_tier_orders_by_severity() {
        assert!(ProximityTier::Clear < ProximityTier::Warning);
        assert!(ProximityTier::Warning < ProximityTier::Danger);
        assert!(ProximityTier::Danger < ProximityTier::Critical);
    }

    #[test]
    fn test_proximity_tier_levels() {
        assert_eq!(ProximityTier::Clear.level(), 0);
        assert_eq!(ProximityTier::Warning.level(), 1);
        assert_eq!(ProximityTier::Danger.level(), 2);
        assert_eq!(ProximityTier::Critical.level(), 3);
    }

    #[test]
    fn test_proximity_tier_default_is_clear() {
        assert_eq!(ProximityTier::default(), ProximityTier::Clear);
    }
}
