//! Outbound events: what the orchestrator tells its collaborators.
//!
//! Two independent surfaces, matching the two kinds of consumer:
//!
//! - [`Notice`] — presentation events for the UI/localization layer
//!   (titles, boss bars, countdown displays). The orchestrator never
//!   formats text; it emits structured facts and the UI decides how to
//!   show them.
//! - [`Stat`] — fire-and-forget events for the economy/statistics layer.
//!
//! Both are internally tagged (`#[serde(tag = "type")]`) so a JSON consumer
//! sees `{ "type": "PhaseChanged", "from": "Waiting", ... }` — flat and
//! easy to dispatch on.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, ProximityTier, Role, SessionPhase, Team, WorldId};

// ---------------------------------------------------------------------------
// Win records
// ---------------------------------------------------------------------------

/// What specifically ended the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WinTrigger {
    /// A runner completed the end objective.
    Objective { player: PlayerId },
    /// Every player of the losing side was simultaneously dead.
    Eliminated,
    /// Every player of the losing side disconnected or conceded.
    Abandoned,
    /// An admin force-ended the match.
    AdminForced { reason: String },
}

/// The immutable outcome of a concluded session.
///
/// Produced exactly once per session, consumed by the reset sequencer and
/// by statistics. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    /// The side that won. `None` for an admin-forced end with no victor.
    pub winner: Option<Team>,
    /// Why the match ended.
    pub trigger: WinTrigger,
}

// ---------------------------------------------------------------------------
// Notice — UI surface
// ---------------------------------------------------------------------------

/// A presentation event for the UI layer.
///
/// Emitted on every state transition, role change, proximity-tier change,
/// and countdown tick. Delivery is fire-and-forget: the orchestrator never
/// waits on (or retries) the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// The session moved between lifecycle phases.
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },

    /// Seconds left until the match starts. Emitted once per second
    /// while the session is Starting.
    StartCountdown { remaining: u32 },

    /// The start was cancelled and the session fell back to Waiting.
    StartCancelled { reason: String },

    /// A player joined the session with the given role.
    PlayerJoined { player: PlayerId, role: Role },

    /// A player left the session (any phase).
    PlayerLeft { player: PlayerId },

    /// A disconnected player reclaimed their mid-match role.
    PlayerRejoined { player: PlayerId, role: Role },

    /// A player's role changed.
    RoleChanged { player: PlayerId, role: Role },

    /// A runner's threat tier changed since the previous scan.
    ProximityChanged {
        player: PlayerId,
        tier: ProximityTier,
    },

    /// Seconds left until a dead runner respawns. `urgent` is set for
    /// the final three seconds so the UI can emphasize the cue.
    RespawnCountdown {
        player: PlayerId,
        remaining: u32,
        urgent: bool,
    },

    /// A dead player is live again.
    Respawned { player: PlayerId },

    /// The match concluded with this outcome.
    MatchEnded { record: WinRecord },

    /// Seconds left until the session resets to Waiting. Emitted at
    /// minute checkpoints and every second in the final ten.
    ResetCountdown { remaining: u32 },
}

// ---------------------------------------------------------------------------
// Stat — economy/statistics surface
// ---------------------------------------------------------------------------

/// A fire-and-forget event for the economy/statistics layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stat {
    Damage {
        attacker: PlayerId,
        victim: PlayerId,
        amount: f64,
    },
    Kill {
        killer: PlayerId,
        victim: PlayerId,
    },
    Death {
        player: PlayerId,
    },
    Join {
        player: PlayerId,
    },
    Leave {
        player: PlayerId,
    },
    DimensionVisit {
        player: PlayerId,
        world: WorldId,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON-shape tests. The UI and economy layers consume these events as
    //! JSON, so the serde attributes are part of the contract: a change in
    //! shape here breaks consumers that we never see.

    use super::*;

    #[test]
    fn test_notice_phase_changed_json_format() {
        // `#[serde(tag = "type")]` produces internally tagged JSON:
        //   { "type": "PhaseChanged", "from": "Waiting", "to": "Starting" }
        let notice = Notice::PhaseChanged {
            from: SessionPhase::Waiting,
            to: SessionPhase::Starting,
        };
        let json: serde_json::Value = serde_json::to_value(&notice).unwrap();

        assert_eq!(json["type"], "PhaseChanged");
        assert_eq!(json["from"], "Waiting");
        assert_eq!(json["to"], "Starting");
    }

    #[test]
    fn test_notice_respawn_countdown_json_format() {
        let notice = Notice::RespawnCountdown {
            player: PlayerId(9),
            remaining: 3,
            urgent: true,
        };
        let json: serde_json::Value = serde_json::to_value(&notice).unwrap();

        assert_eq!(json["type"], "RespawnCountdown");
        assert_eq!(json["player"], 9);
        assert_eq!(json["remaining"], 3);
        assert_eq!(json["urgent"], true);
    }

    #[test]
    fn test_notice_proximity_changed_round_trip() {
        let notice = Notice::ProximityChanged {
            player: PlayerId(4),
            tier: ProximityTier::Danger,
        };
        let bytes = serde_json::to_vec(&notice).unwrap();
        let decoded: Notice = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(notice, decoded);
    }

    #[test]
    fn test_notice_match_ended_carries_win_record() {
        let notice = Notice::MatchEnded {
            record: WinRecord {
                winner: Some(Team::Runners),
                trigger: WinTrigger::Objective { player: PlayerId(2) },
            },
        };
        let json: serde_json::Value = serde_json::to_value(&notice).unwrap();

        assert_eq!(json["type"], "MatchEnded");
        assert_eq!(json["record"]["winner"], "Runners");
        assert_eq!(json["record"]["trigger"]["type"], "Objective");
        assert_eq!(json["record"]["trigger"]["player"], 2);
    }

    #[test]
    fn test_win_trigger_admin_forced_json_format() {
        let trigger = WinTrigger::AdminForced {
            reason: "maintenance".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&trigger).unwrap();

        assert_eq!(json["type"], "AdminForced");
        assert_eq!(json["reason"], "maintenance");
    }

    #[test]
    fn test_stat_kill_json_format() {
        let stat = Stat::Kill {
            killer: PlayerId(1),
            victim: PlayerId(2),
        };
        let json: serde_json::Value = serde_json::to_value(&stat).unwrap();

        assert_eq!(json["type"], "Kill");
        assert_eq!(json["killer"], 1);
        assert_eq!(json["victim"], 2);
    }

    #[test]
    fn test_stat_dimension_visit_round_trip() {
        let stat = Stat::DimensionVisit {
            player: PlayerId(3),
            world: WorldId(2),
        };
        let bytes = serde_json::to_vec(&stat).unwrap();
        let decoded: Stat = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stat, decoded);
    }

    #[test]
    fn test_decode_unknown_notice_type_returns_error() {
        // An event with an unknown "type" tag should fail to parse.
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        let result: Result<Notice, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_win_record_is_plain_data() {
        // The record must survive a round trip untouched — it is the
        // immutable artifact statistics consume after the session resets.
        let record = WinRecord {
            winner: Some(Team::Hunters),
            trigger: WinTrigger::Eliminated,
        };
        let bytes = serde_json::to_vec(&record).unwrap();
        let decoded: WinRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, decoded);
    }
}
