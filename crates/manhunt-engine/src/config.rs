//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// ProximityConfig
// ---------------------------------------------------------------------------

/// Configuration for the proximity monitor.
///
/// Thresholds are distances in world chunks and must be strictly
/// ascending: a hunter within `critical_chunks` is the highest threat,
/// within `danger_chunks` the middle tier, within `warning_chunks` the
/// outermost. Beyond `warning_chunks` (or in another world) a runner
/// reads as Clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// How often the scan runs while a match is live.
    pub scan_interval: Duration,

    /// Innermost threshold (chunks): at or inside → Critical.
    pub critical_chunks: u32,

    /// Middle threshold (chunks): at or inside → Danger.
    pub danger_chunks: u32,

    /// Outermost threshold (chunks): at or inside → Warning.
    pub warning_chunks: u32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(1),
            critical_chunks: 2,
            danger_chunks: 5,
            warning_chunks: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Full configuration for the orchestration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum hunters + runners required before auto-start triggers.
    /// Spectators never count.
    pub min_players: usize,

    /// Whether reaching eligibility starts the match automatically.
    /// When disabled, only an admin `force_start` begins a match.
    pub auto_start: bool,

    /// Length of the pre-match countdown, in seconds.
    pub start_countdown_secs: u32,

    /// Length of the post-match reset countdown, in seconds.
    pub reset_countdown_secs: u32,

    /// Default runner death-to-respawn duration, in seconds.
    /// Per-player overrides are set through the admin surface.
    pub respawn_secs: u32,

    /// Whether dead hunters come back after a short fixed delay.
    /// When disabled, a dead hunter is eliminated for the round.
    pub hunter_instant_respawn: bool,

    /// The short fixed delay for hunter respawns (no countdown, no ticket).
    pub hunter_respawn_delay: Duration,

    /// Proximity monitor settings.
    pub proximity: ProximityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            auto_start: true,
            start_countdown_secs: 10,
            reset_countdown_secs: 300,
            respawn_secs: 30,
            hunter_instant_respawn: true,
            hunter_respawn_delay: Duration::from_secs(1),
            proximity: ProximityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Clamp and repair any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by `spawn_engine`. Rules:
    /// - `min_players` raised to 2 (one hunter + one runner is the floor).
    /// - `start_countdown_secs` and `respawn_secs` raised to 1.
    /// - `scan_interval` raised to 100 ms to keep the scan off the hot path.
    /// - Proximity thresholds forced strictly ascending by bumping each
    ///   tier to at least one chunk past the tier inside it.
    pub fn validated(mut self) -> Self {
        if self.min_players < 2 {
            warn!(
                min_players = self.min_players,
                "min_players below 2 — raising (a match needs one of each role)"
            );
            self.min_players = 2;
        }
        if self.start_countdown_secs == 0 {
            self.start_countdown_secs = 1;
        }
        if self.respawn_secs == 0 {
            self.respawn_secs = 1;
        }
        if self.proximity.scan_interval < Duration::from_millis(100) {
            warn!(
                interval_ms = self.proximity.scan_interval.as_millis() as u64,
                "proximity scan interval too small — clamping to 100 ms"
            );
            self.proximity.scan_interval = Duration::from_millis(100);
        }
        if self.proximity.danger_chunks <= self.proximity.critical_chunks {
            self.proximity.danger_chunks = self.proximity.critical_chunks + 1;
            warn!("proximity thresholds not ascending — bumped danger tier");
        }
        if self.proximity.warning_chunks <= self.proximity.danger_chunks {
            self.proximity.warning_chunks = self.proximity.danger_chunks + 1;
            warn!("proximity thresholds not ascending — bumped warning tier");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.min_players, 2);
        assert!(config.auto_start);
        assert_eq!(config.start_countdown_secs, 10);
        assert_eq!(config.reset_countdown_secs, 300);
        assert!(config.hunter_instant_respawn);
    }

    #[test]
    fn test_validated_raises_min_players_floor() {
        let config = EngineConfig {
            min_players: 0,
            ..EngineConfig::default()
        }
        .validated();
        assert_eq!(config.min_players, 2);
    }

    #[test]
    fn test_validated_repairs_non_ascending_thresholds() {
        let config = EngineConfig {
            proximity: ProximityConfig {
                critical_chunks: 5,
                danger_chunks: 5,
                warning_chunks: 3,
                ..ProximityConfig::default()
            },
            ..EngineConfig::default()
        }
        .validated();

        assert!(config.proximity.critical_chunks < config.proximity.danger_chunks);
        assert!(config.proximity.danger_chunks < config.proximity.warning_chunks);
    }

    #[test]
    fn test_validated_keeps_ascending_thresholds_untouched() {
        let config = EngineConfig::default().validated();
        assert_eq!(config.proximity.critical_chunks, 2);
        assert_eq!(config.proximity.danger_chunks, 5);
        assert_eq!(config.proximity.warning_chunks, 10);
    }

    #[test]
    fn test_validated_clamps_scan_interval() {
        let config = EngineConfig {
            proximity: ProximityConfig {
                scan_interval: Duration::from_millis(1),
                ..ProximityConfig::default()
            },
            ..EngineConfig::default()
        }
        .validated();
        assert_eq!(config.proximity.scan_interval, Duration::from_millis(100));
    }
}
