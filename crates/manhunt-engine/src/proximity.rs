//! Proximity classification.
//!
//! Each scan tick the engine walks every live runner, finds the nearest
//! live hunter sharing a world with them, and classifies the distance into
//! a threat tier. The engine only publishes a notice when a runner's tier
//! *changed* since the previous scan, so the UI is event-driven rather
//! than polled.
//!
//! The classification itself is pure and lives here; the scheduling and
//! the tier-change diffing live in the engine actor.

use manhunt_core::{PlayerId, Position, ProximityTier};
use tracing::trace;

use crate::config::ProximityConfig;
use crate::spatial::SpatialQuery;

/// Classifies a hunter-to-runner distance (in blocks) into a threat tier.
///
/// Thresholds come from [`ProximityConfig`] in chunks; comparison is
/// inclusive, so a hunter sitting exactly on a boundary reads as the
/// more dangerous tier.
pub fn classify_distance(distance_blocks: f64, config: &ProximityConfig) -> ProximityTier {
    let chunks = distance_blocks / manhunt_core::CHUNK_BLOCKS;
    if chunks <= config.critical_chunks as f64 {
        ProximityTier::Critical
    } else if chunks <= config.danger_chunks as f64 {
        ProximityTier::Danger
    } else if chunks <= config.warning_chunks as f64 {
        ProximityTier::Warning
    } else {
        ProximityTier::Clear
    }
}

/// One runner's threat tier this tick: the classification of the nearest
/// same-world live hunter, or Clear when no hunter shares a world.
///
/// A hunter whose position cannot be read contributes nothing to the scan
/// (treated as absent this tick, logged at trace level).
pub fn scan_runner<S: SpatialQuery>(
    spatial: &S,
    runner: PlayerId,
    runner_pos: &Position,
    hunters: &[(PlayerId, Position)],
    config: &ProximityConfig,
) -> ProximityTier {
    let mut nearest: Option<f64> = None;
    for (hunter, hunter_pos) in hunters {
        if !spatial.same_world(runner_pos, hunter_pos) {
            continue;
        }
        let d = spatial.distance(runner_pos, hunter_pos);
        if nearest.is_none_or(|n| d < n) {
            nearest = Some(d);
        }
    }
    match nearest {
        Some(d) => classify_distance(d, config),
        None => {
            trace!(%runner, "no same-world hunter, runner reads clear");
            ProximityTier::Clear
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manhunt_core::WorldId;

    use crate::spatial::SpatialError;

    struct PlainGeometry;

    impl SpatialQuery for PlainGeometry {
        fn locate(&self, player: PlayerId) -> Result<Position, SpatialError> {
            Err(SpatialError::PositionUnavailable(player))
        }
        fn teleport(&self, _player: PlayerId, _pos: Position) -> Result<(), SpatialError> {
            Ok(())
        }
    }

    fn pos(world: u32, x: f64, z: f64) -> Position {
        Position {
            world: WorldId(world),
            x,
            y: 64.0,
            z,
        }
    }

    #[test]
    fn test_classify_distance_tier_boundaries_are_inclusive() {
        let config = ProximityConfig::default(); // 2 / 5 / 10 chunks

        // Exactly on a boundary reads as the inner (more dangerous) tier.
        assert_eq!(classify_distance(32.0, &config), ProximityTier::Critical);
        assert_eq!(classify_distance(32.1, &config), ProximityTier::Danger);
        assert_eq!(classify_distance(80.0, &config), ProximityTier::Danger);
        assert_eq!(classify_distance(80.1, &config), ProximityTier::Warning);
        assert_eq!(classify_distance(160.0, &config), ProximityTier::Warning);
        assert_eq!(classify_distance(160.1, &config), ProximityTier::Clear);
    }

    #[test]
    fn test_classify_distance_zero_is_critical() {
        let config = ProximityConfig::default();
        assert_eq!(classify_distance(0.0, &config), ProximityTier::Critical);
    }

    #[test]
    fn test_scan_runner_uses_nearest_hunter() {
        let config = ProximityConfig::default();
        let runner_pos = pos(0, 0.0, 0.0);
        let hunters = vec![
            (PlayerId(1), pos(0, 500.0, 0.0)), // clear range
            (PlayerId(2), pos(0, 40.0, 0.0)),  // danger range
        ];

        let tier = scan_runner(&PlainGeometry, PlayerId(9), &runner_pos, &hunters, &config);
        assert_eq!(tier, ProximityTier::Danger);
    }

    #[test]
    fn test_scan_runner_ignores_hunters_in_other_worlds() {
        let config = ProximityConfig::default();
        let runner_pos = pos(0, 0.0, 0.0);
        // Same coordinates, different world: no threat at all.
        let hunters = vec![(PlayerId(1), pos(1, 0.0, 0.0))];

        let tier = scan_runner(&PlainGeometry, PlayerId(9), &runner_pos, &hunters, &config);
        assert_eq!(tier, ProximityTier::Clear);
    }

    #[test]
    fn test_scan_runner_with_no_hunters_reads_clear() {
        let config = ProximityConfig::default();
        let tier = scan_runner(&PlainGeometry, PlayerId(9), &pos(0, 0.0, 0.0), &[], &config);
        assert_eq!(tier, ProximityTier::Clear);
    }
}
