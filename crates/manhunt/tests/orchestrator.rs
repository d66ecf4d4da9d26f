//! Integration tests for the facade: engine + hub wiring, sink delivery,
//! and shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use manhunt::prelude::*;
use manhunt::{SinkError, SpatialError};
use tokio::time::sleep;

#[derive(Clone, Default)]
struct FlatWorld {
    positions: Arc<Mutex<HashMap<PlayerId, Position>>>,
}

impl SpatialQuery for FlatWorld {
    fn locate(&self, player: PlayerId) -> Result<Position, SpatialError> {
        self.positions
            .lock()
            .unwrap()
            .get(&player)
            .copied()
            .ok_or(SpatialError::PositionUnavailable(player))
    }

    fn teleport(&self, player: PlayerId, pos: Position) -> Result<(), SpatialError> {
        self.positions.lock().unwrap().insert(player, pos);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CapturedNotices(Arc<Mutex<Vec<Notice>>>);

impl NoticeSink for CapturedNotices {
    fn name(&self) -> &str {
        "captured-notices"
    }
    fn deliver(&mut self, notice: &Notice) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CapturedStats(Arc<Mutex<Vec<Stat>>>);

impl StatSink for CapturedStats {
    fn name(&self) -> &str {
        "captured-stats"
    }
    fn deliver(&mut self, stat: &Stat) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(stat.clone());
        Ok(())
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        start_countdown_secs: 2,
        reset_countdown_secs: 30,
        respawn_secs: 5,
        ..EngineConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_match_flows_through_registered_sinks() {
    let notices = CapturedNotices::default();
    let stats = CapturedStats::default();
    let session = Orchestrator::builder(FlatWorld::default())
        .config(fast_config())
        .notice_sink(notices.clone())
        .stat_sink(stats.clone())
        .build();
    let engine = session.engine();

    engine.join(PlayerId(1), Some(Role::Hunter)).await.unwrap();
    engine.join(PlayerId(2), Some(Role::Runner)).await.unwrap();
    sleep(Duration::from_secs(3)).await;
    assert_eq!(
        engine.info().await.unwrap().phase,
        SessionPhase::Running
    );

    engine
        .report_death(PlayerId(2), Some(PlayerId(1)))
        .await
        .unwrap();
    let info = engine.info().await.unwrap();
    assert_eq!(info.phase, SessionPhase::Ended);
    assert_eq!(info.outcome.unwrap().winner, Some(Team::Hunters));

    session.shutdown().await.unwrap();

    let notices = notices.0.lock().unwrap();
    assert!(notices.contains(&Notice::PhaseChanged {
        from: SessionPhase::Waiting,
        to: SessionPhase::Starting,
    }));
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::MatchEnded { .. })));

    let stats = stats.0.lock().unwrap();
    assert!(stats.contains(&Stat::Kill {
        killer: PlayerId(1),
        victim: PlayerId(2),
    }));
    assert!(stats.contains(&Stat::Death { player: PlayerId(2) }));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_buffered_events() {
    let stats = CapturedStats::default();
    let session = Orchestrator::builder(FlatWorld::default())
        .config(fast_config())
        .stat_sink(stats.clone())
        .build();

    session
        .engine()
        .join(PlayerId(1), Some(Role::Hunter))
        .await
        .unwrap();
    // Shut down immediately: the join stat may still be in flight.
    session.shutdown().await.unwrap();

    assert!(stats
        .0
        .lock()
        .unwrap()
        .contains(&Stat::Join { player: PlayerId(1) }));
}

#[tokio::test(start_paused = true)]
async fn test_engine_handle_reports_unavailable_after_shutdown() {
    let session = Orchestrator::builder(FlatWorld::default()).build();
    let engine = session.engine().clone();
    session.shutdown().await.unwrap();

    let result = engine.info().await;
    assert!(matches!(result, Err(EngineError::Unavailable)));
}
