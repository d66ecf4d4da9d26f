//! A complete scripted match against an in-memory world.
//!
//! Run with logging to watch the lifecycle:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example quick_match
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use manhunt::prelude::*;
use manhunt::{Orchestrator, SinkError, SpatialError};
use tokio::time::sleep;

/// A toy world: every player stands where the script last put them.
#[derive(Clone, Default)]
struct FlatWorld {
    positions: Arc<Mutex<HashMap<PlayerId, Position>>>,
}

impl FlatWorld {
    fn place(&self, player: PlayerId, x: f64, z: f64) {
        self.positions.lock().unwrap().insert(
            player,
            Position {
                world: WorldId(0),
                x,
                y: 64.0,
                z,
            },
        );
    }
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

/// Prints every notice, standing in for the real UI layer.
struct ConsoleUi;

impl NoticeSink for ConsoleUi {
    fn name(&self) -> &str {
        "console-ui"
    }
    fn deliver(&mut self, notice: &Notice) -> Result<(), SinkError> {
        println!("[ui]   {notice:?}");
        Ok(())
    }
}

/// Prints every stat, standing in for the economy layer.
struct ConsoleStats;

impl StatSink for ConsoleStats {
    fn name(&self) -> &str {
        "console-stats"
    }
    fn deliver(&mut self, stat: &Stat) -> Result<(), SinkError> {
        println!("[stat] {stat:?}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), ManhuntError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let world = FlatWorld::default();
    let hunter = PlayerId(1);
    let runner = PlayerId(2);
    let decoy = PlayerId(3);
    world.place(hunter, 0.0, 0.0);
    world.place(runner, 200.0, 0.0);
    world.place(decoy, -4000.0, 0.0);

    let session = Orchestrator::builder(world.clone())
        .config(EngineConfig {
            start_countdown_secs: 3,
            respawn_secs: 5,
            reset_countdown_secs: 10,
            ..EngineConfig::default()
        })
        .notice_sink(ConsoleUi)
        .stat_sink(ConsoleStats)
        .build();
    let engine = session.engine();

    // Three players opt in; eligibility triggers the start countdown.
    // The second runner keeps the match alive through the kill below.
    engine.join(hunter, Some(Role::Hunter)).await?;
    engine.join(runner, Some(Role::Runner)).await?;
    engine.join(decoy, Some(Role::Runner)).await?;
    sleep(Duration::from_secs(4)).await;

    // The hunter closes in; proximity tiers escalate.
    world.place(hunter, 150.0, 0.0);
    sleep(Duration::from_secs(2)).await;
    world.place(hunter, 195.0, 0.0);
    sleep(Duration::from_secs(2)).await;

    // The hunter scores a kill; the runner serves a respawn countdown.
    engine.report_damage(hunter, runner, 10.0).await?;
    engine.report_death(runner, Some(hunter)).await?;
    sleep(Duration::from_secs(6)).await;

    // Back up, the runner pulls off the objective.
    engine.objective_complete(runner).await?;

    let info = engine.info().await?;
    println!("\noutcome: {:?}", info.outcome);

    // Let the reset countdown bring the session back to Waiting.
    sleep(Duration::from_secs(11)).await;
    let info = engine.info().await?;
    println!("phase after reset: {:?}", info.phase);

    session.shutdown().await
}
