//! Wires the engine, the event hub, and the embedding server together.

use manhunt_engine::{spawn_engine, EngineConfig, EngineHandle, SpatialQuery};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ManhuntError;
use crate::hub::{EventHub, NoticeSink, StatSink};

/// Builder for an [`Orchestrator`].
///
/// ```no_run
/// # use manhunt::prelude::*;
/// # use manhunt::{Orchestrator, SpatialError};
/// # struct MyWorld;
/// # impl SpatialQuery for MyWorld {
/// #     fn locate(&self, _p: PlayerId) -> Result<Position, SpatialError> { todo!() }
/// #     fn teleport(&self, _p: PlayerId, _pos: Position) -> Result<(), SpatialError> { todo!() }
/// # }
/// # async fn run() {
/// let session = Orchestrator::builder(MyWorld)
///     .config(EngineConfig::default())
///     .build();
/// session.engine().join(PlayerId(1), Some(Role::Hunter)).await.unwrap();
/// # }
/// ```
pub struct OrchestratorBuilder<S> {
    spatial: S,
    config: EngineConfig,
    hub: EventHub,
}

impl<S: SpatialQuery> OrchestratorBuilder<S> {
    /// Replaces the default engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a presentation sink with the event hub.
    pub fn notice_sink(mut self, sink: impl NoticeSink) -> Self {
        self.hub = self.hub.notice_sink(sink);
        self
    }

    /// Registers a statistics sink with the event hub.
    pub fn stat_sink(mut self, sink: impl StatSink) -> Self {
        self.hub = self.hub.stat_sink(sink);
        self
    }

    /// Spawns the engine actor and the event dispatcher.
    pub fn build(self) -> Orchestrator {
        let (engine, streams) = spawn_engine(self.config, self.spatial);
        let dispatcher = self.hub.spawn(streams);
        info!("orchestrator up");
        Orchestrator { engine, dispatcher }
    }
}

/// A running session orchestrator: one engine actor plus one event
/// dispatcher task.
pub struct Orchestrator {
    engine: EngineHandle,
    dispatcher: JoinHandle<()>,
}

impl Orchestrator {
    /// Starts building an orchestrator around the given spatial backend.
    pub fn builder<S: SpatialQuery>(spatial: S) -> OrchestratorBuilder<S> {
        OrchestratorBuilder {
            spatial,
            config: EngineConfig::default(),
            hub: EventHub::new(),
        }
    }

    /// The handle for all session operations. Cheap to clone; hand one
    /// to every connection handler and admin command.
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Stops the engine and waits for the dispatcher to drain the last
    /// events.
    pub async fn shutdown(self) -> Result<(), ManhuntError> {
        self.engine.shutdown().await?;
        self.dispatcher
            .await
            .map_err(|err| ManhuntError::Dispatcher(err.to_string()))?;
        info!("orchestrator down");
        Ok(())
    }
}
