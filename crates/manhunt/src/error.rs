//! Error type for the facade.

use manhunt_engine::EngineError;

/// Anything that can go wrong at the orchestrator surface.
#[derive(Debug, thiserror::Error)]
pub enum ManhuntError {
    /// An engine-level refusal or an unavailable engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The event dispatcher task ended abnormally during shutdown.
    #[error("event dispatcher failed: {0}")]
    Dispatcher(String),
}
