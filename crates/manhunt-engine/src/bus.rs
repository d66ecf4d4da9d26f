//! Fire-and-forget event bus.
//!
//! The engine emits typed events synchronously into unbounded channels; a
//! dispatcher elsewhere (the facade's `EventHub`) drains them and isolates
//! collaborator failures. The engine code itself therefore contains no
//! UI/economy error handling at all — publishing cannot fail, block, or
//! slow a state transition down, even if every consumer is gone.

use manhunt_core::{Notice, Stat};
use tokio::sync::mpsc;
use tracing::trace;

/// Cloneable publishing half of the event bus. Held by the engine actor.
#[derive(Clone)]
pub struct EventBus {
    notices: mpsc::UnboundedSender<Notice>,
    stats: mpsc::UnboundedSender<Stat>,
}

/// Consuming half of the event bus. Held by the dispatcher.
pub struct EventStreams {
    /// Presentation events for the UI layer.
    pub notices: mpsc::UnboundedReceiver<Notice>,
    /// Economy/statistics events.
    pub stats: mpsc::UnboundedReceiver<Stat>,
}

impl EventBus {
    /// Creates a connected bus/streams pair.
    pub fn channel() -> (EventBus, EventStreams) {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (stat_tx, stat_rx) = mpsc::unbounded_channel();
        (
            EventBus {
                notices: notice_tx,
                stats: stat_tx,
            },
            EventStreams {
                notices: notice_rx,
                stats: stat_rx,
            },
        )
    }

    /// Publishes a UI notice. Dropped silently if no consumer remains.
    pub fn notice(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            trace!("notice dropped, no consumer");
        }
    }

    /// Publishes a statistics event. Dropped silently if no consumer remains.
    pub fn stat(&self, stat: Stat) {
        if self.stats.send(stat).is_err() {
            trace!("stat dropped, no consumer");
        }
    }
}
