//! The event hub: fan-out from the engine's event streams to sinks.
//!
//! The engine publishes structured [`Notice`] and [`Stat`] events into
//! unbounded channels and forgets about them. The hub owns the receiving
//! ends, running in its own task, and delivers each event to every
//! registered sink in order. A sink failure is logged and skipped — a
//! broken scoreboard plugin must never stall a countdown or lose the
//! economy its events.

use manhunt_core::{Notice, Stat};
use manhunt_engine::EventStreams;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors a sink may report. Boxed because the hub only logs them.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A consumer of presentation events (titles, boss bars, countdowns).
pub trait NoticeSink: Send + 'static {
    /// A short label for log lines.
    fn name(&self) -> &str;

    fn deliver(&mut self, notice: &Notice) -> Result<(), SinkError>;
}

/// A consumer of statistics/economy events.
pub trait StatSink: Send + 'static {
    /// A short label for log lines.
    fn name(&self) -> &str;

    fn deliver(&mut self, stat: &Stat) -> Result<(), SinkError>;
}

/// Collects sinks, then drains the engine's event streams into them.
#[derive(Default)]
pub struct EventHub {
    notice_sinks: Vec<Box<dyn NoticeSink>>,
    stat_sinks: Vec<Box<dyn StatSink>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a presentation sink. Sinks receive events in
    /// registration order.
    pub fn notice_sink(mut self, sink: impl NoticeSink) -> Self {
        self.notice_sinks.push(Box::new(sink));
        self
    }

    /// Registers a statistics sink.
    pub fn stat_sink(mut self, sink: impl StatSink) -> Self {
        self.stat_sinks.push(Box::new(sink));
        self
    }

    /// Spawns the dispatcher task. It runs until the engine drops its
    /// sending halves (i.e. until the engine actor stops).
    pub(crate) fn spawn(self, streams: EventStreams) -> JoinHandle<()> {
        tokio::spawn(self.run(streams))
    }

    async fn run(mut self, mut streams: EventStreams) {
        debug!(
            notice_sinks = self.notice_sinks.len(),
            stat_sinks = self.stat_sinks.len(),
            "event hub running"
        );
        // The `else` arm runs only when both streams are closed AND
        // drained, so nothing buffered at engine shutdown is lost.
        loop {
            tokio::select! {
                Some(notice) = streams.notices.recv() => self.dispatch_notice(&notice),
                Some(stat) = streams.stats.recv() => self.dispatch_stat(&stat),
                else => break,
            }
        }
        debug!("event hub stopped, engine streams closed");
    }

    fn dispatch_notice(&mut self, notice: &Notice) {
        for sink in &mut self.notice_sinks {
            if let Err(err) = sink.deliver(notice) {
                warn!(sink = sink.name(), %err, "notice sink failed, event skipped");
            }
        }
    }

    fn dispatch_stat(&mut self, stat: &Stat) {
        for sink in &mut self.stat_sinks {
            if let Err(err) = sink.deliver(stat) {
                warn!(sink = sink.name(), %err, "stat sink failed, event skipped");
            }
        }
    }
}
