use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

/// Shortest period a background loop ticks at.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Interval for a background loop, with its immediate first tick consumed.
///
/// Periods below [`MIN_TICK_PERIOD`] (including zero) are raised to it.
pub async fn ticker(period: Duration) -> Interval {
    if period < MIN_TICK_PERIOD {
        log::warn!("tick period {period:?} too short, using {MIN_TICK_PERIOD:?}");
    }
    let mut ticker = tokio::time::interval(period.max(MIN_TICK_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    ticker
}

/// A named background loop spawned on the tokio runtime.
///
/// Loops run until [`shutdown`](BackgroundTask::shutdown) is called; dropping
/// the handle detaches the loop without stopping it.
#[derive(Debug)]
pub struct BackgroundTask {
    name: String,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn new(name: impl Into<String>, handle: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the loop and waits until it has unwound.
    pub async fn shutdown(self) {
        self.handle.abort();
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => log::warn!("background task {} ended abnormally: {e}", self.name),
        }
        log::debug!("background task {} stopped", self.name);
    }
}
