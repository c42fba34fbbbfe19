use omahub_cache_core::{system_clock, BackgroundTask, CacheProfiles, CacheSet, SharedClock};
use omahub_monitor::{
    MonitorConfig, MonitorError, MonitorHandle, PerformanceMonitor, ReportStore, WorkerChannel,
};
use std::sync::Arc;
use std::time::Duration;

/// The application's caches and performance monitor, wired together.
///
/// All parts share one clock and the monitor polls all three caches. Nothing
/// runs in the background until [`start`](Self::start) is called.
#[derive(Clone)]
pub struct AppServices {
    caches: CacheSet,
    monitor: PerformanceMonitor,
}

impl AppServices {
    /// Builds the three profiled caches and a monitor that watches them.
    ///
    /// # Arguments
    ///
    /// * `profiles` - Configuration of the `general`, `images` and `api` caches
    /// * `monitor_config` - Polling and reporting settings
    /// * `clock` - Time source shared by every cache and the monitor
    pub fn new(profiles: &CacheProfiles, monitor_config: MonitorConfig, clock: SharedClock) -> Self {
        let caches = CacheSet::new(profiles, Arc::clone(&clock));
        let monitor = PerformanceMonitor::new(monitor_config, clock);
        for source in caches.sources() {
            monitor.register_cache(source);
        }
        Self { caches, monitor }
    }

    /// Default profiles, the system clock and monitor settings from the
    /// environment.
    ///
    /// # Errors
    ///
    /// The analytics endpoint in the environment is not a valid http(s) URL.
    pub fn from_env() -> Result<Self, MonitorError> {
        let config = MonitorConfig::from_env()?;
        Ok(Self::new(&CacheProfiles::default(), config, system_clock()))
    }

    /// Replaces where the monitor keeps its report history.
    pub fn with_report_store(self, store: Arc<dyn ReportStore>) -> Self {
        Self {
            monitor: self.monitor.with_store(store),
            ..self
        }
    }

    pub fn caches(&self) -> &CacheSet {
        &self.caches
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Starts one sweeper per cache and the monitor's tasks.
    ///
    /// # Arguments
    ///
    /// * `sweep_period` - Interval between expired-entry sweeps
    /// * `worker` - Link to the service worker, if there is one
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self, sweep_period: Duration, worker: Option<WorkerChannel>) -> RunningServices {
        let sweepers = self.caches.start_sweepers(sweep_period);
        let monitor = self.monitor.start(worker);
        log::info!(
            "Started {} cache sweepers every {:?}",
            sweepers.len(),
            sweep_period
        );
        RunningServices { sweepers, monitor }
    }
}

/// Background tasks of a started [`AppServices`].
#[derive(Debug)]
pub struct RunningServices {
    sweepers: Vec<BackgroundTask>,
    monitor: MonitorHandle,
}

impl RunningServices {
    pub fn task_names(&self) -> Vec<&str> {
        self.sweepers
            .iter()
            .map(BackgroundTask::name)
            .chain(self.monitor.task_names())
            .collect()
    }

    /// Stops every task and waits for them to unwind.
    pub async fn shutdown(self) {
        for sweeper in self.sweepers {
            sweeper.shutdown().await;
        }
        self.monitor.shutdown().await;
    }
}
