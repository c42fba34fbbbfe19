use crate::config::MonitorConfig;
use crate::error::Result;
use crate::metrics::PerformanceMetrics;
use crate::report::{export_date, ExportBundle, PerformanceReport};
use crate::service_worker::{WorkerChannel, WorkerMessage, WorkerRequest};
use crate::sink::HttpReportSink;
use crate::store::{write_json_atomic, FileReportStore, ReportStore};
use crate::summary::{summarize, PerformanceSummary};
use crate::vitals::Vital;
use dashmap::DashMap;
use omahub_cache_core::{ticker, BackgroundTask, CacheStatsSource, SharedClock};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One completed resource load, as a resource-timing observer reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
    pub name: String,
    pub transfer_size: u64,
    /// Milliseconds from navigation start until the last byte arrived.
    pub response_end: f64,
}

/// User inputs that count as the first interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Click,
    KeyDown,
    TouchStart,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionKind::Click => "click",
            InteractionKind::KeyDown => "keydown",
            InteractionKind::TouchStart => "touchstart",
        };
        f.write_str(s)
    }
}

/// Collects performance signals and turns them into periodic reports.
///
/// Signals arrive through the `record_*` methods, cache polling and the
/// service-worker link; each only overwrites its own fields of the shared
/// [`PerformanceMetrics`]. Storage, HTTP and worker failures are logged and
/// never surface from the recording or reporting methods.
///
/// Cloning is cheap and yields a handle to the same monitor.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::{system_clock, AdvancedCache, CacheConfig};
/// use omahub_monitor::{MemoryReportStore, MonitorConfig, PerformanceMonitor, Vital};
/// use std::sync::Arc;
///
/// let monitor = PerformanceMonitor::new(MonitorConfig::default(), system_clock())
///     .with_store(Arc::new(MemoryReportStore::new()));
///
/// let cache: AdvancedCache<String> = AdvancedCache::new("default", CacheConfig::default());
/// monitor.register_cache(Arc::new(cache));
///
/// monitor.record_vital(Vital::Lcp, 1800.0);
/// monitor.poll_caches();
///
/// let metrics = monitor.metrics();
/// assert_eq!(metrics.lcp, Some(1800.0));
/// assert_eq!(metrics.cache_entries, Some(0));
/// ```
#[derive(Clone)]
pub struct PerformanceMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    config: MonitorConfig,
    clock: SharedClock,
    started_at: u64,
    metrics: RwLock<PerformanceMetrics>,
    caches: DashMap<String, Arc<dyn CacheStatsSource>>,
    first_interaction: OnceCell<InteractionKind>,
    store: RwLock<Arc<dyn ReportStore>>,
    sink: RwLock<Option<HttpReportSink>>,
}

impl fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("config", &self.inner.config)
            .field("caches", &self.inner.caches.len())
            .field("metrics", &*self.inner.metrics.read())
            .finish()
    }
}

impl PerformanceMonitor {
    /// Creates a monitor that keeps history under `config.storage_dir` and
    /// posts to `config.analytics_endpoint` when one is set.
    ///
    /// Interaction delay is measured from this call.
    pub fn new(config: MonitorConfig, clock: SharedClock) -> Self {
        let store: Arc<dyn ReportStore> = Arc::new(FileReportStore::new(&config.storage_dir));
        let sink = config
            .analytics_endpoint
            .as_deref()
            .and_then(|endpoint| match HttpReportSink::new(endpoint) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    log::warn!("Analytics reporting disabled: {}", e);
                    None
                }
            });
        let started_at = clock.now_ms();

        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                started_at,
                metrics: RwLock::new(PerformanceMetrics::default()),
                caches: DashMap::new(),
                first_interaction: OnceCell::new(),
                store: RwLock::new(store),
                sink: RwLock::new(sink),
            }),
        }
    }

    pub fn with_store(self, store: Arc<dyn ReportStore>) -> Self {
        *self.inner.store.write() = store;
        self
    }

    pub fn with_sink(self, sink: HttpReportSink) -> Self {
        *self.inner.sink.write() = Some(sink);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Adds a cache to the polled set, replacing one registered under the
    /// same name.
    pub fn register_cache(&self, cache: Arc<dyn CacheStatsSource>) {
        let name = cache.cache_name().to_string();
        log::debug!("Monitoring cache {}", name);
        self.inner.caches.insert(name, cache);
    }

    pub fn registered_caches(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .caches
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn record_vital(&self, vital: Vital, value: f64) {
        self.inner.metrics.write().set_vital(vital, value);
        log::info!("{}: {} ({})", vital, value, vital.rate(value));
    }

    /// Reads every registered cache: the hit rate is the mean of the caches'
    /// hit rates, size and entry count are sums. No-op without caches.
    pub fn poll_caches(&self) {
        let stats: Vec<_> = self
            .inner
            .caches
            .iter()
            .map(|entry| entry.value().cache_stats())
            .collect();
        if stats.is_empty() {
            return;
        }

        let hit_rate = stats.iter().map(|s| s.hit_rate).sum::<f64>() / stats.len() as f64;
        let size: u64 = stats.iter().map(|s| s.total_size as u64).sum();
        let entries: u64 = stats.iter().map(|s| s.total_entries as u64).sum();

        {
            let mut metrics = self.inner.metrics.write();
            metrics.cache_hit_rate = Some(hit_rate);
            metrics.cache_size = Some(size);
            metrics.cache_entries = Some(entries);
        }
        log::info!(
            "Cache performance: hit rate {:.1}%, {} entries, {} bytes across {} caches",
            hit_rate * 100.0,
            entries,
            size,
            stats.len()
        );
    }

    pub fn handle_worker_message(&self, message: WorkerMessage) {
        match message {
            WorkerMessage::Metrics(report) => {
                let mut metrics = self.inner.metrics.write();
                metrics.sw_version = Some(report.version);
                metrics.sw_uptime = Some(report.uptime);
                metrics.sw_cache_hits = Some(report.metrics.cache_hits);
                metrics.sw_cache_misses = Some(report.metrics.cache_misses);
                log::debug!(
                    "Service worker {:?}: {} hits, {} misses",
                    metrics.sw_version,
                    report.metrics.cache_hits,
                    report.metrics.cache_misses
                );
            }
            WorkerMessage::Unknown => log::debug!("Ignoring unrecognised service worker message"),
        }
    }

    /// Decodes a raw worker message; malformed input is logged and dropped.
    pub fn handle_worker_json(&self, raw: &str) {
        match serde_json::from_str::<WorkerMessage>(raw) {
            Ok(message) => self.handle_worker_message(message),
            Err(e) => log::warn!("Malformed service worker message: {}", e),
        }
    }

    /// Asks the worker for its metrics and records the answer.
    ///
    /// # Errors
    ///
    /// The worker is gone or did not answer within `worker_timeout`. The
    /// metrics are left untouched in that case.
    pub async fn request_worker_metrics(&self, channel: &WorkerChannel) -> Result<()> {
        let answer = channel
            .request(WorkerRequest::GetMetrics, self.inner.config.worker_timeout)
            .await?;
        self.handle_worker_message(answer);
        Ok(())
    }

    /// Counts the resource; bundle chunks also add to the bundle size and
    /// push out the bundle load time.
    pub fn record_resource(&self, timing: &ResourceTiming) {
        let mut metrics = self.inner.metrics.write();
        metrics.resource_count = Some(metrics.resource_count.unwrap_or(0) + 1);

        if timing.name.contains(&self.inner.config.bundle_path_segment) {
            metrics.bundle_size = Some(metrics.bundle_size.unwrap_or(0) + timing.transfer_size);
            let latest = metrics.load_time.map_or(timing.response_end, |t| t.max(timing.response_end));
            metrics.load_time = Some(latest);
        }
    }

    pub fn record_page_load(&self, elapsed_ms: f64) {
        self.inner.metrics.write().page_load_time = Some(elapsed_ms);
        log::info!("Page load time: {}ms", elapsed_ms);
    }

    /// Records the delay of the first interaction since the monitor was
    /// created. Later interactions are ignored; returns whether this one
    /// was recorded.
    pub fn record_interaction(&self, kind: InteractionKind) -> bool {
        if self.inner.first_interaction.set(kind).is_err() {
            return false;
        }
        let delay = self.inner.clock.now_ms().saturating_sub(self.inner.started_at) as f64;
        self.inner.metrics.write().interaction_delay = Some(delay);
        log::info!("First interaction ({}) after {}ms", kind, delay);
        true
    }

    pub fn first_interaction(&self) -> Option<InteractionKind> {
        self.inner.first_interaction.get().copied()
    }

    pub fn record_offline(&self) {
        let mut metrics = self.inner.metrics.write();
        let count = metrics.offline_usage.unwrap_or(0) + 1;
        metrics.offline_usage = Some(count);
        log::info!("Offline usage count: {}", count);
    }

    /// Snapshot copy of the current metrics.
    pub fn metrics(&self) -> PerformanceMetrics {
        self.inner.metrics.read().clone()
    }

    pub fn summary(&self) -> PerformanceSummary {
        summarize(&self.inner.metrics.read())
    }

    pub fn build_report(&self) -> PerformanceReport {
        PerformanceReport::new(self.metrics(), self.inner.clock.now_ms())
    }

    /// Builds a report, logs it, appends it to the history and sends it to
    /// the analytics endpoint when one is configured.
    pub async fn publish_report(&self) -> PerformanceReport {
        let report = self.build_report();
        log::info!(
            "Performance report {}: {} ({} issues)",
            report.timestamp,
            report.summary.overall,
            report.summary.issues.len()
        );
        for issue in &report.summary.issues {
            log::info!("  issue: {}", issue);
        }

        let store = self.inner.store.read().clone();
        if let Err(e) = store.append(report.clone(), self.inner.config.history_limit) {
            log::warn!("Failed to store performance report: {}", e);
        }

        let sink = self.inner.sink.read().clone();
        if let Some(sink) = sink {
            if let Err(e) = sink.send(&report).await {
                log::warn!("Failed to send performance report to {}: {}", sink.endpoint(), e);
            }
        }
        report
    }

    /// Stored reports, oldest first; empty when the history cannot be read.
    pub fn historical_reports(&self) -> Vec<PerformanceReport> {
        let store = self.inner.store.read().clone();
        store.load().unwrap_or_else(|e| {
            log::warn!("Failed to read report history: {}", e);
            Vec::new()
        })
    }

    pub fn clear_historical_data(&self) {
        let store = self.inner.store.read().clone();
        match store.clear() {
            Ok(()) => log::info!("Report history cleared"),
            Err(e) => log::warn!("Failed to clear report history: {}", e),
        }
    }

    /// Writes current metrics, history and summary to
    /// `<dir>/omahub-performance-<YYYY-MM-DD>.json` and returns the path.
    pub fn export_data(&self, dir: impl AsRef<Path>) -> Option<PathBuf> {
        let bundle = ExportBundle {
            current: self.metrics(),
            historical: self.historical_reports(),
            summary: self.summary(),
        };
        let file = format!(
            "omahub-performance-{}.json",
            export_date(self.inner.clock.now_ms())
        );
        let path = dir.as_ref().join(file);
        match write_json_atomic(&path, &bundle) {
            Ok(()) => {
                log::info!("Exported performance data to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("Failed to export performance data: {}", e);
                None
            }
        }
    }

    /// Spawns cache polling, periodic reporting and, when a worker is given,
    /// the worker listener.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self, worker: Option<WorkerChannel>) -> MonitorHandle {
        let mut tasks = vec![
            self.spawn_periodic("monitor-cache-poll", self.inner.config.cache_poll_interval, |m| {
                async move { m.poll_caches() }
            }),
            self.spawn_periodic("monitor-report", self.inner.config.report_interval, |m| {
                async move {
                    m.publish_report().await;
                }
            }),
        ];
        if let Some(channel) = worker {
            tasks.push(self.spawn_worker_listener(channel));
        }
        log::info!("Performance monitoring started ({} tasks)", tasks.len());
        MonitorHandle { tasks }
    }

    fn spawn_periodic<F, Fut>(&self, name: &str, period: Duration, run: F) -> BackgroundTask
    where
        F: Fn(PerformanceMonitor) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = ticker(period).await;
            loop {
                ticker.tick().await;
                run(monitor.clone()).await;
            }
        });
        BackgroundTask::new(name, handle)
    }

    fn spawn_worker_listener(&self, mut channel: WorkerChannel) -> BackgroundTask {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = monitor.request_worker_metrics(&channel).await {
                log::warn!("Service worker metrics unavailable: {}", e);
            }
            while let Some(message) = channel.recv().await {
                monitor.handle_worker_message(message);
            }
            log::debug!("Service worker channel closed");
        });
        BackgroundTask::new("monitor-worker", handle)
    }
}

/// Running monitor tasks.
#[derive(Debug)]
pub struct MonitorHandle {
    tasks: Vec<BackgroundTask>,
}

impl MonitorHandle {
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(BackgroundTask::name).collect()
    }

    pub async fn shutdown(self) {
        for task in self.tasks {
            task.shutdown().await;
        }
        log::info!("Performance monitoring stopped");
    }
}
