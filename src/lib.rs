//! # OmaHub Cache
//!
//! In-memory caching and performance monitoring for the OmaHub runtime.
//!
//! This crate ties the workspace together:
//!
//! - [`omahub_cache_core`] provides [`AdvancedCache`], a TTL and byte-budgeted
//!   cache with priority-weighted eviction and cache-first, network-first and
//!   stale-while-revalidate reads
//! - [`omahub_monitor`] provides [`PerformanceMonitor`], which rates web vitals,
//!   polls caches, talks to the service worker and publishes periodic reports
//! - [`AppServices`] builds the three profiled caches and the monitor, and
//!   starts and stops their background tasks together
//!
//! ## Quick Start
//!
//! ```rust
//! use omahub_cache::{system_clock, AppServices, CacheProfiles, MemoryReportStore, MonitorConfig, SetOptions};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let services = AppServices::new(&CacheProfiles::default(), MonitorConfig::default(), system_clock());
//! let services = services.with_report_store(Arc::new(MemoryReportStore::new()));
//!
//! services.caches().api.set("brands:featured", json!(["adire", "kente"]), SetOptions::default());
//! assert!(services.caches().api.has("brands:featured"));
//!
//! services.monitor().poll_caches();
//! assert_eq!(services.monitor().metrics().cache_entries, Some(1));
//! ```
//!
//! ## Stale-While-Revalidate
//!
//! ```rust
//! use omahub_cache::{AdvancedCache, CacheConfig, SetOptions};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: AdvancedCache<String> =
//!     AdvancedCache::new("pages", CacheConfig::new(Duration::from_secs(300), 1 << 20));
//!
//! // Miss: the fetch runs and its result is stored.
//! let page = cache
//!     .get_with_fallback("home", || async { Ok::<_, String>("v1".to_string()) }, SetOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(page, "v1");
//!
//! // Hit: the cached value comes back at once and a refresh runs in the background.
//! let page = cache
//!     .get_with_fallback("home", || async { Ok::<_, String>("v2".to_string()) }, SetOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(page, "v1");
//! # }
//! ```

mod services;

pub use omahub_cache_core::*;
pub use omahub_monitor::{
    summarize, worker_channel, ExportBundle, FileReportStore, HttpReportSink, InteractionKind,
    MemoryReportStore, MonitorConfig, MonitorError, MonitorHandle, PerformanceMetrics,
    PerformanceMonitor, PerformanceReport, PerformanceSummary, Rating, ReportStore,
    ResourceTiming, Vital, WorkerChannel, WorkerEndpoint, WorkerMessage, WorkerRequest,
};
pub use services::{AppServices, RunningServices};

pub use omahub_cache_core;
pub use omahub_monitor;
