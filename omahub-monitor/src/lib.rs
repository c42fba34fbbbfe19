//! # OmaHub performance monitor
//!
//! Passive collection of web vitals, cache statistics, service-worker
//! counters and resource timings, summarised into periodic reports.
//!
//! ## Overview
//!
//! A [`PerformanceMonitor`] owns the latest [`PerformanceMetrics`]. Signals
//! reach it through plain method calls (`record_vital`, `record_resource`,
//! `record_interaction`, ...), by polling registered caches through
//! [`CacheStatsSource`](omahub_cache_core::CacheStatsSource), and over a
//! [`WorkerChannel`] to a service worker. Every `report_interval` it builds a
//! [`PerformanceReport`], appends it to a capped history in a [`ReportStore`]
//! and, when `OMAHUB_ANALYTICS_ENDPOINT` is set, POSTs it with
//! [`HttpReportSink`].
//!
//! Nothing runs in the background until [`PerformanceMonitor::start`] is
//! called; the returned [`MonitorHandle`] stops every task on `shutdown`.
//!
//! ## Ratings
//!
//! | Vital | good up to | poor above |
//! |-------|-----------:|-----------:|
//! | LCP   | 2500 ms    | 4000 ms    |
//! | FID   | 100 ms     | 300 ms     |
//! | CLS   | 0.1        | 0.25       |
//! | TTFB  | 800 ms     | 1800 ms    |
//! | FCP   | 1800 ms    | 3000 ms    |

mod config;
mod error;
mod metrics;
mod monitor;
mod report;
mod service_worker;
mod sink;
mod store;
mod summary;
mod vitals;

pub use config::{MonitorConfig, DEFAULT_BUNDLE_SEGMENT, ENDPOINT_ENV, STORAGE_DIR_ENV};
pub use error::{MonitorError, Result};
pub use metrics::PerformanceMetrics;
pub use monitor::{InteractionKind, MonitorHandle, PerformanceMonitor, ResourceTiming};
pub use report::{ExportBundle, PerformanceReport};
pub use service_worker::{
    worker_channel, WorkerCacheCounters, WorkerCall, WorkerChannel, WorkerEndpoint, WorkerMessage,
    WorkerReport, WorkerRequest,
};
pub use sink::HttpReportSink;
pub use store::{FileReportStore, MemoryReportStore, ReportStore, HISTORY_FILE};
pub use summary::{summarize, PerformanceSummary, MIN_CACHE_HIT_RATE};
pub use vitals::{Rating, Thresholds, Vital};
