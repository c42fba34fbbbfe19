//! # OmaHub Cache Core
//!
//! The in-memory cache engine behind the OmaHub runtime.
//!
//! ## Features
//!
//! - **TTL expiry**: entries expire `max_age` after they were written, checked lazily on
//!   read and eagerly by an optional periodic sweeper
//! - **Byte budget**: entry sizes are estimated from their JSON encoding and their sum is
//!   kept within `max_size`
//! - **Priority-weighted eviction**: lowest priority first, then least accessed, then least
//!   recently accessed
//! - **Read strategies**: cache-first, network-first and stale-while-revalidate
//! - **Statistics**: hit/miss rates, eviction and expiry counts, live size
//! - **Injectable clock**: deterministic expiry in tests
//!
//! ## Module Organization
//!
//! - `cache_entry` - Entry wrapper with expiry and access bookkeeping
//! - `eviction_policy` - Entry priorities and read strategies
//! - `memory_estimator` - JSON-length size estimates
//! - `advanced_cache` - The cache itself
//! - `cache_set` - The three profiled caches the application runs with
//! - [`utils`] - Victim selection and expiry helpers
//!
mod advanced_cache;
mod cache_entry;
mod cache_set;
mod clock;
mod config;
mod eviction_policy;
mod memory_estimator;
mod observer;
mod stats;
mod task;

pub mod utils;

pub use advanced_cache::{
    AdvancedCache, CacheBuilder, CacheStatsSource, WarmupEntry, DEFAULT_SWEEP_INTERVAL,
};
pub use cache_entry::CacheEntry;
pub use cache_set::CacheSet;
pub use clock::{duration_ms, system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use config::{CacheConfig, CacheProfiles, SetOptions};
pub use eviction_policy::{Priority, Strategy};
pub use memory_estimator::{estimate_size, FALLBACK_ENTRY_SIZE};
pub use observer::{LogRefreshObserver, RefreshObserver};
pub use stats::{CacheCounters, CacheStats};
pub use task::{ticker, BackgroundTask, MIN_TICK_PERIOD};
