use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters of one cache instance.
///
/// Counters use `Relaxed` atomics; they are advisory numbers, not
/// synchronisation points. [`reset`](CacheCounters::reset) is called by
/// `AdvancedCache::clear`.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::CacheCounters;
///
/// let counters = CacheCounters::new();
/// counters.record_hit();
/// counters.record_hit();
/// counters.record_miss();
///
/// assert_eq!(counters.total_requests(), 3);
/// assert!((counters.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_expirations(&self, n: u64) {
        self.expirations.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of requests that were hits; 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits(), self.total_requests())
    }

    /// Fraction of requests that were misses; 0.0 before the first request.
    pub fn miss_rate(&self) -> f64 {
        ratio(self.misses(), self.total_requests())
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Point-in-time statistics of a cache, derived from its live entries and
/// its cumulative counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub eviction_count: u64,
    pub expired_count: u64,
}

impl CacheStats {
    pub(crate) fn from_parts(total_entries: usize, total_size: usize, c: &CacheCounters) -> Self {
        Self {
            total_entries,
            total_size,
            hits: c.hits(),
            misses: c.misses(),
            total_requests: c.total_requests(),
            hit_rate: c.hit_rate(),
            miss_rate: c.miss_rate(),
            eviction_count: c.evictions(),
            expired_count: c.expirations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counters() {
        let c = CacheCounters::new();
        assert_eq!(c.hits(), 0);
        assert_eq!(c.misses(), 0);
        assert_eq!(c.total_requests(), 0);
    }

    #[test]
    fn test_rates_zero_without_requests() {
        let c = CacheCounters::new();
        assert_eq!(c.hit_rate(), 0.0);
        assert_eq!(c.miss_rate(), 0.0);
    }

    #[test]
    fn test_rates_sum_to_one() {
        let c = CacheCounters::new();
        for i in 0..17 {
            if i % 3 == 0 {
                c.record_miss();
            } else {
                c.record_hit();
            }
        }
        assert!((c.hit_rate() + c.miss_rate() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_everything() {
        let c = CacheCounters::new();
        c.record_hit();
        c.record_miss();
        c.record_eviction();
        c.record_expirations(3);
        c.reset();
        assert_eq!(c.total_requests(), 0);
        assert_eq!(c.evictions(), 0);
        assert_eq!(c.expirations(), 0);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let c = CacheCounters::new();
        c.record_hit();
        let stats = CacheStats::from_parts(1, 10, &c);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalEntries"], 1);
        assert_eq!(json["hitRate"], 1.0);
        assert_eq!(json["evictionCount"], 0);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let counters = Arc::new(CacheCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..100 {
                        c.record_hit();
                    }
                    for _ in 0..50 {
                        c.record_miss();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.hits(), 800);
        assert_eq!(counters.misses(), 400);
    }
}
