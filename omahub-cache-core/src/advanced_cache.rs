use crate::clock::{duration_ms, system_clock, SharedClock};
use crate::observer::{LogRefreshObserver, RefreshObserver};
use crate::task::{ticker, BackgroundTask};
use crate::utils::{live_size, purge_expired_entries, select_victims};
use crate::{
    estimate_size, CacheConfig, CacheCounters, CacheEntry, CacheStats, Priority, SetOptions,
    Strategy,
};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Interval of the expired-entry sweep started by [`AdvancedCache::start_sweeper`]
/// when the application does not pick its own.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A bounded, TTL-aware in-memory cache with priority-weighted eviction and a
/// stale-while-revalidate read path.
///
/// # Type Parameters
///
/// * `T` - The cached value type. It must be `Serialize` because entry sizes are
///   estimated from the value's JSON encoding.
///
/// # Features
///
/// - **TTL**: every entry expires `max_age` after it was written (per-write override)
/// - **Byte budget**: the summed size of live entries never exceeds `max_size`
/// - **Priority-weighted eviction**: lowest priority first, then least accessed,
///   then least recently accessed
/// - **Read strategies**: cache-first, network-first and stale-while-revalidate
/// - **Statistics**: hit/miss/eviction counters plus live size and entry count
/// - **Injectable time**: expiry is judged against a [`Clock`](crate::Clock)
///
/// # Thread Safety
///
/// The entry map sits behind a `parking_lot::RwLock`; a write (insert,
/// eviction, or a read that updates access bookkeeping) holds the write lock for
/// its whole duration, so capacity enforcement and the insert it guards are
/// atomic. Counters are atomics. Cloning an `AdvancedCache` is cheap and yields
/// a handle to the same cache.
///
/// # Background Work
///
/// Nothing is spawned at construction. Call [`start_sweeper`](Self::start_sweeper)
/// to purge expired entries periodically, and shut the returned task down when
/// the cache is retired.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::{AdvancedCache, CacheConfig, SetOptions};
/// use std::time::Duration;
///
/// let cache = AdvancedCache::new("brands", CacheConfig::new(Duration::from_secs(60), 4096));
/// cache.set("brand:1", "Adire Lagos".to_string(), SetOptions::default());
///
/// assert_eq!(cache.get("brand:1"), Some("Adire Lagos".to_string()));
/// assert_eq!(cache.get("brand:2"), None);
/// assert!((cache.stats().hit_rate - 0.5).abs() < f64::EPSILON);
/// ```
pub struct AdvancedCache<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    name: String,
    config: CacheConfig,
    map: RwLock<HashMap<String, CacheEntry<T>>>,
    counters: CacheCounters,
    sequence: AtomicU64,
    clock: SharedClock,
    observer: Arc<dyn RefreshObserver>,
}

impl<T> Clone for AdvancedCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// One entry of a [`AdvancedCache::warmup`] batch.
#[derive(Clone, Debug)]
pub struct WarmupEntry<T> {
    pub key: String,
    pub data: T,
    pub priority: Option<Priority>,
}

impl<T> WarmupEntry<T> {
    pub fn new(key: impl Into<String>, data: T) -> Self {
        Self {
            key: key.into(),
            data,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Builder for caches that need a non-default clock or refresh observer.
pub struct CacheBuilder {
    name: String,
    config: CacheConfig,
    clock: SharedClock,
    observer: Arc<dyn RefreshObserver>,
}

impl CacheBuilder {
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self {
            name: name.into(),
            config,
            clock: system_clock(),
            observer: Arc::new(LogRefreshObserver),
        }
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RefreshObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build<T>(self) -> AdvancedCache<T>
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        AdvancedCache {
            inner: Arc::new(Inner {
                name: self.name,
                config: self.config,
                map: RwLock::new(HashMap::new()),
                counters: CacheCounters::new(),
                sequence: AtomicU64::new(0),
                clock: self.clock,
                observer: self.observer,
            }),
        }
    }
}

impl<T> AdvancedCache<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates a cache on the system clock with the logging refresh observer.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        CacheBuilder::new(name, config).build()
    }

    pub fn with_clock(name: impl Into<String>, config: CacheConfig, clock: SharedClock) -> Self {
        CacheBuilder::new(name, config).clock(clock).build()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn now(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// Capacity is enforced before the insert: expired entries are purged, then
    /// live entries are evicted in priority order until the new entry fits.
    ///
    /// # Returns
    ///
    /// * `true` - The entry was stored
    /// * `false` - The value alone is larger than `max_size`; it was not stored and
    ///   any previous entry under `key` was dropped
    pub fn set(&self, key: &str, data: T, options: SetOptions) -> bool {
        let config = &self.inner.config;
        let max_age = options.max_age.unwrap_or(config.max_age);
        let priority = options.priority.unwrap_or(config.priority);
        let size = estimate_size(&data);
        let now = self.now();

        let mut map = self.inner.map.write();
        if size > config.max_size {
            map.remove(key);
            log::warn!(
                "[{}] refusing {key}: {size} bytes exceeds the {} byte budget",
                self.inner.name,
                config.max_size
            );
            return false;
        }

        self.ensure_capacity(&mut map, key, size, now);
        let entry = CacheEntry::new(
            data,
            now,
            duration_ms(max_age),
            size,
            priority,
            self.next_sequence(),
        );
        map.insert(key.to_string(), entry);
        true
    }

    /// Makes room for `incoming` bytes under `key`.
    ///
    /// The entry currently stored under `key` is about to be replaced, so its
    /// size is not counted and it is never chosen as a victim.
    fn ensure_capacity(
        &self,
        map: &mut HashMap<String, CacheEntry<T>>,
        key: &str,
        incoming: usize,
        now: u64,
    ) {
        let purged = purge_expired_entries(map, now);
        if purged > 0 {
            self.inner.counters.record_expirations(purged as u64);
            log::debug!("[{}] purged {purged} expired entries", self.inner.name);
        }

        let replaced = map.get(key).map_or(0, |e| e.size);
        let current = map.values().map(|e| e.size).sum::<usize>() - replaced;
        let budget = self.inner.config.max_size;
        if current + incoming <= budget {
            return;
        }

        let needed = current + incoming - budget;
        for victim in select_victims(map, key, needed) {
            if map.remove(&victim).is_some() {
                self.inner.counters.record_eviction();
                log::debug!("[{}] evicted {victim}", self.inner.name);
            }
        }
    }

    /// Returns a clone of the live value under `key`.
    ///
    /// A hit increments the entry's access count and refreshes its last-access
    /// time. An expired entry is removed and counted as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.now();
        let mut map = self.inner.map.write();

        match map.get_mut(key) {
            None => {
                self.inner.counters.record_miss();
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now, self.next_sequence());
                self.inner.counters.record_hit();
                return Some(entry.data.clone());
            }
            Some(_) => {}
        }

        map.remove(key);
        self.inner.counters.record_expirations(1);
        self.inner.counters.record_miss();
        None
    }

    /// Reads `key` according to the configured [`Strategy`], calling `fetch`
    /// when the cache cannot answer on its own.
    ///
    /// # Behavior by Strategy
    ///
    /// - **StaleWhileRevalidate**: a hit returns the cached value at once and runs
    ///   `fetch` on a spawned task to refresh the entry; the outcome goes to the
    ///   cache's [`RefreshObserver`]. A miss awaits `fetch`, stores and returns it.
    /// - **CacheFirst**: a hit returns the cached value and `fetch` is never called.
    ///   A miss awaits `fetch`, stores and returns it.
    /// - **NetworkFirst**: awaits `fetch`; on success the value is stored and
    ///   returned, on failure a live cached value is returned instead if there is one.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch` when it was awaited, failed, and no cached value
    /// could stand in for it. Background refresh errors are never returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use omahub_cache_core::{AdvancedCache, CacheConfig, SetOptions};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cache = AdvancedCache::new("api", CacheConfig::default());
    ///
    /// let first: Result<u32, String> = cache
    ///     .get_with_fallback("count", || async { Ok(7) }, SetOptions::default())
    ///     .await;
    /// assert_eq!(first, Ok(7));
    ///
    /// // Served from the cache; the refresh runs in the background
    /// let second: Result<u32, String> = cache
    ///     .get_with_fallback("count", || async { Ok(8) }, SetOptions::default())
    ///     .await;
    /// assert_eq!(second, Ok(7));
    /// # }
    /// ```
    pub async fn get_with_fallback<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        options: SetOptions,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        match self.inner.config.strategy {
            Strategy::StaleWhileRevalidate => {
                if let Some(cached) = self.get(key) {
                    self.spawn_refresh(key, fetch(), options);
                    return Ok(cached);
                }
                self.fetch_and_store(key, fetch(), options).await
            }
            Strategy::CacheFirst => {
                if let Some(cached) = self.get(key) {
                    return Ok(cached);
                }
                self.fetch_and_store(key, fetch(), options).await
            }
            Strategy::NetworkFirst => match fetch().await {
                Ok(data) => {
                    self.set(key, data.clone(), options);
                    Ok(data)
                }
                Err(e) => match self.get(key) {
                    Some(cached) => {
                        log::warn!(
                            "[{}] fetch for {key} failed, serving cached value: {e}",
                            self.inner.name
                        );
                        Ok(cached)
                    }
                    None => Err(e),
                },
            },
        }
    }

    async fn fetch_and_store<Fut, E>(&self, key: &str, fetch: Fut, options: SetOptions) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let data = fetch.await?;
        self.set(key, data.clone(), options);
        Ok(data)
    }

    fn spawn_refresh<Fut, E>(&self, key: &str, refresh: Fut, options: SetOptions)
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!(
                    "[{}] no async runtime, skipping background refresh of {key}",
                    self.inner.name
                );
                return;
            }
        };

        let cache = self.clone();
        let key = key.to_string();
        runtime.spawn(async move {
            let inner = &cache.inner;
            match refresh.await {
                Ok(data) => {
                    if cache.set(&key, data, options) {
                        inner.observer.refreshed(&inner.name, &key);
                    }
                }
                Err(e) => inner
                    .observer
                    .refresh_failed(&inner.name, &key, &e.to_string()),
            }
        });
    }

    /// Removes `key`, returning whether an entry was stored under it.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.map.write().remove(key).is_some()
    }

    /// Drops every entry and resets hit, miss, eviction and expiry counters.
    pub fn clear(&self) {
        self.inner.map.write().clear();
        self.inner.counters.reset();
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let map = self.inner.map.read();
        let (entries, size) = map
            .values()
            .filter(|e| !e.is_expired(now))
            .fold((0usize, 0usize), |(n, s), e| (n + 1, s + e.size));
        CacheStats::from_parts(entries, size, &self.inner.counters)
    }

    /// Stores known-good data ahead of need, with twice the configured TTL.
    pub fn preload(&self, key: &str, data: T, priority: Option<Priority>) -> bool {
        let options = SetOptions {
            max_age: Some(self.inner.config.max_age.saturating_mul(2)),
            priority,
        };
        self.set(key, data, options)
    }

    /// Preloads a batch of entries and returns how many were stored.
    pub fn warmup<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = WarmupEntry<T>>,
    {
        let stored = entries
            .into_iter()
            .filter(|e| self.preload(&e.key, e.data.clone(), e.priority))
            .count();
        log::debug!("[{}] warmed up {stored} entries", self.inner.name);
        stored
    }

    /// Live keys in sorted order, optionally restricted to those matching `pattern`.
    pub fn get_keys(&self, pattern: Option<&Regex>) -> Vec<String> {
        let now = self.now();
        let map = self.inner.map.read();
        let mut keys: Vec<String> = map
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .filter(|(k, _)| pattern.map_or(true, |re| re.is_match(k)))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Whether a live entry exists under `key`. Does not count as a request and
    /// does not touch access bookkeeping.
    pub fn has(&self, key: &str) -> bool {
        let now = self.now();
        self.inner
            .map
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Sum of the sizes of all live entries.
    pub fn size(&self) -> usize {
        live_size(&self.inner.map.read(), self.now())
    }

    /// Removes expired entries now and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let purged = purge_expired_entries(&mut self.inner.map.write(), now);
        if purged > 0 {
            self.inner.counters.record_expirations(purged as u64);
        }
        purged
    }

    /// Spawns a loop that purges expired entries every `period`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start_sweeper(&self, period: Duration) -> BackgroundTask {
        let cache = self.clone();
        let name = format!("{}-sweeper", self.inner.name);
        let handle = tokio::spawn(async move {
            let mut ticker = ticker(period).await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    log::debug!("[{}] sweep removed {purged} expired entries", cache.name());
                }
            }
        });
        BackgroundTask::new(name, handle)
    }
}

/// Read-only view of a cache's statistics, independent of its value type.
pub trait CacheStatsSource: Send + Sync {
    fn cache_name(&self) -> &str;
    fn cache_stats(&self) -> CacheStats;
}

impl<T> CacheStatsSource for AdvancedCache<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    fn cache_name(&self) -> &str {
        self.name()
    }

    fn cache_stats(&self) -> CacheStats {
        self.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn manual_cache(max_age_ms: u64, max_size: usize) -> (AdvancedCache<Value>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = AdvancedCache::with_clock(
            "test",
            CacheConfig::new(Duration::from_millis(max_age_ms), max_size),
            clock.clone(),
        );
        (cache, clock)
    }

    // 58 characters plus two quotes: 60 bytes of JSON.
    fn sixty_bytes() -> Value {
        Value::String("x".repeat(58))
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _) = manual_cache(1_000, 1_000);
        assert!(cache.set("a", json!({"v": 1}), SetOptions::default()));
        assert_eq!(cache.get("a"), Some(json!({"v": 1})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let (cache, _) = manual_cache(1_000, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        cache.set("a", json!(2), SetOptions::default());
        assert_eq!(cache.get("a"), Some(json!(2)));
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_expiry_with_per_entry_max_age() {
        let (cache, clock) = manual_cache(1_000, 1_000);
        cache.set(
            "x",
            json!({"v": 1}),
            SetOptions::new().max_age(Duration::from_millis(10)),
        );
        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.get("x"), None);
        assert!(cache.get_keys(None).is_empty());
        assert_eq!(cache.stats().expired_count, 1);
    }

    #[test]
    fn test_entry_alive_exactly_at_expiry() {
        let (cache, clock) = manual_cache(100, 1_000);
        cache.set("x", json!(1), SetOptions::default());
        clock.advance(Duration::from_millis(100));
        assert!(cache.has("x"));
        clock.advance(Duration::from_millis(1));
        assert!(!cache.has("x"));
    }

    #[test]
    fn test_capacity_evicts_oldest_when_untouched() {
        let (cache, _) = manual_cache(1_000, 100);
        cache.set("a", sixty_bytes(), SetOptions::default());
        cache.set("b", sixty_bytes(), SetOptions::default());

        assert_eq!(cache.get_keys(None), vec!["b".to_string()]);
        assert_eq!(cache.stats().eviction_count, 1);
        assert_eq!(cache.size(), 60);
    }

    #[test]
    fn test_capacity_keeps_frequently_read_entry() {
        let (cache, _) = manual_cache(1_000, 130);
        cache.set("hot", sixty_bytes(), SetOptions::default());
        cache.set("cold", sixty_bytes(), SetOptions::default());
        cache.get("hot");
        cache.get("hot");

        cache.set("new", sixty_bytes(), SetOptions::default());
        assert_eq!(cache.get_keys(None), vec!["hot".to_string(), "new".to_string()]);
    }

    #[test]
    fn test_capacity_respects_entry_priority() {
        let (cache, _) = manual_cache(1_000, 130);
        cache.set(
            "pinned",
            sixty_bytes(),
            SetOptions::new().priority(Priority::High),
        );
        cache.set("plain", sixty_bytes(), SetOptions::default());
        // Reads make "plain" the busiest entry but it is still lower priority.
        cache.get("plain");
        cache.get("plain");

        cache.set("next", sixty_bytes(), SetOptions::default());
        assert!(cache.has("pinned"));
        assert!(!cache.has("plain"));
    }

    #[test]
    fn test_eviction_count_matches_removed_entries() {
        let (cache, _) = manual_cache(1_000, 100);
        for key in ["a", "b", "c"] {
            // {"v":1} = 7 bytes
            cache.set(key, json!({"v": 1}), SetOptions::default());
        }
        let before = cache.stats();
        assert_eq!(before.total_entries, 3);

        cache.set("big", json!("y".repeat(96)), SetOptions::default());
        let after = cache.stats();
        assert_eq!(after.eviction_count - before.eviction_count, 3);
        assert_eq!(after.total_entries, 1);
        assert!(after.total_size <= 100);
    }

    #[test]
    fn test_replacing_key_does_not_evict_others() {
        let (cache, _) = manual_cache(1_000, 120);
        cache.set("a", sixty_bytes(), SetOptions::default());
        cache.set("b", sixty_bytes(), SetOptions::default());
        cache.set("a", sixty_bytes(), SetOptions::default());

        assert_eq!(cache.stats().eviction_count, 0);
        assert_eq!(cache.get_keys(None).len(), 2);
    }

    #[test]
    fn test_oversized_value_is_refused() {
        let (cache, _) = manual_cache(1_000, 10);
        cache.set("a", json!(1), SetOptions::default());
        assert!(!cache.set("a", json!("far too long for the budget"), SetOptions::default()));
        assert!(!cache.has("a"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_expired_entries_purged_before_evicting() {
        let (cache, clock) = manual_cache(1_000, 100);
        cache.set(
            "short",
            sixty_bytes(),
            SetOptions::new().max_age(Duration::from_millis(5)),
        );
        clock.advance(Duration::from_millis(10));
        cache.set("b", sixty_bytes(), SetOptions::default());

        let stats = cache.stats();
        assert_eq!(stats.eviction_count, 0);
        assert_eq!(stats.expired_count, 1);
    }

    #[test]
    fn test_size_matches_keys() {
        let (cache, clock) = manual_cache(1_000, 200);
        cache.set("a", json!("aaaa"), SetOptions::default());
        cache.set("b", json!([1, 2, 3]), SetOptions::default());
        cache.set(
            "c",
            json!({"k": true}),
            SetOptions::new().max_age(Duration::from_millis(1)),
        );
        clock.advance(Duration::from_millis(2));

        let keys = cache.get_keys(None);
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.size(), 6 + 7);
        assert_eq!(cache.stats().total_size, cache.size());
    }

    #[test]
    fn test_hit_and_miss_rates() {
        let (cache, _) = manual_cache(1_000, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        cache.get("a");
        cache.get("a");
        cache.get("a");
        cache.get("nope");

        let stats = cache.stats();
        assert_eq!(stats.total_requests, 4);
        assert!((stats.hit_rate - 0.75).abs() < 1e-9);
        assert!((stats.hit_rate + stats.miss_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_has_does_not_count() {
        let (cache, _) = manual_cache(1_000, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        assert!(cache.has("a"));
        assert!(!cache.has("b"));
        assert_eq!(cache.stats().total_requests, 0);
    }

    #[test]
    fn test_remove() {
        let (cache, _) = manual_cache(1_000, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
    }

    #[test]
    fn test_clear_resets_counters() {
        let (cache, _) = manual_cache(1_000, 100);
        cache.set("a", sixty_bytes(), SetOptions::default());
        cache.set("b", sixty_bytes(), SetOptions::default());
        cache.get("b");
        cache.get("zzz");

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.miss_rate, 0.0);
        assert_eq!(stats.eviction_count, 0);
    }

    #[test]
    fn test_preload_doubles_ttl() {
        let (cache, clock) = manual_cache(100, 1_000);
        cache.preload("warm", json!("ok"), None);
        clock.advance(Duration::from_millis(150));
        assert!(cache.has("warm"));
        clock.advance(Duration::from_millis(51));
        assert!(!cache.has("warm"));
    }

    #[test]
    fn test_warmup_counts_stored_entries() {
        let (cache, _) = manual_cache(100, 20);
        let stored = cache.warmup(vec![
            WarmupEntry::new("a", json!(1)),
            WarmupEntry::new("b", json!(2)).with_priority(Priority::High),
            WarmupEntry::new("huge", json!("this will never fit in twenty bytes")),
        ]);
        assert_eq!(stored, 2);
        assert_eq!(cache.get_keys(None), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_get_keys_with_pattern() {
        let (cache, _) = manual_cache(1_000, 1_000);
        cache.set("brand:1", json!(1), SetOptions::default());
        cache.set("brand:2", json!(2), SetOptions::default());
        cache.set("product:1", json!(3), SetOptions::default());

        let re = Regex::new("^brand:").unwrap();
        assert_eq!(
            cache.get_keys(Some(&re)),
            vec!["brand:1".to_string(), "brand:2".to_string()]
        );
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = manual_cache(10, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        cache.set("b", json!(2), SetOptions::new().max_age(Duration::from_secs(5)));
        clock.advance(Duration::from_millis(11));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_stats_source_trait() {
        let (cache, _) = manual_cache(10, 1_000);
        cache.set("a", json!(1), SetOptions::default());
        let source: &dyn CacheStatsSource = &cache;
        assert_eq!(source.cache_name(), "test");
        assert_eq!(source.cache_stats().total_entries, 1);
    }

    #[derive(Default)]
    struct Recorder {
        refreshed: Mutex<Vec<String>>,
        failed: Mutex<Vec<String>>,
        notify: tokio::sync::Notify,
    }

    impl RefreshObserver for Recorder {
        fn refreshed(&self, _cache: &str, key: &str) {
            self.refreshed.lock().unwrap().push(key.to_string());
            self.notify.notify_one();
        }

        fn refresh_failed(&self, _cache: &str, key: &str, error: &str) {
            self.failed.lock().unwrap().push(format!("{key}: {error}"));
            self.notify.notify_one();
        }
    }

    fn observed_cache(strategy: Strategy) -> (AdvancedCache<Value>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let cache = CacheBuilder::new(
            "observed",
            CacheConfig::new(Duration::from_secs(60), 10_000).with_strategy(strategy),
        )
        .observer(recorder.clone())
        .build();
        (cache, recorder)
    }

    #[tokio::test]
    async fn test_swr_miss_awaits_fetch() {
        let (cache, _) = observed_cache(Strategy::StaleWhileRevalidate);
        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Ok(json!("fresh")) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("fresh")));
        assert!(cache.has("k"));
    }

    #[tokio::test]
    async fn test_swr_miss_propagates_error() {
        let (cache, _) = observed_cache(Strategy::StaleWhileRevalidate);
        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Err("down".to_string()) }, SetOptions::default())
            .await;
        assert_eq!(got, Err("down".to_string()));
        assert!(!cache.has("k"));
    }

    #[tokio::test]
    async fn test_swr_hit_returns_stale_then_refreshes() {
        let (cache, recorder) = observed_cache(Strategy::StaleWhileRevalidate);
        cache.set("k", json!("old"), SetOptions::default());

        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Ok(json!("new")) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("old")));

        recorder.notify.notified().await;
        assert_eq!(cache.get("k"), Some(json!("new")));
        assert_eq!(*recorder.refreshed.lock().unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_swr_refresh_failure_keeps_stale_value() {
        let (cache, recorder) = observed_cache(Strategy::StaleWhileRevalidate);
        cache.set("k", json!("old"), SetOptions::default());

        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Err("timeout".to_string()) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("old")));

        recorder.notify.notified().await;
        assert_eq!(cache.get("k"), Some(json!("old")));
        assert_eq!(*recorder.failed.lock().unwrap(), vec!["k: timeout".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_first_never_refreshes_hit() {
        let (cache, recorder) = observed_cache(Strategy::CacheFirst);
        cache.set("k", json!("old"), SetOptions::default());

        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Ok(json!("new")) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("old")));
        tokio::task::yield_now().await;
        assert_eq!(cache.get("k"), Some(json!("old")));
        assert!(recorder.refreshed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_first_prefers_fetch() {
        let (cache, _) = observed_cache(Strategy::NetworkFirst);
        cache.set("k", json!("old"), SetOptions::default());

        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Ok(json!("new")) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("new")));
        assert_eq!(cache.get("k"), Some(json!("new")));
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let (cache, _) = observed_cache(Strategy::NetworkFirst);
        cache.set("k", json!("old"), SetOptions::default());

        let got: Result<Value, String> = cache
            .get_with_fallback("k", || async { Err("offline".to_string()) }, SetOptions::default())
            .await;
        assert_eq!(got, Ok(json!("old")));

        let missing: Result<Value, String> = cache
            .get_with_fallback("other", || async { Err("offline".to_string()) }, SetOptions::default())
            .await;
        assert_eq!(missing, Err("offline".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_periodically() {
        let cache: AdvancedCache<Value> =
            AdvancedCache::new("swept", CacheConfig::new(Duration::from_millis(10), 1_000));
        cache.set("a", json!(1), SetOptions::default());

        let sweeper = cache.start_sweeper(Duration::from_secs(60));
        // Expire by wall clock, then let the paused runtime reach the next tick.
        std::thread::sleep(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.stats().expired_count, 1);
        sweeper.shutdown().await;
    }

    #[test]
    fn test_refresh_without_runtime_is_skipped() {
        let (cache, _) = observed_cache(Strategy::StaleWhileRevalidate);
        cache.set("k", json!(1), SetOptions::default());
        cache.spawn_refresh("k", async { Ok::<Value, String>(json!(2)) }, SetOptions::default());
        assert_eq!(cache.get("k"), Some(json!(1)));
    }
}
