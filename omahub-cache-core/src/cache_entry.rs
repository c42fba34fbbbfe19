use crate::Priority;

/// A cached value together with its expiry and access bookkeeping.
///
/// Entries are owned by exactly one [`AdvancedCache`](crate::AdvancedCache)
/// and are never handed out; reads return a clone of `data`.
///
/// # Fields
///
/// * `data` - The cached value
/// * `timestamp` - Creation time, epoch milliseconds
/// * `expires_at` - `timestamp + max_age`; the entry is logically absent once `now > expires_at`
/// * `access_count` - Number of successful reads
/// * `last_accessed` - Time of the last successful read (creation time until then)
/// * `size` - Estimated byte size of `data`, charged against the cache budget
/// * `priority` - Eviction class of this entry
/// * `sequence` - Logical stamp of the last write or read; breaks recency ties
///
/// # Examples
///
/// ```
/// use omahub_cache_core::{CacheEntry, Priority};
///
/// let entry = CacheEntry::new("data", 1_000, 500, 6, Priority::Medium, 1);
/// assert_eq!(entry.expires_at, 1_500);
/// assert!(!entry.is_expired(1_500));
/// assert!(entry.is_expired(1_501));
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: u64,
    pub expires_at: u64,
    pub access_count: u64,
    pub last_accessed: u64,
    pub size: usize,
    pub priority: Priority,
    pub sequence: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(
        data: T,
        now_ms: u64,
        max_age_ms: u64,
        size: usize,
        priority: Priority,
        sequence: u64,
    ) -> Self {
        Self {
            data,
            timestamp: now_ms,
            expires_at: now_ms.saturating_add(max_age_ms),
            access_count: 0,
            last_accessed: now_ms,
            size,
            priority,
            sequence,
        }
    }

    /// Returns true once `now_ms` is strictly past `expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Records a successful read.
    pub fn touch(&mut self, now_ms: u64, sequence: u64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now_ms;
        self.sequence = sequence;
    }

    /// Sort key used to pick eviction victims; smaller keys are evicted first.
    pub(crate) fn eviction_rank(&self) -> (Priority, u64, u64, u64) {
        (
            self.priority,
            self.access_count,
            self.last_accessed,
            self.sequence,
        )
    }
}
