use crate::{Priority, Strategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction-time settings of one cache instance.
///
/// `max_age` is the default TTL of entries, `max_size` the byte budget all
/// live entries share, `priority` the eviction class given to entries written
/// without one, and `strategy` the read path of `get_with_fallback`.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::{CacheConfig, Priority, Strategy};
/// use std::time::Duration;
///
/// let config = CacheConfig::new(Duration::from_secs(60), 1024 * 1024)
///     .with_priority(Priority::High)
///     .with_strategy(Strategy::CacheFirst);
/// assert_eq!(config.max_size, 1024 * 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(with = "duration_ms")]
    pub max_age: Duration,
    pub max_size: usize,
    pub priority: Priority,
    pub strategy: Strategy,
}

impl CacheConfig {
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self {
            max_age,
            max_size,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5 * 60),
            max_size: 50 * 1024 * 1024,
            priority: Priority::Medium,
            strategy: Strategy::StaleWhileRevalidate,
        }
    }
}

/// Per-write overrides for [`AdvancedCache::set`](crate::AdvancedCache::set).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub max_age: Option<Duration>,
    pub priority: Option<Priority>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// The three tuned cache profiles the application runs with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheProfiles {
    pub general: CacheConfig,
    pub images: CacheConfig,
    pub api: CacheConfig,
}

impl Default for CacheProfiles {
    fn default() -> Self {
        Self {
            general: CacheConfig::default(),
            images: CacheConfig::new(Duration::from_secs(30 * 60), 100 * 1024 * 1024)
                .with_priority(Priority::Low),
            api: CacheConfig::new(Duration::from_secs(2 * 60), 10 * 1024 * 1024)
                .with_priority(Priority::High),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(crate::clock::duration_ms(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
