use serde::{Deserialize, Serialize};
use std::fmt;

/// Eviction weighting class of a cache entry.
///
/// When a cache runs out of byte budget, entries are evicted starting from
/// the lowest priority. Inside one priority class the least accessed entries
/// go first, then the least recently accessed ones.
///
/// Every entry carries its own priority. An entry written without an explicit
/// priority inherits the one configured on its cache.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::Priority;
///
/// let p: Priority = "high".into();
/// assert_eq!(p, Priority::High);
/// assert!(Priority::Low < Priority::Medium);
///
/// // Unknown values fall back to the default
/// let unknown: Priority = "urgent".into();
/// assert_eq!(unknown, Priority::Medium);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

/// Read strategy used by [`AdvancedCache::get_with_fallback`](crate::AdvancedCache::get_with_fallback).
///
/// * `CacheFirst` - serve a live cached value, fetch only on a miss
/// * `NetworkFirst` - always fetch; fall back to a live cached value when the fetch fails
/// * `StaleWhileRevalidate` - serve a live cached value immediately and refresh it in the
///   background; fetch inline only on a miss (default)
///
/// # Examples
///
/// ```
/// use omahub_cache_core::Strategy;
///
/// assert_eq!(Strategy::default(), Strategy::StaleWhileRevalidate);
///
/// let s: Strategy = "network-first".into();
/// assert_eq!(s, Strategy::NetworkFirst);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    #[default]
    StaleWhileRevalidate,
}

impl From<&str> for Strategy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cache-first" => Strategy::CacheFirst,
            "network-first" => Strategy::NetworkFirst,
            _ => Strategy::StaleWhileRevalidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        let mut tiers = vec![Priority::High, Priority::Low, Priority::Medium];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::Low, Priority::Medium, Priority::High]);
    }

    #[test]
    fn test_priority_serde_lowercase() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
        let back: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(back, Priority::Low);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(Strategy::from("CACHE-FIRST"), Strategy::CacheFirst);
        assert_eq!(Strategy::from("whatever"), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn test_strategy_serde_kebab() {
        let s: Strategy = serde_json::from_str("\"stale-while-revalidate\"").unwrap();
        assert_eq!(s, Strategy::StaleWhileRevalidate);
    }
}
