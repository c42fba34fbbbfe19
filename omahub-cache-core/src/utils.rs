use crate::CacheEntry;
use std::collections::HashMap;

/// Picks the entries to evict so that at least `needed` bytes are freed.
///
/// Candidates are every entry except `exclude` (the key about to be written),
/// ordered by ascending priority, then access count, then last access time,
/// then access sequence. Keys are taken from the front of that order until
/// their sizes add up to `needed` or the candidates run out.
///
/// # Returns
///
/// The victim keys in eviction order. The caller removes them.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use omahub_cache_core::{CacheEntry, Priority, utils::select_victims};
///
/// let mut map = HashMap::new();
/// map.insert("old".to_string(), CacheEntry::new(1, 0, 100, 60, Priority::Medium, 1));
/// map.insert("new".to_string(), CacheEntry::new(2, 5, 100, 60, Priority::Medium, 2));
///
/// assert_eq!(select_victims(&map, "incoming", 20), vec!["old".to_string()]);
/// assert_eq!(select_victims(&map, "incoming", 100).len(), 2);
/// ```
pub fn select_victims<T>(
    map: &HashMap<String, CacheEntry<T>>,
    exclude: &str,
    needed: usize,
) -> Vec<String> {
    if needed == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(&String, &CacheEntry<T>)> =
        map.iter().filter(|(k, _)| k.as_str() != exclude).collect();
    candidates.sort_by_key(|(_, e)| e.eviction_rank());

    let mut freed = 0usize;
    let mut victims = Vec::new();
    for (key, entry) in candidates {
        if freed >= needed {
            break;
        }
        freed = freed.saturating_add(entry.size);
        victims.push(key.clone());
    }
    victims
}

/// Removes every entry expired at `now_ms`, returning how many were dropped.
pub fn purge_expired_entries<T>(map: &mut HashMap<String, CacheEntry<T>>, now_ms: u64) -> usize {
    let before = map.len();
    map.retain(|_, e| !e.is_expired(now_ms));
    before - map.len()
}

/// Sum of `size` over entries that are live at `now_ms`.
pub fn live_size<T>(map: &HashMap<String, CacheEntry<T>>, now_ms: u64) -> usize {
    map.values()
        .filter(|e| !e.is_expired(now_ms))
        .map(|e| e.size)
        .sum()
}
