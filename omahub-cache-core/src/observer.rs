/// Receives the outcome of background refreshes.
///
/// A stale-while-revalidate hit returns before its refresh finishes, so the
/// refresh result never reaches the caller. It is reported here instead.
pub trait RefreshObserver: Send + Sync {
    /// The entry under `key` was replaced with freshly fetched data.
    fn refreshed(&self, _cache: &str, _key: &str) {}

    /// The refresh fetch failed; the stale entry was left in place.
    fn refresh_failed(&self, cache: &str, key: &str, error: &str);
}

/// Default observer: logs failures as warnings and successes at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogRefreshObserver;

impl RefreshObserver for LogRefreshObserver {
    fn refreshed(&self, cache: &str, key: &str) {
        log::debug!("[{cache}] background refresh stored new value for {key}");
    }

    fn refresh_failed(&self, cache: &str, key: &str, error: &str) {
        log::warn!("[{cache}] background refresh failed for {key}: {error}");
    }
}
