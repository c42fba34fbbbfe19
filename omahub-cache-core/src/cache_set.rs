use crate::clock::SharedClock;
use crate::task::BackgroundTask;
use crate::{AdvancedCache, CacheBuilder, CacheConfig, CacheProfiles, CacheStatsSource};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// The application's three differently tuned caches.
///
/// `general` holds page data, `images` image metadata and `api` API
/// responses. They are independent: each owns its entries, counters and
/// byte budget.
#[derive(Clone)]
pub struct CacheSet {
    pub general: AdvancedCache<Value>,
    pub images: AdvancedCache<Value>,
    pub api: AdvancedCache<Value>,
}

impl CacheSet {
    pub fn new(profiles: &CacheProfiles, clock: SharedClock) -> Self {
        let build = |name: &str, config: CacheConfig| -> AdvancedCache<Value> {
            CacheBuilder::new(name, config)
                .clock(Arc::clone(&clock))
                .build()
        };
        Self {
            general: build("general", profiles.general.clone()),
            images: build("images", profiles.images.clone()),
            api: build("api", profiles.api.clone()),
        }
    }

    /// The caches as type-erased statistics sources, for monitoring.
    pub fn sources(&self) -> Vec<Arc<dyn CacheStatsSource>> {
        vec![
            Arc::new(self.general.clone()),
            Arc::new(self.images.clone()),
            Arc::new(self.api.clone()),
        ]
    }

    /// Starts one expired-entry sweeper per cache.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start_sweepers(&self, period: Duration) -> Vec<BackgroundTask> {
        vec![
            self.general.start_sweeper(period),
            self.images.start_sweeper(period),
            self.api.start_sweeper(period),
        ]
    }

    pub fn clear_all(&self) {
        self.general.clear();
        self.images.clear();
        self.api.clear();
    }
}
