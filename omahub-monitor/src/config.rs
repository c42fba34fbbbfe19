use crate::error::{MonitorError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the analytics endpoint reports are POSTed to.
pub const ENDPOINT_ENV: &str = "OMAHUB_ANALYTICS_ENDPOINT";

/// Environment variable naming the directory report history is kept in.
pub const STORAGE_DIR_ENV: &str = "OMAHUB_PERFORMANCE_DIR";

/// URL path segment that identifies static bundle chunks.
pub const DEFAULT_BUNDLE_SEGMENT: &str = "/_next/static/";

/// Configuration for the performance monitor.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    pub cache_poll_interval: Duration,
    pub report_interval: Duration,
    pub history_limit: usize,
    pub storage_dir: PathBuf,
    pub analytics_endpoint: Option<String>,
    pub bundle_path_segment: String,
    pub worker_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cache_poll_interval: Duration::from_secs(30),
            report_interval: Duration::from_secs(60),
            history_limit: 100,
            storage_dir: PathBuf::from("."),
            analytics_endpoint: None,
            bundle_path_segment: DEFAULT_BUNDLE_SEGMENT.to_string(),
            worker_timeout: Duration::from_secs(5),
        }
    }
}

impl MonitorConfig {
    /// Defaults overridden by `OMAHUB_ANALYTICS_ENDPOINT` and `OMAHUB_PERFORMANCE_DIR`.
    ///
    /// A blank endpoint counts as unset.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the endpoint is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.storage_dir = PathBuf::from(dir);
            }
        }
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            config = config.with_endpoint(&endpoint)?;
        }
        Ok(config)
    }

    /// Sets the analytics endpoint after validating it; blank clears it.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            self.analytics_endpoint = None;
            return Ok(self);
        }
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| MonitorError::InvalidConfig(format!("{ENDPOINT_ENV}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonitorError::InvalidConfig(format!(
                "{ENDPOINT_ENV}: unsupported scheme {}",
                url.scheme()
            )));
        }
        self.analytics_endpoint = Some(endpoint.to_string());
        Ok(self)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}
