use crate::vitals::Vital;
use serde::{Deserialize, Serialize};

/// Latest known value of every monitored signal.
///
/// Fields stay `None` until their source reports; a field whose source never
/// exists in an environment stays unset for good and is omitted from JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    // Core Web Vitals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lcp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcp: Option<f64>,

    // Aggregated over every registered cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_entries: Option<u64>,

    // Service worker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_uptime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_cache_hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_cache_misses: Option<u64>,

    // Bundle and resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<u64>,

    // User experience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_load_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_usage: Option<u64>,
}

impl PerformanceMetrics {
    pub fn vital(&self, vital: Vital) -> Option<f64> {
        match vital {
            Vital::Lcp => self.lcp,
            Vital::Fid => self.fid,
            Vital::Cls => self.cls,
            Vital::Ttfb => self.ttfb,
            Vital::Fcp => self.fcp,
        }
    }

    pub fn set_vital(&mut self, vital: Vital, value: f64) {
        let slot = match vital {
            Vital::Lcp => &mut self.lcp,
            Vital::Fid => &mut self.fid,
            Vital::Cls => &mut self.cls,
            Vital::Ttfb => &mut self.ttfb,
            Vital::Fcp => &mut self.fcp,
        };
        *slot = Some(value);
    }
}
