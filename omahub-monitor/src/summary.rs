use crate::metrics::PerformanceMetrics;
use crate::vitals::{Rating, Vital};
use serde::{Deserialize, Serialize};

/// Cache hit rate below which the summary flags the caches.
pub const MIN_CACHE_HIT_RATE: f64 = 0.7;

/// Number of issues above which the overall rating becomes `poor`.
const POOR_ISSUE_COUNT: usize = 2;

/// Vitals the summary judges, with the advice given when one is off.
const CHECKED_VITALS: [(Vital, &str); 4] = [
    (
        Vital::Lcp,
        "Optimize images and critical resources to improve LCP",
    ),
    (
        Vital::Fid,
        "Reduce JavaScript execution time to improve FID",
    ),
    (
        Vital::Cls,
        "Reserve space for images and dynamic content to reduce CLS",
    ),
    (
        Vital::Ttfb,
        "Improve server response time and edge caching to reduce TTFB",
    ),
];

/// Derived verdict over a metrics snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub overall: Rating,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Judges `metrics`.
///
/// Every checked vital rated worse than `good` and a cache hit rate below
/// [`MIN_CACHE_HIT_RATE`] each add one issue and one recommendation. More than
/// two issues make the result `poor`, any issue `needs-improvement`. Unset
/// fields are never issues.
///
/// # Examples
///
/// ```
/// use omahub_monitor::{summarize, PerformanceMetrics, Rating};
///
/// let metrics = PerformanceMetrics {
///     lcp: Some(5000.0),
///     cache_hit_rate: Some(0.5),
///     ..Default::default()
/// };
/// let summary = summarize(&metrics);
/// assert_eq!(summary.issues.len(), 2);
/// assert_eq!(summary.overall, Rating::NeedsImprovement);
/// ```
pub fn summarize(metrics: &PerformanceMetrics) -> PerformanceSummary {
    let mut summary = PerformanceSummary::default();

    for (vital, advice) in CHECKED_VITALS {
        let Some(value) = metrics.vital(vital) else {
            continue;
        };
        let rating = vital.rate(value);
        if rating != Rating::Good {
            let threshold = vital.thresholds().good;
            summary
                .issues
                .push(format!("{vital} is {rating}: {value} exceeds {threshold}"));
            summary.recommendations.push(advice.to_string());
        }
    }

    if let Some(rate) = metrics.cache_hit_rate {
        if rate < MIN_CACHE_HIT_RATE {
            summary.issues.push(format!(
                "Cache hit rate is low: {:.1}% (target {:.0}%)",
                rate * 100.0,
                MIN_CACHE_HIT_RATE * 100.0
            ));
            summary
                .recommendations
                .push("Review cache TTLs and warm frequently used data".to_string());
        }
    }

    summary.overall = match summary.issues.len() {
        0 => Rating::Good,
        n if n > POOR_ISSUE_COUNT => Rating::Poor,
        _ => Rating::NeedsImprovement,
    };
    summary
}
