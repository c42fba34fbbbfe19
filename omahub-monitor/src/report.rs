use crate::metrics::PerformanceMetrics;
use crate::summary::{summarize, PerformanceSummary};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the metrics at one point in time, with its verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// ISO 8601, UTC, millisecond precision.
    pub timestamp: String,
    pub metrics: PerformanceMetrics,
    pub summary: PerformanceSummary,
}

impl PerformanceReport {
    pub fn new(metrics: PerformanceMetrics, at_ms: u64) -> Self {
        let summary = summarize(&metrics);
        Self {
            timestamp: iso_timestamp(at_ms),
            metrics,
            summary,
        }
    }
}

/// Document written by an export: the live metrics, stored history and a
/// fresh summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub current: PerformanceMetrics,
    pub historical: Vec<PerformanceReport>,
    pub summary: PerformanceSummary,
}

pub(crate) fn iso_timestamp(at_ms: u64) -> String {
    let at = i64::try_from(at_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn export_date(at_ms: u64) -> String {
    let at = i64::try_from(at_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::Rating;

    #[test]
    fn test_timestamp_format() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
        assert_eq!(export_date(1_700_000_000_123), "2023-11-14");
    }

    #[test]
    fn test_report_carries_summary() {
        let metrics = PerformanceMetrics {
            cls: Some(0.4),
            ..Default::default()
        };
        let report = PerformanceReport::new(metrics, 0);
        assert_eq!(report.summary.overall, Rating::NeedsImprovement);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metrics"]["cls"], 0.4);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00.000Z");
    }
}
