use serde::{Deserialize, Serialize};
use std::fmt;

/// Core Web Vitals the monitor records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vital {
    Lcp,
    Fid,
    Cls,
    Ttfb,
    Fcp,
}

impl Vital {
    pub const ALL: [Vital; 5] = [Vital::Lcp, Vital::Fid, Vital::Cls, Vital::Ttfb, Vital::Fcp];

    /// Upper bounds of the `good` and `needs-improvement` bands.
    pub const fn thresholds(self) -> Thresholds {
        match self {
            Vital::Lcp => Thresholds::new(2500.0, 4000.0),
            Vital::Fid => Thresholds::new(100.0, 300.0),
            Vital::Cls => Thresholds::new(0.1, 0.25),
            Vital::Ttfb => Thresholds::new(800.0, 1800.0),
            Vital::Fcp => Thresholds::new(1800.0, 3000.0),
        }
    }

    pub fn rate(self, value: f64) -> Rating {
        self.thresholds().rate(value)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Vital::Lcp => "LCP",
            Vital::Fid => "FID",
            Vital::Cls => "CLS",
            Vital::Ttfb => "TTFB",
            Vital::Fcp => "FCP",
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

impl Thresholds {
    pub const fn new(good: f64, poor: f64) -> Self {
        Self { good, poor }
    }

    /// `good` up to and including `good`, `poor` above `poor`, otherwise `needs-improvement`.
    pub fn rate(&self, value: f64) -> Rating {
        if value <= self.good {
            Rating::Good
        } else if value <= self.poor {
            Rating::NeedsImprovement
        } else {
            Rating::Poor
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    #[default]
    Good,
    NeedsImprovement,
    Poor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcp_bands() {
        assert_eq!(Vital::Lcp.rate(1200.0), Rating::Good);
        assert_eq!(Vital::Lcp.rate(2500.0), Rating::Good);
        assert_eq!(Vital::Lcp.rate(3000.0), Rating::NeedsImprovement);
        assert_eq!(Vital::Lcp.rate(5000.0), Rating::Poor);
    }

    #[test]
    fn test_cls_bands() {
        assert_eq!(Vital::Cls.rate(0.05), Rating::Good);
        assert_eq!(Vital::Cls.rate(0.2), Rating::NeedsImprovement);
        assert_eq!(Vital::Cls.rate(0.3), Rating::Poor);
    }

    #[test]
    fn test_fid_and_ttfb_bands() {
        assert_eq!(Vital::Fid.rate(301.0), Rating::Poor);
        assert_eq!(Vital::Ttfb.rate(900.0), Rating::NeedsImprovement);
    }

    #[test]
    fn test_rating_serde() {
        assert_eq!(
            serde_json::to_string(&Rating::NeedsImprovement).unwrap(),
            "\"needs-improvement\""
        );
        assert_eq!(serde_json::to_string(&Vital::Ttfb).unwrap(), "\"TTFB\"");
    }
}
