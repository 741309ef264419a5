use super::{Finding, ScanRoot, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a threat-intel feed body was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrigin {
    /// In-process cache, younger than the TTL.
    Memory,
    /// On-disk cache, younger than the TTL.
    Disk,
    /// Fetched during this run.
    Network,
    /// Expired cached copy, used because the fetch failed.
    Stale,
    /// Offline snapshot shipped with the tool or dropped by the updater.
    Offline,
}

impl FeedOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedOrigin::Memory => "memory",
            FeedOrigin::Disk => "disk cache",
            FeedOrigin::Network => "network",
            FeedOrigin::Stale => "stale cache",
            FeedOrigin::Offline => "offline snapshot",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntelSummary {
    pub entries: usize,
    pub wildcard_entries: usize,
    pub csv_origin: FeedOrigin,
    pub json_origin: FeedOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Utc>,
    pub roots: Vec<ScanRoot>,
    pub intel: IntelSummary,
    pub packages_checked: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }

    /// True when anything at warning level or above was found.
    pub fn is_compromised(&self) -> bool {
        self.findings.iter().any(|f| f.severity() < Severity::Info)
    }
}
