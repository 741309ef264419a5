use crate::model::{Finding, FindingType};
use std::collections::HashSet;
use std::path::PathBuf;

type FindingKey = (String, Option<String>, PathBuf, FindingType);

/// Append-only finding accumulator for one run.
///
/// Findings with the same package, version, path and type are reported once
/// (the first occurrence is kept). [`FindingSet::into_sorted`] orders by
/// severity and keeps discovery order within a severity.
#[derive(Debug, Default)]
pub struct FindingSet {
    seen: HashSet<FindingKey>,
    findings: Vec<Finding>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an identical finding was already recorded.
    pub fn push(&mut self, finding: Finding) -> bool {
        let key = (
            finding.package().to_string(),
            finding.version().map(str::to_string),
            finding.path().to_path_buf(),
            finding.kind(),
        );
        if !self.seen.insert(key) {
            return false;
        }
        self.findings.push(finding);
        true
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn into_sorted(self) -> Vec<Finding> {
        let mut findings = self.findings;
        findings.sort_by_key(|f| f.severity());
        findings
    }
}

impl Extend<Finding> for FindingSet {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        for finding in iter {
            self.push(finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn finding(kind: FindingType, package: &str, version: Option<&str>, path: &str) -> Finding {
        Finding::new(kind, package, version.map(str::to_string), path, "project")
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let mut set = FindingSet::new();
        assert!(set.push(finding(FindingType::LockfileHit, "a", Some("1.0.0"), "yarn.lock")));
        assert!(!set.push(finding(FindingType::LockfileHit, "a", Some("1.0.0"), "yarn.lock")));
        assert!(set.push(finding(FindingType::LockfileHit, "a", Some("1.0.1"), "yarn.lock")));
        assert!(set.push(finding(FindingType::LockfileHit, "a", Some("1.0.0"), "sub/yarn.lock")));
        assert!(set.push(finding(FindingType::SafeMatch, "a", Some("1.0.0"), "yarn.lock")));

        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_sorted_by_severity_then_discovery() {
        let mut set = FindingSet::new();
        set.extend([
            finding(FindingType::SafeMatch, "safe", Some("1.0.0"), "a"),
            finding(FindingType::LockfileHit, "first-high", Some("1.0.0"), "b"),
            finding(FindingType::GhostPackage, "ghost", None, "c"),
            finding(FindingType::WildcardMatch, "critical", Some("1.0.0"), "d"),
            finding(FindingType::VersionMatch, "second-high", Some("1.0.0"), "e"),
        ]);

        let sorted = set.into_sorted();
        let ordered: Vec<(Severity, &str)> =
            sorted.iter().map(|f| (f.severity(), f.package())).collect();

        assert_eq!(
            ordered,
            vec![
                (Severity::Critical, "critical"),
                (Severity::High, "first-high"),
                (Severity::High, "second-high"),
                (Severity::Warning, "ghost"),
                (Severity::Info, "safe"),
            ]
        );
    }
}
