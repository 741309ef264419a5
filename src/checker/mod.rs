//! Matching of scan observations against the IOC index.
//!
//! | Observation | IOC entry | Finding |
//! |-------------|-----------|---------|
//! | forensic artifact file | (any) | `FORENSIC_MATCH` |
//! | installed package | wildcard | `WILDCARD_MATCH` |
//! | lockfile entry | wildcard | `WILDCARD_LOCK_HIT` |
//! | installed package | version listed | `VERSION_MATCH` |
//! | lockfile entry | version listed | `LOCKFILE_HIT` |
//! | installed or locked | version not listed | `SAFE_MATCH` |
//! | ghost directory | tracked name | `GHOST_PACKAGE` |
//!
//! Names are compared exactly: `@babel/plugin-syntax-class-properties` is
//! not `syntax-class-properties`.

mod findings;
mod forensic;

pub use findings::FindingSet;
pub use forensic::{is_forensic_artifact, FORENSIC_ARTIFACTS};

use crate::intel::IocIndex;
use crate::model::{
    DiscoveredPackage, Finding, FindingType, GhostCandidate, ObservedArtifact, OriginKind,
};
use crate::scanner::Candidates;

/// Classifies one discovered package. Untracked names yield nothing.
pub fn classify_package(package: &DiscoveredPackage, index: &IocIndex) -> Option<Finding> {
    let entry = index.get(&package.name)?;

    let kind = match (entry.is_wildcard(), package.origin) {
        (true, OriginKind::InstalledDir) => FindingType::WildcardMatch,
        (true, OriginKind::LockfileEntry) => FindingType::WildcardLockHit,
        (false, origin) => {
            let listed = package
                .version
                .as_deref()
                .is_some_and(|v| entry.matches_version(v));
            match (listed, origin) {
                (true, OriginKind::InstalledDir) => FindingType::VersionMatch,
                (true, OriginKind::LockfileEntry) => FindingType::LockfileHit,
                (false, _) => FindingType::SafeMatch,
            }
        }
    };

    Some(Finding::new(
        kind,
        package.name.as_str(),
        package.version.clone(),
        package.path.as_path(),
        package.root_label.as_str(),
    ))
}

pub fn classify_ghost(ghost: &GhostCandidate, index: &IocIndex) -> Option<Finding> {
    if !index.contains(&ghost.name) {
        return None;
    }
    Some(Finding::new(
        FindingType::GhostPackage,
        ghost.name.as_str(),
        None,
        ghost.path.as_path(),
        ghost.root_label.as_str(),
    ))
}

pub fn classify_artifact(artifact: &ObservedArtifact) -> Finding {
    let package = artifact
        .package
        .clone()
        .unwrap_or_else(|| artifact.file_name.clone());
    Finding::new(
        FindingType::ForensicMatch,
        package,
        None,
        artifact.path.as_path(),
        artifact.root_label.as_str(),
    )
}

/// Classifies everything observed in one root, in discovery order.
///
/// A ghost only becomes a finding when nothing else was reported for its
/// directory.
pub fn check(candidates: &Candidates, index: &IocIndex) -> Vec<Finding> {
    let mut findings: Vec<Finding> = candidates
        .artifacts
        .iter()
        .map(classify_artifact)
        .chain(
            candidates
                .packages
                .iter()
                .filter_map(|p| classify_package(p, index)),
        )
        .collect();

    let ghosts: Vec<Finding> = candidates
        .ghosts
        .iter()
        .filter(|g| !findings.iter().any(|f| f.path() == g.path.as_path()))
        .filter_map(|g| classify_ghost(g, index))
        .collect();
    findings.extend(ghosts);

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::IocEntry;
    use crate::model::Severity;
    use std::path::{Path, PathBuf};

    fn index() -> IocIndex {
        [
            IocEntry::wildcard("evil"),
            IocEntry::versions("@ctrl/tinycolor", ["4.1.1", "4.1.2"]),
        ]
        .into_iter()
        .collect()
    }

    fn kind_of(package: DiscoveredPackage) -> Option<FindingType> {
        classify_package(&package, &index()).map(|f| f.kind())
    }

    #[test]
    fn test_package_classification_table() {
        let cases = [
            (
                DiscoveredPackage::installed("evil", "0.0.1", "nm/evil", "project"),
                Some(FindingType::WildcardMatch),
            ),
            (
                DiscoveredPackage::locked("evil", "0.0.1", "yarn.lock", "project"),
                Some(FindingType::WildcardLockHit),
            ),
            (
                DiscoveredPackage::installed("@ctrl/tinycolor", "4.1.1", "nm/x", "project"),
                Some(FindingType::VersionMatch),
            ),
            (
                DiscoveredPackage::locked("@ctrl/tinycolor", "4.1.2", "yarn.lock", "project"),
                Some(FindingType::LockfileHit),
            ),
            (
                DiscoveredPackage::installed("@ctrl/tinycolor", "4.1.0", "nm/x", "project"),
                Some(FindingType::SafeMatch),
            ),
            (
                DiscoveredPackage::locked("@ctrl/tinycolor", "3.0.0", "yarn.lock", "project"),
                Some(FindingType::SafeMatch),
            ),
            (
                DiscoveredPackage::installed("lodash", "4.17.21", "nm/lodash", "project"),
                None,
            ),
        ];

        for (package, expected) in cases {
            let label = format!("{} {:?}", package.name, package.origin);
            assert_eq!(kind_of(package), expected, "{label}");
        }
    }

    #[test]
    fn test_names_match_exactly() {
        let index: IocIndex = [IocEntry::wildcard("syntax-class-properties")]
            .into_iter()
            .collect();

        for name in [
            "@babel/plugin-syntax-class-properties",
            "@babel/syntax-class-properties",
            "Syntax-Class-Properties",
            "syntax-class-properties-extra",
        ] {
            let package = DiscoveredPackage::locked(name, "1.0.0", "yarn.lock", "project");
            assert!(classify_package(&package, &index).is_none(), "{name}");
        }
    }

    #[test]
    fn test_finding_carries_package_details() {
        let package =
            DiscoveredPackage::locked("@ctrl/tinycolor", "4.1.1", "/p/yarn.lock", "nvm:v20.0.0");
        let finding = classify_package(&package, &index()).unwrap();

        assert_eq!(finding.package(), "@ctrl/tinycolor");
        assert_eq!(finding.version(), Some("4.1.1"));
        assert_eq!(finding.path(), Path::new("/p/yarn.lock"));
        assert_eq!(finding.root(), "nvm:v20.0.0");
        assert_eq!(finding.severity(), Severity::High);
    }

    #[test]
    fn test_artifact_uses_package_or_file_name() {
        let inside = ObservedArtifact {
            file_name: "setup_bun.js".to_string(),
            path: PathBuf::from("/p/node_modules/evil/setup_bun.js"),
            root_label: "project".to_string(),
            package: Some("evil".to_string()),
        };
        let loose = ObservedArtifact {
            package: None,
            file_name: "truffleSecrets.json".to_string(),
            path: PathBuf::from("/p/truffleSecrets.json"),
            root_label: "project".to_string(),
        };

        let inside = classify_artifact(&inside);
        assert_eq!(inside.kind(), FindingType::ForensicMatch);
        assert_eq!(inside.package(), "evil");
        assert_eq!(inside.version(), None);
        assert_eq!(classify_artifact(&loose).package(), "truffleSecrets.json");
    }

    #[test]
    fn test_ghost_only_when_tracked_and_unmatched() {
        let ghost = GhostCandidate {
            name: "evil".to_string(),
            path: PathBuf::from("/p/node_modules/evil"),
            root_label: "project".to_string(),
        };
        let untracked = GhostCandidate {
            name: "harmless".to_string(),
            path: PathBuf::from("/p/node_modules/harmless"),
            root_label: "project".to_string(),
        };

        let mut candidates = Candidates::default();
        candidates.ghosts.push(ghost.clone());
        candidates.ghosts.push(untracked);

        let findings = check(&candidates, &index());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind(), FindingType::GhostPackage);
        assert_eq!(findings[0].severity(), Severity::Warning);

        candidates
            .packages
            .push(DiscoveredPackage::installed("evil", "1.0.0", ghost.path.clone(), "project"));
        let findings = check(&candidates, &index());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind(), FindingType::WildcardMatch);
    }
}
