//! One detection run: resolve roots, load threat intel, scan, classify.

use crate::cache::FeedCache;
use crate::checker::{self, FindingSet};
use crate::config::Config;
use crate::error::ScanError;
use crate::intel::{self, HttpFetcher, IntelCache, IntelSources, IocIndex, OfflineSnapshot, SystemClock};
use crate::model::{Finding, ScanReport, ScanRoot};
use crate::platform::PlatformPaths;
use crate::scanner::{all_scanners, Candidates, Locator};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-invocation switches, usually from the command line.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub project: PathBuf,
    pub full_scan: bool,
    /// Ignore cached feeds and always fetch.
    pub no_cache: bool,
}

impl ScanOptions {
    pub fn project(project: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            full_scan: false,
            no_cache: false,
        }
    }
}

pub struct Engine {
    cache: IntelCache,
    sources: IntelSources,
    paths: PlatformPaths,
}

impl Engine {
    pub fn new(cache: IntelCache, sources: IntelSources) -> Self {
        Self {
            cache,
            sources,
            paths: PlatformPaths::detect(),
        }
    }

    /// Engine wired to the network, the system clock and the configured
    /// cache and offline locations.
    pub fn from_config(config: &Config, options: &ScanOptions) -> Self {
        let mut cache = IntelCache::new(
            Box::new(HttpFetcher::new(config.fetch_timeout())),
            Arc::new(SystemClock),
            config.cache_ttl(),
        )
        .with_offline(OfflineSnapshot::in_dir(&config.offline_dir))
        .bypass(options.no_cache);

        if config.persist_cache {
            cache = cache.with_disk(FeedCache::new());
        }

        Self::new(cache, config.intel_sources())
    }

    /// Replaces the detected package-manager locations used in full-scan mode.
    pub fn with_platform_paths(mut self, paths: PlatformPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Runs a complete scan.
    ///
    /// Roots are resolved before any feed is loaded, so a bad path fails
    /// without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoScanRoot`] when there is nothing to scan.
    pub async fn run(&mut self, options: &ScanOptions) -> Result<ScanReport, ScanError> {
        let roots = Locator::new(&options.project, options.full_scan, self.paths.clone()).roots()?;
        info!(roots = roots.len(), "scan roots resolved");

        let (index, intel) = intel::build_index(&mut self.cache, &self.sources).await;
        let (findings, packages_checked) = Self::scan_roots(&roots, &index);

        info!(
            packages = packages_checked,
            findings = findings.len(),
            "scan complete"
        );

        Ok(ScanReport {
            scan_time: Utc::now(),
            roots,
            intel,
            packages_checked,
            findings,
        })
    }

    /// Scans each root in order and returns the deduplicated, severity-ordered
    /// findings with the number of installed and locked packages examined.
    pub fn scan_roots(roots: &[ScanRoot], index: &IocIndex) -> (Vec<Finding>, usize) {
        let scanners = all_scanners();
        let mut findings = FindingSet::new();
        let mut packages_checked = 0;

        for root in roots {
            info!(root = %root.label, path = %root.path.display(), "scanning");

            let mut found = Candidates::default();
            for scanner in &scanners {
                let part = scanner.scan(root, index);
                debug!(
                    root = %root.label,
                    scanner = scanner.name(),
                    packages = part.packages.len(),
                    ghosts = part.ghosts.len(),
                    artifacts = part.artifacts.len(),
                    "scanner finished"
                );
                found.extend(part);
            }

            packages_checked += found.packages.len();
            findings.extend(checker::check(&found, index));
        }

        (findings.into_sorted(), packages_checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::IocEntry;
    use crate::model::{FindingType, Severity};
    use std::fs;

    #[test]
    fn test_scan_roots_orders_and_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let modules = tmp.path().join("node_modules");
        fs::create_dir_all(modules.join("evil")).unwrap();
        fs::write(
            modules.join("evil").join("package.json"),
            r#"{"name": "evil", "version": "1.0.0"}"#,
        )
        .unwrap();
        fs::write(modules.join("evil").join("bun_environment.js"), "").unwrap();
        fs::write(
            tmp.path().join("yarn.lock"),
            "evil@^1.0.0:\n  version \"1.0.0\"\n\nfine@^2.0.0:\n  version \"2.0.0\"\n",
        )
        .unwrap();

        let index: IocIndex = [IocEntry::wildcard("evil")].into_iter().collect();
        let (findings, checked) =
            Engine::scan_roots(&[ScanRoot::project(tmp.path())], &index);

        assert_eq!(checked, 3);
        let kinds: Vec<FindingType> = findings.iter().map(|f| f.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                FindingType::ForensicMatch,
                FindingType::WildcardMatch,
                FindingType::WildcardLockHit,
            ]
        );
        assert_eq!(findings[0].package(), "evil");
        assert_eq!(findings[2].severity(), Severity::High);
    }

    #[test]
    fn test_same_root_twice_reports_once() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("yarn.lock"), "evil@^1.0.0:\n  version \"1.0.0\"\n").unwrap();

        let index: IocIndex = [IocEntry::wildcard("evil")].into_iter().collect();
        let root = ScanRoot::project(tmp.path());
        let (findings, checked) = Engine::scan_roots(&[root.clone(), root], &index);

        assert_eq!(checked, 2);
        assert_eq!(findings.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_linked_workspace_package_is_classified() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("apps").join("evil");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("package.json"), r#"{"name":"evil","version":"1.0.0"}"#).unwrap();
        fs::create_dir_all(tmp.path().join("node_modules")).unwrap();
        std::os::unix::fs::symlink(&app, tmp.path().join("node_modules").join("evil")).unwrap();

        let index: IocIndex = [IocEntry::wildcard("evil")].into_iter().collect();
        let (findings, checked) = Engine::scan_roots(&[ScanRoot::project(tmp.path())], &index);

        assert_eq!(checked, 1);
        let kinds: Vec<FindingType> = findings.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec![FindingType::WildcardMatch]);
    }
}
