use crate::error::ScanError;
use crate::model::{RootKind, ScanRoot};
use crate::platform::PlatformPaths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the directory trees a run inspects.
///
/// The project directory is always included. Full-scan mode adds the npm
/// cache, the Yarn cache, the pnpm store and one root per installed Node
/// version. Locations that don't exist or can't be read are skipped.
pub struct Locator {
    project: PathBuf,
    full_scan: bool,
    paths: PlatformPaths,
}

impl Locator {
    pub fn new(project: impl Into<PathBuf>, full_scan: bool, paths: PlatformPaths) -> Self {
        Self {
            project: project.into(),
            full_scan,
            paths,
        }
    }

    /// Returns the roots to scan, in scan order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoScanRoot`] when not a single location exists.
    pub fn roots(&self) -> Result<Vec<ScanRoot>, ScanError> {
        let mut roots = Vec::new();

        if is_dir(&self.project) {
            roots.push(ScanRoot::project(&self.project));
        } else {
            debug!(path = %self.project.display(), "project directory not found");
        }

        if self.full_scan {
            let caches = [
                (&self.paths.npm_cache, RootKind::NpmCache, "npm-cache"),
                (&self.paths.yarn_cache, RootKind::YarnCache, "yarn-cache"),
                (&self.paths.pnpm_store, RootKind::PnpmCache, "pnpm-store"),
            ];
            for (path, kind, label) in caches {
                match path {
                    Some(path) if is_dir(path) => roots.push(ScanRoot::new(path, kind, label)),
                    Some(path) => debug!(path = %path.display(), label, "skipping missing location"),
                    None => {}
                }
            }

            if let Some(versions) = &self.paths.nvm_versions {
                roots.extend(node_version_roots(versions));
            }
        }

        if roots.is_empty() {
            return Err(ScanError::NoScanRoot {
                project: self.project.clone(),
            });
        }

        Ok(roots)
    }
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// One root per subdirectory of the version manager's install directory.
fn node_version_roots(versions_dir: &Path) -> Vec<ScanRoot> {
    let entries = match fs::read_dir(versions_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %versions_dir.display(), error = %e, "no Node versions directory");
            return Vec::new();
        }
    };

    let mut roots: Vec<ScanRoot> = entries
        .flatten()
        .filter(|entry| is_dir(&entry.path()))
        .map(|entry| {
            let version = entry.file_name().to_string_lossy().to_string();
            ScanRoot::new(
                entry.path(),
                RootKind::NvmVersion,
                format!("nvm:{}", version),
            )
        })
        .collect();

    roots.sort_by(|a, b| a.label.cmp(&b.label));
    roots
}
