use super::{Candidates, Scanner};
use crate::intel::IocIndex;
use crate::model::{DiscoveredPackage, GhostCandidate, ScanRoot};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MODULES_DIR: &str = "node_modules";
const MANIFEST: &str = "package.json";
const PNPM_VIRTUAL_STORE: &str = ".pnpm";

/// Version-control directories never contain installed packages.
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Walks every `node_modules` tree below a root and reports the packages
/// installed in it.
///
/// A package directory with a readable manifest yields a
/// [`DiscoveredPackage`]. A directory named like a tracked package but
/// without a usable manifest yields a [`GhostCandidate`] instead.
///
/// Symlinks are followed. Every real path is traversed at most once and
/// evaluated as a package at most once, so cyclic links (common with
/// `npm link` and pnpm) terminate. The two are tracked apart: a workspace
/// package reached first by the directory search is still read when its
/// `node_modules` link is reached later.
pub struct PackageWalker;

#[derive(Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
}

enum Task {
    /// Look for `node_modules` directories anywhere below.
    Search(PathBuf),
    /// A `node_modules` directory: children are packages or scopes.
    Modules(PathBuf),
    /// An `@scope` directory inside `node_modules`.
    Scope { dir: PathBuf, scope: String },
    /// A package directory and its logical name.
    Package { dir: PathBuf, name: String },
}

impl Task {
    fn dir(&self) -> &Path {
        match self {
            Task::Search(dir) | Task::Modules(dir) => dir,
            Task::Scope { dir, .. } | Task::Package { dir, .. } => dir,
        }
    }

    fn is_package(&self) -> bool {
        matches!(self, Task::Package { .. })
    }
}

impl Scanner for PackageWalker {
    fn name(&self) -> &'static str {
        "installed packages"
    }

    fn scan(&self, root: &ScanRoot, index: &IocIndex) -> Candidates {
        let mut walk = Walk {
            root,
            index,
            traversed: HashSet::new(),
            evaluated: HashSet::new(),
            queue: vec![Task::Search(root.path.clone())],
            found: Candidates::default(),
        };
        walk.run();
        walk.found
    }
}

struct Walk<'a> {
    root: &'a ScanRoot,
    index: &'a IocIndex,
    /// Real paths already searched or listed.
    traversed: HashSet<PathBuf>,
    /// Real paths already read as packages.
    evaluated: HashSet<PathBuf>,
    queue: Vec<Task>,
    found: Candidates,
}

impl Walk<'_> {
    fn run(&mut self) {
        while let Some(task) = self.queue.pop() {
            let real = match fs::canonicalize(task.dir()) {
                Ok(real) => real,
                Err(e) => {
                    debug!(path = %task.dir().display(), error = %e, "cannot resolve directory");
                    continue;
                }
            };
            let seen = if task.is_package() {
                &mut self.evaluated
            } else {
                &mut self.traversed
            };
            if !seen.insert(real) {
                continue;
            }

            match task {
                Task::Search(dir) => self.search(&dir),
                Task::Modules(dir) => self.modules(&dir),
                Task::Scope { dir, scope } => self.scope(&dir, &scope),
                Task::Package { dir, name } => self.package(dir, name),
            }
        }
    }

    fn search(&mut self, dir: &Path) {
        for (name, path) in child_dirs(dir) {
            if name == MODULES_DIR {
                self.queue.push(Task::Modules(path));
            } else if !SKIPPED_DIRS.contains(&name.as_str()) {
                self.queue.push(Task::Search(path));
            }
        }
    }

    fn modules(&mut self, dir: &Path) {
        for (name, path) in child_dirs(dir) {
            if name == PNPM_VIRTUAL_STORE {
                self.queue.push(Task::Search(path));
            } else if name.starts_with('.') {
                continue;
            } else if name.starts_with('@') {
                self.queue.push(Task::Scope { dir: path, scope: name });
            } else {
                self.queue.push(Task::Package { dir: path, name });
            }
        }
    }

    fn scope(&mut self, dir: &Path, scope: &str) {
        for (name, path) in child_dirs(dir) {
            self.queue.push(Task::Package {
                dir: path,
                name: format!("{}/{}", scope, name),
            });
        }
    }

    fn package(&mut self, dir: PathBuf, name: String) {
        let nested = dir.join(MODULES_DIR);
        if nested.is_dir() {
            self.queue.push(Task::Modules(nested));
        }

        match read_manifest(&dir) {
            Some((manifest_name, version)) => {
                self.found.packages.push(DiscoveredPackage::installed(
                    manifest_name,
                    version,
                    dir,
                    &self.root.label,
                ));
            }
            None if self.index.contains(&name) => {
                debug!(package = %name, path = %dir.display(), "tracked package without manifest");
                self.found.ghosts.push(GhostCandidate {
                    name,
                    path: dir,
                    root_label: self.root.label.clone(),
                });
            }
            None => {}
        }
    }
}

/// Name and version from `package.json`, if both are present.
fn read_manifest(dir: &Path) -> Option<(String, String)> {
    let content = fs::read_to_string(dir.join(MANIFEST)).ok()?;
    let manifest: Manifest = serde_json::from_str(&content).ok()?;
    let name = manifest.name.filter(|n| !n.is_empty())?;
    let version = manifest.version.filter(|v| !v.is_empty())?;
    Some((name, version))
}

/// Subdirectories of `dir` (following symlinks), sorted by name. Unreadable
/// directories yield nothing.
fn child_dirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| (entry.file_name().to_string_lossy().to_string(), entry.path()))
        .collect();

    // Reverse order: the worklist pops from the back.
    dirs.sort_by(|a, b| b.0.cmp(&a.0));
    dirs
}
