use super::lockfile::{read_lockfile, LockfileKind};
use super::{Candidates, Scanner};
use crate::checker::is_forensic_artifact;
use crate::intel::IocIndex;
use crate::model::{DiscoveredPackage, ObservedArtifact, ScanRoot};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const MODULES_DIR: &str = "node_modules";

/// One pass over every file name below a root.
///
/// Two things are picked up on the way:
///
/// - files the worm drops (payload loaders, harvested secret dumps), anywhere
///   below the root, `node_modules` included
/// - lockfiles with no `node_modules` ancestor, which are then parsed
///
/// Lockfiles inside `node_modules` belong to dependencies, not to the
/// project, and are not read.
pub struct RootSurvey;

impl Scanner for RootSurvey {
    fn name(&self) -> &'static str {
        "root survey"
    }

    fn scan(&self, root: &ScanRoot, _index: &IocIndex) -> Candidates {
        let mut found = Candidates::default();
        let mut lockfiles: Vec<(PathBuf, LockfileKind)> = Vec::new();

        let walker = WalkDir::new(&root.path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && matches!(e.file_name().to_str(), Some(".git" | ".hg" | ".svn")))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };

            if is_forensic_artifact(file_name) {
                debug!(path = %entry.path().display(), "forensic artifact");
                found.artifacts.push(ObservedArtifact {
                    file_name: file_name.to_string(),
                    path: entry.path().to_path_buf(),
                    root_label: root.label.clone(),
                    package: enclosing_package(entry.path()),
                });
            } else if let Some(kind) = LockfileKind::from_file_name(file_name) {
                if !inside_modules(&root.path, entry.path()) {
                    lockfiles.push((entry.path().to_path_buf(), kind));
                }
            }
        }

        for (path, kind) in lockfiles {
            for locked in read_lockfile(&path, kind) {
                found.packages.push(DiscoveredPackage::locked(
                    locked.name,
                    locked.version,
                    &path,
                    &root.label,
                ));
            }
        }

        found
    }
}

/// True when a directory between `root` and `path` is `node_modules`.
fn inside_modules(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .parent()
        .map(|dir| {
            dir.components()
                .any(|c| matches!(c, Component::Normal(part) if part == MODULES_DIR))
        })
        .unwrap_or(false)
}

/// Name of the package a file sits in: the directory after the last
/// `node_modules`, joined with the next one when it is an `@scope`.
fn enclosing_package(path: &Path) -> Option<String> {
    let dirs: Vec<&str> = path
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let modules = dirs.iter().rposition(|part| *part == MODULES_DIR)?;
    let first = dirs.get(modules + 1)?;
    if first.starts_with('@') {
        let child = dirs.get(modules + 2)?;
        Some(format!("{}/{}", first, child))
    } else {
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn survey(root: &Path) -> Candidates {
        RootSurvey.scan(&ScanRoot::project(root), &IocIndex::new())
    }

    #[test]
    fn test_enclosing_package() {
        assert_eq!(
            enclosing_package(Path::new("/p/node_modules/evil/setup_bun.js")),
            Some("evil".to_string())
        );
        assert_eq!(
            enclosing_package(Path::new("/p/node_modules/@ctrl/tinycolor/lib/bun_environment.js")),
            Some("@ctrl/tinycolor".to_string())
        );
        assert_eq!(
            enclosing_package(Path::new("/p/node_modules/a/node_modules/b/setup_bun.js")),
            Some("b".to_string())
        );
        assert_eq!(enclosing_package(Path::new("/p/node_modules/setup_bun.js")), None);
        assert_eq!(enclosing_package(Path::new("/p/node_modules/@scope/x.js")), None);
        assert_eq!(enclosing_package(Path::new("/p/cloud.json")), None);
    }

    #[test]
    fn test_inside_modules() {
        let root = Path::new("/work/node_modules/app");
        assert!(!inside_modules(root, &root.join("yarn.lock")));
        assert!(!inside_modules(root, &root.join("packages/web/package-lock.json")));
        assert!(inside_modules(root, &root.join("node_modules/dep/yarn.lock")));
    }

    #[test]
    fn test_finds_artifacts_inside_and_outside_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = tmp.path().join("node_modules").join("@scope").join("evil");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("setup_bun.js"), "").unwrap();
        fs::write(pkg.join("index.js"), "").unwrap();
        fs::write(tmp.path().join("truffleSecrets.json"), "{}").unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git").join("cloud.json"), "{}").unwrap();

        let found = survey(tmp.path());

        let mut seen: Vec<(String, Option<String>)> = found
            .artifacts
            .iter()
            .map(|a| (a.file_name.clone(), a.package.clone()))
            .collect();
        seen.sort();

        assert_eq!(
            seen,
            vec![
                ("setup_bun.js".to_string(), Some("@scope/evil".to_string())),
                ("truffleSecrets.json".to_string(), None),
            ]
        );
        assert!(found.packages.is_empty());
    }

    #[test]
    fn test_file_names_match_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Setup_Bun.js"), "").unwrap();
        fs::write(tmp.path().join("setup_bun.js.bak"), "").unwrap();

        assert!(survey(tmp.path()).artifacts.is_empty());
    }

    #[test]
    fn test_skips_lockfiles_inside_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("yarn.lock"),
            "a@^1.0.0:\n  version \"1.0.0\"\n",
        )
        .unwrap();
        let dep = tmp.path().join("node_modules").join("dep");
        fs::create_dir_all(&dep).unwrap();
        fs::write(
            dep.join("npm-shrinkwrap.json"),
            r#"{"packages": {"node_modules/b": {"version": "2.0.0"}}}"#,
        )
        .unwrap();
        fs::write(dep.join("setup_bun.js"), "").unwrap();

        let found = survey(tmp.path());

        assert_eq!(found.packages.len(), 1);
        assert_eq!(found.packages[0].name, "a");
        assert!(found.packages[0].path.ends_with("yarn.lock"));
        assert_eq!(found.artifacts.len(), 1);
        assert_eq!(found.artifacts[0].package.as_deref(), Some("dep"));
    }

    #[test]
    fn test_reads_nested_workspace_lockfiles() {
        let tmp = tempfile::tempdir().unwrap();
        let web = tmp.path().join("packages").join("web");
        fs::create_dir_all(&web).unwrap();
        fs::write(
            web.join("package-lock.json"),
            r#"{"lockfileVersion": 3, "packages": {"": {}, "node_modules/left-pad": {"version": "1.3.0"}}}"#,
        )
        .unwrap();

        let found = survey(tmp.path());

        assert_eq!(found.packages.len(), 1);
        assert_eq!(found.packages[0].name, "left-pad");
        assert_eq!(found.packages[0].version.as_deref(), Some("1.3.0"));
    }
}
