//! Lockfile parsing. Lockfiles are located by the [`RootSurvey`](super::RootSurvey).
//!
//! Supported formats:
//!
//! | File | Format |
//! |------|--------|
//! | `yarn.lock` | Yarn v1 stanzas and Yarn Berry (`version: x`) |
//! | `package-lock.json` | npm lockfile v1 (`dependencies`) and v2/v3 (`packages`) |
//! | `npm-shrinkwrap.json` | same as `package-lock.json` |
//!
//! Malformed lines and entries are skipped; parsing never fails.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A `(name, version)` pair pinned by a lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
}

impl LockedPackage {
    fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileKind {
    Yarn,
    Npm,
}

impl LockfileKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "yarn.lock" => Some(LockfileKind::Yarn),
            "package-lock.json" | "npm-shrinkwrap.json" => Some(LockfileKind::Npm),
            _ => None,
        }
    }
}

/// Reads and parses one lockfile. Unreadable files yield nothing.
pub fn read_lockfile(path: &Path, kind: LockfileKind) -> Vec<LockedPackage> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read lockfile");
            return Vec::new();
        }
    };

    match kind {
        LockfileKind::Yarn => parse_yarn_lock(&content),
        LockfileKind::Npm => match parse_npm_lock(&content) {
            Ok(packages) => packages,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unparsable npm lockfile");
                Vec::new()
            }
        },
    }
}

enum YarnState {
    AwaitingHeader,
    AwaitingVersion { name: String },
}

/// Parses `yarn.lock` text.
///
/// A header is an unindented line containing `@` and ending with `:`; the
/// first indented `version` line after it binds the version. Version lines
/// with no pending header are ignored.
pub fn parse_yarn_lock(content: &str) -> Vec<LockedPackage> {
    let mut packages = Vec::new();
    let mut state = YarnState::AwaitingHeader;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);

        if !indented {
            state = match header_package_name(trimmed) {
                Some(name) => YarnState::AwaitingVersion { name },
                None => YarnState::AwaitingHeader,
            };
            continue;
        }

        if let YarnState::AwaitingVersion { name } = &state {
            if let Some(version) = version_value(trimmed) {
                packages.push(LockedPackage::new(name.as_str(), version));
                state = YarnState::AwaitingHeader;
            }
        }
    }

    packages
}

/// Package name of a stanza header such as
/// `"@babel/core@^7.0.0", "@babel/core@^7.1.0":`.
fn header_package_name(line: &str) -> Option<String> {
    if !line.contains('@') {
        return None;
    }
    let specifiers = line.strip_suffix(':')?;
    let first = specifiers.split(',').next()?.trim().trim_matches('"');
    package_name_from_specifier(first)
}

/// `@scope/name@^1.0.0` → `@scope/name`; `name@^1.0.0` → `name`;
/// `@scope/name@npm:^1.0.0` → `@scope/name`.
///
/// A leading `@` is the scope marker; the version separator is the next `@`.
pub fn package_name_from_specifier(specifier: &str) -> Option<String> {
    let scope_len = usize::from(specifier.starts_with('@'));
    let separator = specifier[scope_len..].find('@')? + scope_len;
    let name = &specifier[..separator];

    if name.len() <= scope_len {
        return None;
    }
    Some(name.to_string())
}

/// Value of a `version "1.2.3"` (v1) or `version: 1.2.3` (Berry) line.
fn version_value(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("version")?;
    if !rest.starts_with([' ', ':', '\t']) {
        return None;
    }
    let value = rest
        .trim_start_matches(':')
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Deserialize)]
struct NpmLockfile {
    #[serde(default)]
    packages: Option<BTreeMap<String, NpmLockPackage>>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, NpmLockDependency>>,
}

/// Entry of the v2/v3 `packages` map, keyed by install path.
#[derive(Deserialize)]
struct NpmLockPackage {
    version: Option<String>,
    name: Option<String>,
    #[serde(default)]
    link: bool,
}

/// Entry of the v1 `dependencies` map, keyed by package name.
#[derive(Deserialize)]
struct NpmLockDependency {
    version: Option<String>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, NpmLockDependency>>,
}

/// Parses `package-lock.json` / `npm-shrinkwrap.json`.
///
/// The v2/v3 `packages` map is preferred when present; otherwise the v1
/// `dependencies` tree is flattened. In the `packages` map an explicit
/// `name` (set for aliased installs) wins over the install path, and the
/// root project entry `""` is skipped.
///
/// # Errors
///
/// Returns an error if the text is not a JSON lockfile object.
pub fn parse_npm_lock(content: &str) -> Result<Vec<LockedPackage>, serde_json::Error> {
    let lockfile: NpmLockfile = serde_json::from_str(content)?;

    if let Some(packages) = lockfile.packages {
        return Ok(packages
            .into_iter()
            .filter(|(key, pkg)| !key.is_empty() && !pkg.link)
            .filter_map(|(key, pkg)| {
                let name = pkg.name.or_else(|| install_path_name(&key))?;
                let version = pkg.version?;
                Some(LockedPackage::new(name, version))
            })
            .collect());
    }

    let mut packages = Vec::new();
    if let Some(dependencies) = lockfile.dependencies {
        flatten_dependencies(dependencies, &mut packages);
    }
    Ok(packages)
}

/// `node_modules/a/node_modules/@s/b` → `@s/b`. Paths outside
/// `node_modules` have no name here.
fn install_path_name(key: &str) -> Option<String> {
    const MARKER: &str = "node_modules/";
    let start = key.rfind(MARKER)? + MARKER.len();
    let name = &key[start..];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn flatten_dependencies(
    dependencies: BTreeMap<String, NpmLockDependency>,
    out: &mut Vec<LockedPackage>,
) {
    for (name, dependency) in dependencies {
        if let Some(version) = dependency.version {
            out.push(LockedPackage::new(name.as_str(), version));
        }
        if let Some(nested) = dependency.dependencies {
            flatten_dependencies(nested, out);
        }
    }
}
