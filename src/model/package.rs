use std::path::PathBuf;

/// Where a [`DiscoveredPackage`] was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginKind {
    /// An installed package directory with a readable `package.json`.
    InstalledDir,
    /// An entry pinned in a lockfile.
    LockfileEntry,
}

/// A package seen during a scan. Only lives for the duration of matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPackage {
    pub name: String,
    pub version: Option<String>,
    pub origin: OriginKind,
    pub path: PathBuf,
    pub root_label: String,
}

impl DiscoveredPackage {
    pub fn installed(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        root_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            origin: OriginKind::InstalledDir,
            path: path.into(),
            root_label: root_label.into(),
        }
    }

    pub fn locked(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        root_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            origin: OriginKind::LockfileEntry,
            path: path.into(),
            root_label: root_label.into(),
        }
    }
}

/// A directory named like a tracked package whose manifest is missing or
/// unreadable, which usually means a partial or interrupted malicious install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostCandidate {
    pub name: String,
    pub path: PathBuf,
    pub root_label: String,
}

/// A file whose name alone indicates compromise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub root_label: String,
    /// Package the file belongs to, when it sits inside a `node_modules` tree.
    pub package: Option<String>,
}
