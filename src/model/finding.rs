use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity of a [`Finding`]. Variants are declared most severe first, so the
/// derived ordering sorts critical findings to the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    /// A known malware artifact file name was found on disk.
    ForensicMatch,
    /// An installed package whose every version is compromised.
    WildcardMatch,
    /// A lockfile pins a package whose every version is compromised.
    WildcardLockHit,
    /// An installed package at a known compromised version.
    VersionMatch,
    /// A lockfile pins a known compromised version.
    LockfileHit,
    /// A tracked package at a version not listed as compromised.
    SafeMatch,
    /// A tracked package directory with no usable manifest.
    GhostPackage,
}

impl FindingType {
    pub fn severity(&self) -> Severity {
        match self {
            FindingType::ForensicMatch | FindingType::WildcardMatch => Severity::Critical,
            FindingType::WildcardLockHit | FindingType::VersionMatch | FindingType::LockfileHit => {
                Severity::High
            }
            FindingType::GhostPackage => Severity::Warning,
            FindingType::SafeMatch => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingType::ForensicMatch => "FORENSIC_MATCH",
            FindingType::WildcardMatch => "WILDCARD_MATCH",
            FindingType::WildcardLockHit => "WILDCARD_LOCK_HIT",
            FindingType::VersionMatch => "VERSION_MATCH",
            FindingType::LockfileHit => "LOCKFILE_HIT",
            FindingType::SafeMatch => "SAFE_MATCH",
            FindingType::GhostPackage => "GHOST_PACKAGE",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified scan result. Immutable once created; the severity is derived
/// from the finding type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    kind: FindingType,
    severity: Severity,
    package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    path: PathBuf,
    root: String,
}

impl Finding {
    pub fn new(
        kind: FindingType,
        package: impl Into<String>,
        version: Option<String>,
        path: impl Into<PathBuf>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            package: package.into(),
            version,
            path: path.into(),
            root: root.into(),
        }
    }

    pub fn kind(&self) -> FindingType {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}
