use serde::Serialize;
use std::path::PathBuf;

/// What kind of location a [`ScanRoot`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootKind {
    Project,
    NpmCache,
    YarnCache,
    PnpmCache,
    NvmVersion,
}

impl RootKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            RootKind::Project => "Project",
            RootKind::NpmCache => "npm cache",
            RootKind::YarnCache => "Yarn cache",
            RootKind::PnpmCache => "pnpm store",
            RootKind::NvmVersion => "Node (nvm)",
        }
    }
}

/// A directory tree inspected as one unit. Findings carry the root's label so
/// they can be attributed to a project, a cache, or a specific Node version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRoot {
    pub path: PathBuf,
    pub kind: RootKind,
    pub label: String,
}

impl ScanRoot {
    pub fn new(path: impl Into<PathBuf>, kind: RootKind, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            label: label.into(),
        }
    }

    pub fn project(path: impl Into<PathBuf>) -> Self {
        Self::new(path, RootKind::Project, "project")
    }
}
