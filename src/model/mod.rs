//! Core data types for scan roots, discovered packages, and findings.
//!
//! This module contains the fundamental types used throughout hulud-detect:
//!
//! - [`ScanRoot`] - A directory tree to inspect (project, cache, Node install)
//! - [`DiscoveredPackage`] - A package seen on disk or in a lockfile
//! - [`GhostCandidate`] - A tracked package directory without usable metadata
//! - [`ObservedArtifact`] - A file whose name is a known malware artifact
//! - [`Finding`] - A classified, severity-ranked result
//! - [`ScanReport`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use hulud_detect::model::{Finding, FindingType, Severity};
//!
//! let finding = Finding::new(
//!     FindingType::WildcardMatch,
//!     "bad-pkg",
//!     Some("1.0.0".to_string()),
//!     "node_modules/bad-pkg",
//!     "project",
//! );
//! assert_eq!(finding.severity(), Severity::Critical);
//! ```

mod finding;
mod package;
mod report;
mod root;

pub use finding::*;
pub use package::*;
pub use report::*;
pub use root::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}
