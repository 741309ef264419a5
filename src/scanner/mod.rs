//! Filesystem scanners.
//!
//! This module provides the [`Scanner`] trait and the implementations that
//! turn a [`ScanRoot`] into raw observations for the checker.
//!
//! # Available Scanners
//!
//! | Scanner | Looks for | Produces |
//! |---------|-----------|----------|
//! | [`PackageWalker`] | `node_modules` trees | installed packages, ghost directories |
//! | [`RootSurvey`] | malware payload file names, `yarn.lock`, `package-lock.json`, `npm-shrinkwrap.json` | forensic artifacts, pinned packages |
//!
//! Which roots get scanned is decided by the [`locator`].
//!
//! # Example
//!
//! ```no_run
//! use hulud_detect::intel::IocIndex;
//! use hulud_detect::model::ScanRoot;
//! use hulud_detect::scanner::{all_scanners, Candidates};
//!
//! let root = ScanRoot::project(".");
//! let index = IocIndex::new();
//! let mut found = Candidates::default();
//! for scanner in all_scanners() {
//!     found.extend(scanner.scan(&root, &index));
//! }
//! println!("{} packages seen", found.packages.len());
//! ```

pub mod locator;
pub mod lockfile;
mod survey;
mod walker;

pub use locator::Locator;
pub use survey::RootSurvey;
pub use walker::PackageWalker;

use crate::intel::IocIndex;
use crate::model::{DiscoveredPackage, GhostCandidate, ObservedArtifact, ScanRoot};

/// Trait for extracting observations from one scan root.
///
/// Scanning never fails: unreadable directories and unparsable files are
/// logged and skipped, so a partially readable root still yields whatever
/// could be read.
pub trait Scanner: Send + Sync {
    /// Returns the human-readable name of this scanner.
    fn name(&self) -> &'static str;

    /// Scans `root`. The index is only consulted to recognize ghost
    /// directories; matching happens in the checker.
    fn scan(&self, root: &ScanRoot, index: &IocIndex) -> Candidates;
}

/// Everything the scanners observed, in discovery order.
#[derive(Debug, Default)]
pub struct Candidates {
    pub packages: Vec<DiscoveredPackage>,
    pub ghosts: Vec<GhostCandidate>,
    pub artifacts: Vec<ObservedArtifact>,
}

impl Candidates {
    pub fn extend(&mut self, other: Candidates) {
        self.packages.extend(other.packages);
        self.ghosts.extend(other.ghosts);
        self.artifacts.extend(other.artifacts);
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.ghosts.is_empty() && self.artifacts.is_empty()
    }
}

/// Returns every scanner, in discovery order: installed packages come
/// before locked ones.
///
/// ```
/// use hulud_detect::scanner::all_scanners;
///
/// let names: Vec<_> = all_scanners().iter().map(|s| s.name()).collect();
/// assert_eq!(names, ["installed packages", "root survey"]);
/// ```
pub fn all_scanners() -> Vec<Box<dyn Scanner>> {
    vec![Box::new(PackageWalker), Box::new(RootSurvey)]
}
