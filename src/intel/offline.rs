use super::FeedKind;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const BUNDLED_CSV: &str = include_str!("../../data/compromised-packages.csv");
const BUNDLED_JSON: &str = include_str!("../../data/compromised-packages.json");

/// Where an offline body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// A file in the offline directory.
    Directory,
    /// The copy compiled into the binary.
    Bundled,
}

/// Last-resort feed bodies, used verbatim when neither the cache nor the
/// network can serve a feed.
///
/// Files dropped into the offline directory by the updater take precedence
/// over the copies compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct OfflineSnapshot {
    dir: Option<PathBuf>,
}

impl OfflineSnapshot {
    /// Only the compiled-in snapshot.
    pub fn bundled() -> Self {
        Self { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// The snapshot body for `kind`. Falling back to the compiled-in copy is
    /// logged, since it only covers a sample of the published lists.
    pub fn load(&self, kind: FeedKind) -> String {
        let (body, source) = self.resolve(kind);
        if source == SnapshotSource::Bundled {
            match kind {
                FeedKind::Csv => warn!(
                    feed = kind.as_str(),
                    "using the reduced CSV snapshot bundled in the binary; put {} in the offline directory for full coverage",
                    kind.snapshot_file()
                ),
                FeedKind::Json => info!(feed = kind.as_str(), "using the JSON snapshot bundled in the binary"),
            }
        }
        body
    }

    pub fn resolve(&self, kind: FeedKind) -> (String, SnapshotSource) {
        if let Some(dir) = &self.dir {
            let path = dir.join(kind.snapshot_file());
            match fs::read_to_string(&path) {
                Ok(body) => return (body, SnapshotSource::Directory),
                Err(e) => debug!(path = %path.display(), error = %e, "no offline snapshot on disk"),
            }
        }
        (Self::bundled_body(kind).to_string(), SnapshotSource::Bundled)
    }

    pub fn bundled_body(kind: FeedKind) -> &'static str {
        match kind {
            FeedKind::Csv => BUNDLED_CSV,
            FeedKind::Json => BUNDLED_JSON,
        }
    }
}
