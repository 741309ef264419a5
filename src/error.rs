//! Typed errors for the detection engine.
//!
//! Only a few things can go wrong in a way the caller needs to distinguish:
//! a feed fetch failing or returning garbage (both recovered from) and a run
//! with nothing to scan.

use std::path::PathBuf;
use thiserror::Error;

/// A threat-intel feed could not be fetched. Never fatal to a scan.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A fetched feed body is not in the feed's format. Handled like a failed
/// fetch: the body is discarded and never cached.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("JSON feed is not an object: {0}")]
    NotAnObject(#[from] serde_json::Error),

    #[error("CSV feed is an HTML or XML document")]
    Markup,

    #[error("CSV feed entry {name:?} is not a package name")]
    BadName { name: String },
}

#[derive(Error, Debug)]
pub enum ScanError {
    /// Neither the project directory nor any full-scan location exists.
    #[error("no scan root could be resolved (project path: {})", project.display())]
    NoScanRoot { project: PathBuf },
}
