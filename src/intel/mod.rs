//! Threat-intel ingestion: feed loading, caching, parsing and indexing.
//!
//! Two feeds describe compromised packages:
//!
//! | Feed | Format | Meaning |
//! |------|--------|---------|
//! | CSV  | one package name per row | every version is compromised |
//! | JSON | `{"name": ["1.0.0", ...] \| "*"}` | listed versions, or all |
//!
//! [`IntelCache`] decides where each body comes from (memory, disk, network,
//! stale copy, offline snapshot) and [`build_index`] merges both feeds into an
//! [`IocIndex`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hulud_detect::intel::{build_index, FeedSource, HttpFetcher, IntelCache, IntelSources, SystemClock};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut cache = IntelCache::new(
//!         Box::new(HttpFetcher::new(Duration::from_secs(30))),
//!         Arc::new(SystemClock),
//!         chrono::Duration::minutes(30),
//!     );
//!     let sources = IntelSources {
//!         csv: FeedSource::csv(Some("https://example.com/packages.csv".to_string())),
//!         json: FeedSource::json(None),
//!     };
//!     let (index, summary) = build_index(&mut cache, &sources).await;
//!     println!("{} IOC entries ({} wildcard)", index.len(), summary.wildcard_entries);
//! }
//! ```

mod cache;
mod clock;
pub mod feed;
mod fetch;
mod index;
mod offline;

pub use cache::{IntelCache, LoadedFeed, DEFAULT_TTL_MINUTES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fetch::{FeedFetcher, HttpFetcher};
pub use index::{IocEntry, IocIndex, IocMatch};
pub use offline::{OfflineSnapshot, SnapshotSource};

use crate::model::{FeedOrigin, IntelSummary};
use tracing::{info, warn};

/// The two threat-intel feed formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Csv,
    Json,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Csv => "csv",
            FeedKind::Json => "json",
        }
    }

    pub fn cache_key(&self) -> &'static str {
        match self {
            FeedKind::Csv => "feed_csv",
            FeedKind::Json => "feed_json",
        }
    }

    /// File name of this feed's snapshot inside the offline directory.
    pub fn snapshot_file(&self) -> &'static str {
        match self {
            FeedKind::Csv => "compromised-packages.csv",
            FeedKind::Json => "compromised-packages.json",
        }
    }
}

/// A feed and the URL it is fetched from. Without a URL the feed is served
/// from cache or the offline snapshot only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub kind: FeedKind,
    pub url: Option<String>,
}

impl FeedSource {
    pub fn csv(url: Option<String>) -> Self {
        Self {
            kind: FeedKind::Csv,
            url,
        }
    }

    pub fn json(url: Option<String>) -> Self {
        Self {
            kind: FeedKind::Json,
            url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntelSources {
    pub csv: FeedSource,
    pub json: FeedSource,
}

/// Loads both feeds concurrently and merges them into one index.
///
/// Fetched bodies were already validated by the cache. A cached or offline
/// JSON body that still does not parse is replaced by the offline snapshot,
/// so this never fails.
pub async fn build_index(cache: &mut IntelCache, sources: &IntelSources) -> (IocIndex, IntelSummary) {
    let (csv, json) = cache.load_pair(&sources.csv, &sources.json).await;

    let csv_entries = feed::parse_csv(&csv.body);

    let (json_entries, json_origin) = match feed::parse_json(&json.body) {
        Ok(entries) => (entries, json.origin),
        Err(e) => {
            warn!(origin = json.origin.as_str(), error = %e, "JSON feed unreadable, using offline snapshot");
            (parse_offline_json(cache.offline()), FeedOrigin::Offline)
        }
    };

    let index = IocIndex::from_feeds(csv_entries, json_entries);
    let summary = IntelSummary {
        entries: index.len(),
        wildcard_entries: index.wildcard_count(),
        csv_origin: csv.origin,
        json_origin,
    };

    info!(
        entries = summary.entries,
        wildcard = summary.wildcard_entries,
        csv = csv.origin.as_str(),
        json = json_origin.as_str(),
        "threat intel loaded"
    );

    (index, summary)
}

/// Offline directory copy first, then the compiled-in one.
fn parse_offline_json(offline: &OfflineSnapshot) -> Vec<IocEntry> {
    feed::parse_json(&offline.load(FeedKind::Json))
        .or_else(|e| {
            warn!(error = %e, "offline JSON snapshot unreadable, using bundled copy");
            feed::parse_json(OfflineSnapshot::bundled_body(FeedKind::Json))
        })
        .unwrap_or_default()
}
