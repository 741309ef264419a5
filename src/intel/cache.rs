use super::clock::Clock;
use super::feed;
use super::fetch::FeedFetcher;
use super::offline::OfflineSnapshot;
use super::{FeedKind, FeedSource};
use crate::cache::{CachedFeed, FeedCache};
use crate::model::FeedOrigin;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default freshness window for cached feed bodies.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// A feed body and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedFeed {
    pub kind: FeedKind,
    pub body: String,
    pub origin: FeedOrigin,
}

/// Time-bounded, fallback-capable loader for raw threat-intel feeds.
///
/// Resolution order per feed:
///
/// 1. in-memory copy younger than the TTL
/// 2. on-disk copy younger than the TTL (if a disk cache is attached)
/// 3. network fetch
/// 4. any older cached copy, when the fetch failed
/// 5. the offline snapshot
///
/// A fetched body that fails [`feed::validate`] counts as a failed fetch and
/// never replaces a cached copy. With `bypass` set, steps 1, 2 and 4 are
/// skipped. A failed fetch is logged and never surfaces as an error.
pub struct IntelCache {
    fetcher: Box<dyn FeedFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    memory: HashMap<FeedKind, CachedFeed>,
    disk: Option<FeedCache>,
    offline: OfflineSnapshot,
    bypass: bool,
}

impl IntelCache {
    pub fn new(fetcher: Box<dyn FeedFetcher>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            fetcher,
            clock,
            ttl,
            memory: HashMap::new(),
            disk: None,
            offline: OfflineSnapshot::bundled(),
            bypass: false,
        }
    }

    pub fn with_disk(mut self, disk: FeedCache) -> Self {
        self.disk = Some(disk);
        self
    }

    pub fn with_offline(mut self, offline: OfflineSnapshot) -> Self {
        self.offline = offline;
        self
    }

    /// Forces a network fetch on every load.
    pub fn bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn offline(&self) -> &OfflineSnapshot {
        &self.offline
    }

    /// Loads one feed.
    pub async fn load(&mut self, source: &FeedSource) -> LoadedFeed {
        if let Some(hit) = self.fresh(source.kind) {
            return hit;
        }
        let fetched = self.fetch(source).await;
        self.settle(source.kind, fetched)
    }

    /// Loads two feeds, fetching whichever are not cached concurrently.
    pub async fn load_pair(
        &mut self,
        first: &FeedSource,
        second: &FeedSource,
    ) -> (LoadedFeed, LoadedFeed) {
        let first_hit = self.fresh(first.kind);
        let second_hit = self.fresh(second.kind);

        let fetch_first = first_hit.is_none();
        let fetch_second = second_hit.is_none();

        let (first_fetch, second_fetch) = {
            let this = &*self;
            futures::join!(
                async {
                    if fetch_first {
                        this.fetch(first).await
                    } else {
                        None
                    }
                },
                async {
                    if fetch_second {
                        this.fetch(second).await
                    } else {
                        None
                    }
                }
            )
        };

        let first_loaded = match first_hit {
            Some(hit) => hit,
            None => self.settle(first.kind, first_fetch),
        };
        let second_loaded = match second_hit {
            Some(hit) => hit,
            None => self.settle(second.kind, second_fetch),
        };

        (first_loaded, second_loaded)
    }

    /// Serves a cached copy younger than the TTL, promoting disk hits into
    /// memory.
    fn fresh(&mut self, kind: FeedKind) -> Option<LoadedFeed> {
        if self.bypass {
            return None;
        }

        let now = self.clock.now();

        if let Some(entry) = self.memory.get(&kind) {
            if entry.is_fresh(now, self.ttl) {
                debug!(feed = kind.as_str(), "serving feed from memory");
                return Some(LoadedFeed {
                    kind,
                    body: entry.body.clone(),
                    origin: FeedOrigin::Memory,
                });
            }
        }

        let entry: CachedFeed = self.disk.as_ref()?.get(kind.cache_key())?;
        if !entry.is_fresh(now, self.ttl) {
            return None;
        }

        debug!(feed = kind.as_str(), "serving feed from disk cache");
        let body = entry.body.clone();
        self.memory.insert(kind, entry);
        Some(LoadedFeed {
            kind,
            body,
            origin: FeedOrigin::Disk,
        })
    }

    async fn fetch(&self, source: &FeedSource) -> Option<String> {
        let url = match &source.url {
            Some(url) => url,
            None => {
                debug!(feed = source.kind.as_str(), "no feed URL configured");
                return None;
            }
        };

        match self.fetcher.fetch(url).await {
            Ok(body) => match feed::validate(source.kind, &body) {
                Ok(()) => Some(body),
                Err(e) => {
                    warn!(feed = source.kind.as_str(), error = %e, "feed body rejected, falling back");
                    None
                }
            },
            Err(e) => {
                warn!(feed = source.kind.as_str(), error = %e, "feed fetch failed, falling back");
                None
            }
        }
    }

    /// Records a fetch outcome and picks the body to use. `fetched` is
    /// already validated.
    fn settle(&mut self, kind: FeedKind, fetched: Option<String>) -> LoadedFeed {
        if let Some(body) = fetched {
            let entry = CachedFeed::new(body.clone(), self.clock.now());
            if let Some(disk) = &self.disk {
                if let Err(e) = disk.set(kind.cache_key(), &entry) {
                    debug!(feed = kind.as_str(), error = %e, "could not persist feed");
                }
            }
            self.memory.insert(kind, entry);
            info!(feed = kind.as_str(), "fetched feed");
            return LoadedFeed {
                kind,
                body,
                origin: FeedOrigin::Network,
            };
        }

        if !self.bypass {
            if let Some(stale) = self.stale(kind) {
                info!(feed = kind.as_str(), fetched_at = %stale.fetched_at, "using stale cached feed");
                return LoadedFeed {
                    kind,
                    body: stale.body,
                    origin: FeedOrigin::Stale,
                };
            }
        }

        info!(feed = kind.as_str(), "using offline snapshot");
        LoadedFeed {
            kind,
            body: self.offline.load(kind),
            origin: FeedOrigin::Offline,
        }
    }

    fn stale(&self, kind: FeedKind) -> Option<CachedFeed> {
        self.memory
            .get(&kind)
            .cloned()
            .or_else(|| self.disk.as_ref()?.get(kind.cache_key()))
    }
}
