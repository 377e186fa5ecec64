//! Run-scoped shared state
//!
//! Everything that must be shared across pages and stations within one crawl
//! lives here: the fetcher (and its cookie jar), the stream cache, the
//! known-broken filter, the counters and the stream settings. The coordinator
//! owns one context per run and drops it when the run ends.

use crate::app::broken::BrokenEndpointSet;
use crate::app::cache::StreamCache;
use crate::app::client::{ClientConfig, RetryingFetcher};
use crate::app::coordinator::stats::CrawlStats;
use crate::app::stream::StreamConfig;
use crate::errors::FetchResult;

/// Shared state for one crawl
#[derive(Debug)]
pub struct RunContext {
    fetcher: RetryingFetcher,
    broken: BrokenEndpointSet,
    cache: StreamCache,
    stats: CrawlStats,
    settings: StreamConfig,
}

impl RunContext {
    /// Build a context with fresh clients, an empty cache and zeroed counters
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the HTTP clients cannot be built
    pub fn new(
        client_config: &ClientConfig,
        settings: StreamConfig,
        broken: BrokenEndpointSet,
    ) -> FetchResult<Self> {
        Ok(Self {
            fetcher: RetryingFetcher::new(client_config)?,
            broken,
            cache: StreamCache::new(),
            stats: CrawlStats::new(),
            settings,
        })
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    pub fn broken(&self) -> &BrokenEndpointSet {
        &self.broken
    }

    pub fn cache(&self) -> &StreamCache {
        &self.cache
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn settings(&self) -> &StreamConfig {
        &self.settings
    }

    /// Known-broken check that also bumps the skip counter on a hit
    pub fn skip_if_known_broken(&self, url: &str) -> bool {
        if self.broken.is_known_broken(url) {
            self.stats.record_known_broken();
            tracing::debug!("Skipping known broken endpoint: {}", url);
            true
        } else {
            false
        }
    }
}
