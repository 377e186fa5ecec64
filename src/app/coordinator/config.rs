//! Configuration for the crawl coordinator
//!
//! Where to crawl and how hard: the directory listing to walk, and the batch
//! sizes and pauses that keep the load on the directory and on the stream
//! hosts polite.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{directory, workers};
use crate::errors::FetchError;

/// Configuration for one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Directory listing URL, possibly already carrying a query
    pub base_url: String,
    /// Number of listing pages to walk, starting at page 0
    pub page_count: usize,
    /// Time zone token appended to every page URL, already URL-encoded
    pub tz_token: String,
    /// Pages scraped concurrently
    pub page_batch_size: usize,
    /// Stations per page resolved concurrently
    pub station_batch_size: usize,
    /// Pause between page batches
    #[serde(with = "humantime_serde")]
    pub batch_delay: Duration,
    /// Pause between station sub-batches of one page
    #[serde(with = "humantime_serde")]
    pub station_batch_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: directory::BASE_URL.to_string(),
            page_count: directory::PAGE_COUNT,
            tz_token: directory::TZ_TOKEN.to_string(),
            page_batch_size: workers::PAGE_BATCH_SIZE,
            station_batch_size: workers::STATION_BATCH_SIZE,
            batch_delay: workers::BATCH_DELAY,
            station_batch_delay: workers::STATION_BATCH_DELAY,
        }
    }
}

impl CrawlConfig {
    /// Crawl a different listing
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the number of pages to walk
    pub fn with_page_count(mut self, pages: usize) -> Self {
        self.page_count = pages;
        self
    }

    /// Set both batch sizes
    pub fn with_batch_sizes(mut self, pages: usize, stations: usize) -> Self {
        self.page_batch_size = pages;
        self.station_batch_size = stations;
        self
    }

    /// Set both pacing delays
    pub fn with_delays(mut self, batch: Duration, station_batch: Duration) -> Self {
        self.batch_delay = batch;
        self.station_batch_delay = station_batch;
        self
    }

    /// URLs of the listing pages, in page order
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base URL does not parse
    pub fn page_urls(&self) -> Result<Vec<Url>, FetchError> {
        let base = self.base_url.trim();
        Url::parse(base).map_err(|e| FetchError::InvalidUrl {
            url: base.to_string(),
            error: e.to_string(),
        })?;

        let separator = if base.contains('?') { '&' } else { '?' };
        (0..self.page_count)
            .map(|page| {
                let raw = format!("{}{}p={}&tzLoc={}", base, separator, page, self.tz_token);
                Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
                    url: raw.clone(),
                    error: e.to_string(),
                })
            })
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.page_count == 0 {
            return Err("Page count cannot be zero".to_string());
        }

        if self.page_batch_size == 0 {
            return Err("Page batch size cannot be zero".to_string());
        }

        if self.station_batch_size == 0 {
            return Err("Station batch size cannot be zero".to_string());
        }

        if let Err(e) = Url::parse(self.base_url.trim()) {
            return Err(format!("Invalid base URL '{}': {}", self.base_url, e));
        }

        Ok(())
    }
}
