//! Crawl orchestration
//!
//! The coordinator walks the directory listing in page batches, resolves the
//! stations of each page in small concurrent sub-batches, and merges the
//! survivors into one map keyed by resolved stream URL. Merging happens on
//! the coordinating task between batches, so no lock is needed around the
//! result set.
//!
//! - [`config`] - Crawl configuration and page URL construction
//! - [`stats`] - Counters shared by all page and station tasks
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use live_streams_fetcher::app::{
//!     BrokenEndpointSet, ClientConfig, Coordinator, CrawlConfig, RunContext, StreamConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RunContext::new(
//!     &ClientConfig::default(),
//!     StreamConfig::default(),
//!     BrokenEndpointSet::builtin(),
//! )?;
//! let coordinator = Coordinator::new(Arc::new(ctx), CrawlConfig::default().with_page_count(2));
//!
//! let report = coordinator.run().await?;
//! println!("{} stations", report.stations.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod stats;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::context::RunContext;
use crate::app::models::{StationCandidate, ValidatedStation};
use crate::app::scraper;
use crate::app::stream::{bitrate_from_text, resolve, sample_bitrate};
use crate::errors::{AppError, ConfigError, Result};

pub use config::CrawlConfig;
pub use stats::{CrawlStats, CrawlStatsSnapshot};

/// Progress notifications emitted while a crawl runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A listing page and all of its stations are done
    PageCompleted {
        page_url: String,
        candidates: usize,
        accepted: usize,
    },
    /// A station passed validation
    StationAccepted { name: String, stream_url: String },
    /// A page batch was merged into the result set
    BatchCompleted {
        batch: usize,
        batches: usize,
        stations: usize,
    },
}

/// Outcome of a successful crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Unique stations ordered by resolved stream URL
    pub stations: Vec<ValidatedStation>,
    /// Counters at the end of the crawl
    pub stats: CrawlStatsSnapshot,
}

/// Drives one crawl over the directory listing
pub struct Coordinator {
    ctx: Arc<RunContext>,
    config: CrawlConfig,
    events: Option<mpsc::UnboundedSender<CrawlEvent>>,
}

impl Coordinator {
    /// Create a coordinator over a run context
    pub fn new(ctx: Arc<RunContext>, config: CrawlConfig) -> Self {
        Self {
            ctx,
            config,
            events: None,
        }
    }

    /// Send progress events to `sender` while running
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<CrawlEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.ctx
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run the crawl to completion
    ///
    /// Page and station failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an invalid crawl configuration,
    /// `FetchError` if the page URLs cannot be built, and
    /// `AppError::NoStationsFound` if no station survived validation
    pub async fn run(&self) -> Result<CrawlReport> {
        self.config
            .validate()
            .map_err(|reason| ConfigError::InvalidValue {
                field: "crawl".to_string(),
                value: self.config.base_url.clone(),
                reason,
            })?;

        let pages = self.config.page_urls()?;
        let batches = pages.len().div_ceil(self.config.page_batch_size);
        info!(
            "Crawling {} directory pages in {} batches of up to {}",
            pages.len(),
            batches,
            self.config.page_batch_size
        );

        let mut stations: BTreeMap<String, ValidatedStation> = BTreeMap::new();
        for (index, batch) in pages.chunks(self.config.page_batch_size).enumerate() {
            if index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let results = join_all(batch.iter().map(|page| self.process_page(page))).await;
            for station in results.into_iter().flatten() {
                if let Some(previous) = stations.insert(station.stream_url.clone(), station) {
                    self.ctx.stats().record_duplicate();
                    debug!(
                        "Duplicate stream {} ('{}' replaced)",
                        previous.stream_url, previous.display_name
                    );
                }
            }

            info!(
                "Batch {}/{} done: {} unique stations so far",
                index + 1,
                batches,
                stations.len()
            );
            self.emit(CrawlEvent::BatchCompleted {
                batch: index + 1,
                batches,
                stations: stations.len(),
            });
        }

        let stats = self.ctx.stats().snapshot();
        info!("Crawl finished: {}", stats.summary());

        if stations.is_empty() {
            warn!("No station survived validation");
            return Err(AppError::NoStationsFound { pages: pages.len() });
        }

        Ok(CrawlReport {
            stations: stations.into_values().collect(),
            stats,
        })
    }

    /// Scrape one page and resolve its stations in sub-batches
    async fn process_page(&self, page_url: &Url) -> Vec<ValidatedStation> {
        let candidates = scraper::scrape_page(&self.ctx, page_url).await;
        let mut accepted = Vec::new();

        for (index, chunk) in candidates
            .chunks(self.config.station_batch_size)
            .enumerate()
        {
            if index > 0 && !self.config.station_batch_delay.is_zero() {
                tokio::time::sleep(self.config.station_batch_delay).await;
            }
            let results = join_all(
                chunk
                    .iter()
                    .cloned()
                    .map(|candidate| self.process_candidate(candidate)),
            )
            .await;
            accepted.extend(results.into_iter().flatten());
        }

        debug!(
            "Page {}: {}/{} stations accepted",
            page_url,
            accepted.len(),
            candidates.len()
        );
        self.emit(CrawlEvent::PageCompleted {
            page_url: page_url.to_string(),
            candidates: candidates.len(),
            accepted: accepted.len(),
        });
        accepted
    }

    /// Resolve one candidate and assign its bitrate
    async fn process_candidate(&self, candidate: StationCandidate) -> Option<ValidatedStation> {
        let resolved = resolve(&self.ctx, &candidate.stream_url).await?;

        let bitrate = match bitrate_from_text(&resolved)
            .or_else(|| bitrate_from_text(&candidate.display_name))
        {
            Some(bitrate) => {
                self.ctx.stats().record_bitrate_from_text();
                Some(bitrate)
            }
            None => sample_bitrate(&self.ctx, &resolved).await,
        };

        self.ctx.stats().record_accepted();
        debug!(
            "Accepted '{}' -> {} ({})",
            candidate.display_name,
            resolved,
            bitrate.map_or_else(|| "default bitrate".to_string(), |b| b.to_string())
        );
        self.emit(CrawlEvent::StationAccepted {
            name: candidate.display_name.clone(),
            stream_url: resolved.clone(),
        });

        Some(ValidatedStation::from_candidate(candidate, resolved, bitrate))
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.events {
            // A closed receiver only means nobody is watching anymore
            let _ = sender.send(event);
        }
    }
}
