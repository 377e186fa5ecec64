//! Core application logic for the live streams fetcher
//!
//! This module contains the crawl pipeline: the HTTP client, directory page
//! scraping, stream resolution and validation, the coordinator that drives a
//! crawl, and the output writer.
//!
//! # Examples
//!
//! ```rust,no_run
//! use live_streams_fetcher::app::{
//!     resolve, BrokenEndpointSet, ClientConfig, RunContext, StreamConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RunContext::new(
//!     &ClientConfig::default(),
//!     StreamConfig::default(),
//!     BrokenEndpointSet::builtin(),
//! )?;
//!
//! match resolve(&ctx, "http://radio.example/live").await {
//!     Some(url) => println!("Plays from {}", url),
//!     None => println!("Not a live stream"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod broken;
pub mod cache;
pub mod client;
pub mod context;
pub mod coordinator;
pub mod models;
pub mod output;
pub mod scraper;
pub mod stream;

// Re-export main public API
pub use broken::BrokenEndpointSet;
pub use cache::StreamCache;
pub use client::{ClientConfig, RetryingFetcher};
pub use context::RunContext;
pub use coordinator::{
    Coordinator, CrawlConfig, CrawlEvent, CrawlReport, CrawlStats, CrawlStatsSnapshot,
};
pub use models::{Bitrate, StationCandidate, ValidatedStation};
pub use output::{render_live_streams, write_json, write_live_streams, OutputConfig};
pub use scraper::{parse_stations, scrape_page};
pub use stream::{
    bitrate_from_text, detect_bitrate, resolve, sample_bitrate, try_resolve, validate_stream,
    validate_with_retries, StreamConfig,
};
