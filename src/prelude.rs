//! Prelude module for the Live Streams Fetcher library
//!
//! Re-exports the items needed for typical library use with a single
//! `use live_streams_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use live_streams_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let ctx = RunContext::new(&config.client, config.stream.clone(), config.broken_endpoints())?;
//!     let report = Coordinator::new(Arc::new(ctx), config.crawl.clone()).run().await?;
//!
//!     let content = render_live_streams(&report.stations, &config.output);
//!     write_live_streams(&config.output.path, &content).await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Configuration
pub use crate::config::AppConfig;

// Essential app components that are used in most integrations
pub use crate::app::{
    // Shared state
    BrokenEndpointSet,
    ClientConfig,
    // Core orchestration
    Coordinator,
    CrawlConfig,
    CrawlEvent,
    CrawlReport,
    OutputConfig,
    RunContext,
    StreamConfig,

    // Data types
    Bitrate,
    StationCandidate,
    ValidatedStation,

    // Single-stream operations
    detect_bitrate,
    render_live_streams,
    resolve,
    validate_stream,
    write_live_streams,
};

// Commonly used constants
pub use crate::constants::{DEFAULT_OUTPUT_FILE, USER_AGENT};

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
