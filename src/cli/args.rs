//! Command-line argument parsing for the live streams fetcher
//!
//! This module defines the CLI structure using clap derive macros: crawling
//! the directory into a definition file, checking a single stream URL, and
//! managing the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;

/// Live Streams Fetcher - Build a live radio stream list from a directory
#[derive(Parser, Debug)]
#[command(
    name = "live_streams_fetcher",
    version,
    about = "Collect working radio streams into a live streams definition file",
    long_about = "Crawls a radio directory listing, follows every advertised stream to its real endpoint,
keeps only the ones that actually deliver audio, and writes them as a SiiNunit live streams definition."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the directory and write the live streams definition
    Crawl(CrawlArgs),

    /// Resolve and validate a single stream URL
    Check(CheckArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the crawl command
#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Directory listing URL (overrides the configuration)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of listing pages to crawl
    #[arg(short, long, value_name = "N")]
    pub pages: Option<usize>,

    /// Output definition file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pages crawled concurrently
    #[arg(long, value_name = "N")]
    pub page_batch: Option<usize>,

    /// Stations per page validated concurrently
    #[arg(long, value_name = "N")]
    pub station_batch: Option<usize>,

    /// Also write the stations as JSON
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Crawl and report, but do not write any file
    #[arg(long)]
    pub dry_run: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Stream URL as advertised
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level, falling back to `configured` without flags
    pub fn log_level(&self, configured: &str) -> String {
        if self.global.quiet {
            "warn".to_string()
        } else if self.global.very_verbose {
            "trace".to_string()
        } else if self.global.verbose {
            "debug".to_string()
        } else {
            configured.to_ascii_lowercase()
        }
    }
}

impl CrawlArgs {
    /// Reject zero counts before they reach the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.pages == Some(0) {
            return Err("Number of pages must be greater than 0".to_string());
        }
        if self.page_batch == Some(0) || self.station_batch == Some(0) {
            return Err("Batch sizes must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Apply the command-line overrides to a loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.crawl.base_url = base_url.clone();
        }
        if let Some(pages) = self.pages {
            config.crawl.page_count = pages;
        }
        if let Some(page_batch) = self.page_batch {
            config.crawl.page_batch_size = page_batch;
        }
        if let Some(station_batch) = self.station_batch {
            config.crawl.station_batch_size = station_batch;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
    }
}
