//! Command-line interface components
//!
//! This module contains CLI-specific code for the live streams fetcher,
//! including argument parsing, command handlers and the progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    CheckArgs, Cli, Commands, ConfigAction, ConfigArgs, CrawlArgs, GlobalArgs,
};
pub use commands::{handle_check, handle_config, handle_crawl};
pub use progress::{ProgressConfig, ProgressDisplay, ProgressTally};
