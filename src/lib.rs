//! Live Streams Fetcher Library
//!
//! Crawls a radio station directory, resolves every advertised stream to the
//! endpoint that actually plays, validates it, estimates its bitrate, and
//! renders the survivors as a live streams definition file.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
