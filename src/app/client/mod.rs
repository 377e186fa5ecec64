//! HTTP client layer for directory and stream access
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: the retrying fetcher with rate limiting and backoff

pub mod config;
pub mod http;

pub use config::ClientConfig;
pub use http::RetryingFetcher;
