//! Stream resolution, validation and bitrate estimation
//!
//! A candidate URL from a directory page goes through three steps before it
//! is trusted:
//!
//! - [`resolver`] follows redirects and unwraps HTML player pages (using
//!   [`wrapper`]) until it finds the real endpoint
//! - [`validator`] proves the endpoint is live by reading its first bytes
//!   under a hard time budget
//! - [`bitrate`] assigns a standard bitrate from the URL text or a timed
//!   sample
//!
//! [`format`] holds the URL and MIME checks shared by all three.

pub mod bitrate;
pub mod format;
pub mod resolver;
pub mod validator;
pub mod wrapper;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{bitrate as bitrate_constants, stream};

pub use bitrate::{bitrate_from_text, detect_bitrate, sample_bitrate};
pub use resolver::{resolve, try_resolve};
pub use validator::{validate_stream, validate_with_retries};

/// Tunables for resolution, validation and bitrate sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Hard wall-clock budget for one validation
    #[serde(with = "humantime_serde")]
    pub validation_timeout: Duration,
    /// Bytes that prove an endpoint is live
    pub min_valid_bytes: usize,
    /// Redirect hops the validator chases before giving up
    pub max_redirect_hops: u32,
    /// Extra attempts when validating an accepted or embedded source
    pub max_validation_retries: u32,
    /// Linear delay step between those attempts
    #[serde(with = "humantime_serde")]
    pub validation_retry_delay: Duration,
    /// Treat `application/octet-stream` and `*stream*` content types as audio
    pub octet_stream_heuristic: bool,
    /// Hosts that never serve a stream themselves
    pub disallowed_host_prefixes: Vec<String>,
    /// Bytes read for a timed bitrate sample
    pub sample_bytes: usize,
    /// Budget for the timed bitrate sample
    #[serde(with = "humantime_serde")]
    pub sample_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            validation_timeout: stream::VALIDATION_TIMEOUT,
            min_valid_bytes: stream::MIN_VALID_BYTES,
            max_redirect_hops: stream::MAX_REDIRECT_HOPS,
            max_validation_retries: stream::MAX_STREAM_VALIDATION_RETRIES,
            validation_retry_delay: stream::VALIDATION_RETRY_DELAY,
            octet_stream_heuristic: true,
            disallowed_host_prefixes: stream::DISALLOWED_HOST_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sample_bytes: bitrate_constants::SAMPLE_BYTES,
            sample_timeout: bitrate_constants::SAMPLE_TIMEOUT,
        }
    }
}

impl StreamConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.validation_timeout.is_zero() {
            return Err("Validation timeout cannot be zero".to_string());
        }
        if self.min_valid_bytes == 0 {
            return Err("Minimum valid bytes cannot be zero".to_string());
        }
        if self.sample_bytes == 0 {
            return Err("Bitrate sample size cannot be zero".to_string());
        }
        if self.sample_timeout.is_zero() {
            return Err("Bitrate sample timeout cannot be zero".to_string());
        }
        Ok(())
    }
}
