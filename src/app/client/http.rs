//! Core HTTP operations with rate limiting and retry logic
//!
//! This module provides the fundamental HTTP request operations with
//! built-in resilience patterns: a shared rate limiter, capped exponential
//! backoff with jitter, and a session cookie jar shared by both clients.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::cookie::Jar;
use reqwest::header::RANGE;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::constants::limits;
use crate::errors::{FetchError, FetchResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct RetryingFetcher {
    client: Client,
    probe_client: Client,
    rate_limiter: DirectRateLimiter,
    cookies: Arc<Jar>,
    max_retries: u32,
    request_timeout: Duration,
}

impl RetryingFetcher {
    /// Creates a fetcher with both HTTP clients built from `config`
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if a client cannot be built or the rate limit is zero
    pub fn new(config: &ClientConfig) -> FetchResult<Self> {
        let cookies = Arc::new(Jar::default());
        let client = config.build_http_client(Arc::clone(&cookies))?;
        let probe_client = config.build_probe_client(Arc::clone(&cookies))?;
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;

        Ok(Self {
            client,
            probe_client,
            rate_limiter,
            cookies,
            max_retries: config.max_retries,
            request_timeout: config.request_timeout,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(rate_limit_rps: u32) -> FetchResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| FetchError::InvalidRateLimit {
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Backoff before retry number `attempt` (1-based)
    ///
    /// `min(200ms * 1.2^attempt + jitter(0..100ms), 1000ms)`
    pub fn backoff_delay(attempt: u32) -> Duration {
        let exponential = limits::RETRY_BASE_DELAY_MS as f64
            * limits::RETRY_BACKOFF_FACTOR.powi(attempt as i32);
        let jitter = fastrand::u64(0..limits::RETRY_JITTER_MS);
        let delay_ms = (exponential as u64).saturating_add(jitter);
        Duration::from_millis(delay_ms.min(limits::MAX_BACKOFF_MS))
    }

    /// Fetches `url` with the configured retry count and timeout
    pub async fn get(&self, url: &Url) -> FetchResult<Response> {
        self.fetch(url, self.max_retries, self.request_timeout).await
    }

    /// Fetches the HTTP response with rate limiting and retry logic
    ///
    /// Each attempt gets a fresh `timeout`. Timeouts, connection errors and
    /// HTTP 429/503 responses are retried up to `max_retries` times; any other
    /// response is returned to the caller whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RetriesExhausted` once every attempt has failed
    pub async fn fetch(
        &self,
        url: &Url,
        max_retries: u32,
        timeout: Duration,
    ) -> FetchResult<Response> {
        let mut retries = 0;
        loop {
            // Apply rate limiting with jitter to avoid thundering herd
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
                .await;

            let failure = match self.client.get(url.as_str()).timeout(timeout).send().await {
                Ok(response)
                    if response.status() == StatusCode::TOO_MANY_REQUESTS
                        || response.status() == StatusCode::SERVICE_UNAVAILABLE =>
                {
                    format!("HTTP {}", response.status().as_u16())
                }
                Ok(response) => {
                    tracing::debug!("Fetched {} -> {}", url, response.url());
                    return Ok(response);
                }
                Err(e) if e.is_timeout() => format!("timed out after {:?}", timeout),
                Err(e) => e.to_string(),
            };

            if retries >= max_retries {
                tracing::debug!(
                    "Request to {} failed after {} attempts: {}",
                    url,
                    retries + 1,
                    failure
                );
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: retries + 1,
                    reason: failure,
                });
            }

            retries += 1;
            let delay = Self::backoff_delay(retries);
            tracing::debug!(
                "Request to {} failed (attempt {}/{}): {}. Retrying in {}ms",
                url,
                retries,
                max_retries + 1,
                failure,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Fetches the text of a page, requiring a success status
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails after retries, the status is
    /// not 2xx, or the body cannot be read
    pub async fn fetch_page(&self, url: &Url) -> FetchResult<String> {
        let response = self.get(url).await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let text = response.text().await?;
        tracing::debug!("Fetched page {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Single non-redirecting GET used by stream validation probes
    ///
    /// The caller owns the time budget; no per-request timeout is applied.
    pub async fn probe(&self, url: &Url, range: Option<&str>) -> Result<Response, reqwest::Error> {
        let mut request = self.probe_client.get(url.as_str());
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }
        request.send().await
    }

    /// Single redirect-following GET with its own timeout, no retries
    pub async fn open(&self, url: &Url, timeout: Duration) -> Result<Response, reqwest::Error> {
        self.client.get(url.as_str()).timeout(timeout).send().await
    }

    /// Cookie jar shared by both clients of this fetcher
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }
}
