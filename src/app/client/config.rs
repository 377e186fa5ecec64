//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP
//! clients used by the fetcher. Two clients are built from one
//! configuration: one follows redirects transparently, the other never does
//! so that the stream validator can chase redirects itself. Both share one
//! cookie jar, so a session cookie set on any response is replayed by every
//! later request to that host.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{FetchError, FetchResult};

/// Configuration for the HTTP clients and the retry loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// TCP keep-alive settings
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Timeout for a single fetch attempt
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Redirects followed by the fetch layer
    pub max_redirects: usize,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            max_redirects: http::MAX_REDIRECTS,
            max_retries: limits::MAX_RETRIES,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds the redirect-following client used for pages and resolution
    pub fn build_http_client(&self, cookies: Arc<Jar>) -> FetchResult<Client> {
        self.builder(cookies)
            .redirect(Policy::limited(self.max_redirects))
            .build()
            .map_err(FetchError::Http)
    }

    /// Builds the client used by validation probes; redirects are returned as-is
    pub fn build_probe_client(&self, cookies: Arc<Jar>) -> FetchResult<Client> {
        self.builder(cookies)
            .redirect(Policy::none())
            .build()
            .map_err(FetchError::Http)
    }

    fn builder(&self, cookies: Arc<Jar>) -> reqwest::ClientBuilder {
        let mut client_builder = Client::builder()
            .cookie_provider(cookies)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout cannot be zero".to_string());
        }
        if self.rate_limit_rps == 0 {
            return Err("Rate limit must be non-zero".to_string());
        }
        Ok(())
    }
}
