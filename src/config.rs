//! Configuration management for the live streams fetcher
//!
//! One TOML file configures every layer of the crawl. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration;
//! durations are written in human-readable form such as `"15s"` or
//! `"250ms"`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{BrokenEndpointSet, ClientConfig, CrawlConfig, OutputConfig, StreamConfig};
use crate::constants::{
    bitrate, config as paths, directory, http, limits, output, stream, workers,
};
use crate::errors::{ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfig,
    /// Directory listing and batching
    pub crawl: CrawlConfig,
    /// Stream validation and bitrate sampling
    pub stream: StreamConfig,
    /// Extra known-broken endpoints
    pub filter: FilterConfig,
    /// Definition file settings
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Known-broken endpoints on top of the built-in list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Start from the built-in deny-list
    pub use_builtin: bool,
    /// Exact stream URLs to skip
    pub broken_urls: Vec<String>,
    /// Substrings that mark a stream URL as broken
    pub broken_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_builtin: true,
            broken_urls: Vec::new(),
            broken_patterns: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level when no verbosity flag is given
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            colored_output: true,
        }
    }
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Explicit config file (must exist)
    /// 2. `./live-streams.toml`
    /// 3. `<config dir>/live-streams-fetcher/config.toml`
    /// 4. Defaults
    ///
    /// The loaded configuration is validated before it is returned.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::NotFound { path }.into()),
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the commented default configuration to `target`
    ///
    /// Returns `false` without touching anything if the file exists and
    /// `force` is not set.
    pub async fn initialize(target: &Path, force: bool) -> Result<bool> {
        if target.exists() && !force {
            debug!("Config file already exists: {}", target.display());
            return Ok(false);
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(target, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: target.to_path_buf(),
                source,
            })?;

        info!("Wrote default configuration to {}", target.display());
        Ok(true)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(paths::LOCAL_CONFIG_FILE)];
        if let Ok(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(paths::CONFIG_DIR_NAME)
            .join(paths::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            tracing::error!("Failed to parse config file {}: {}", path.display(), e);
            ConfigError::InvalidFormat(e)
        })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// The effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The built-in deny-list extended with the configured entries
    pub fn broken_endpoints(&self) -> BrokenEndpointSet {
        let base = if self.filter.use_builtin {
            BrokenEndpointSet::builtin()
        } else {
            BrokenEndpointSet::empty()
        };
        base.with_entries(
            self.filter.broken_urls.iter().cloned(),
            self.filter.broken_patterns.iter().cloned(),
        )
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, value: String, reason: String| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason,
        };

        self.client
            .validate()
            .map_err(|reason| invalid("client", self.client.user_agent.clone(), reason))?;
        self.crawl
            .validate()
            .map_err(|reason| invalid("crawl", self.crawl.base_url.clone(), reason))?;
        self.stream.validate().map_err(|reason| {
            invalid(
                "stream",
                format!("{:?}", self.stream.validation_timeout),
                reason,
            )
        })?;
        self.output
            .validate()
            .map_err(|reason| invalid("output", self.output.path.display().to_string(), reason))?;

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(invalid(
                "logging.level",
                self.logging.level.clone(),
                format!("Expected one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Live Streams Fetcher Configuration
# Every setting is optional; removed lines fall back to the defaults below.
# Durations accept human-readable values such as "15s", "250ms" or "1m".

[client]
# HTTP client settings
user_agent = "{user_agent}"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "{pool_idle}"
pool_max_per_host = {pool_max}
request_timeout = "{request_timeout}"
connect_timeout = "{connect_timeout}"
max_redirects = {max_redirects}
max_retries = {max_retries}  # retries after the first attempt
rate_limit_rps = {rate_limit}

[crawl]
# Directory listing to walk
base_url = "{base_url}"
page_count = {page_count}
tz_token = "{tz_token}"
# Concurrency and pacing
page_batch_size = {page_batch}
station_batch_size = {station_batch}
batch_delay = "{batch_delay}"
station_batch_delay = "{station_batch_delay}"

[stream]
# A stream is live once this many bytes arrive within the timeout
validation_timeout = "{validation_timeout}"
min_valid_bytes = {min_valid_bytes}
max_redirect_hops = {max_hops}
max_validation_retries = {validation_retries}
validation_retry_delay = "{retry_delay}"
# Accept application/octet-stream and *stream* content types as audio
octet_stream_heuristic = true
# Hosts that never serve a stream themselves
disallowed_host_prefixes = [{disallowed}]
# Timed sample used when the URL does not reveal the bitrate
sample_bytes = {sample_bytes}
sample_timeout = "{sample_timeout}"

[filter]
# Known-broken endpoints, on top of the built-in list
use_builtin = true
broken_urls = []
broken_patterns = []

[output]
path = "{output_path}"
country = "{country}"
flag = "{flag}"
default_bitrate = {default_bitrate}  # used when no bitrate could be detected

[logging]
level = "info"  # error, warn, info, debug, trace
colored_output = true
"#,
            user_agent = http::USER_AGENT,
            pool_idle = human(http::POOL_IDLE_TIMEOUT),
            pool_max = http::POOL_MAX_PER_HOST,
            request_timeout = human(http::DEFAULT_TIMEOUT),
            connect_timeout = human(http::CONNECT_TIMEOUT),
            max_redirects = http::MAX_REDIRECTS,
            max_retries = limits::MAX_RETRIES,
            rate_limit = limits::DEFAULT_RATE_LIMIT_RPS,
            base_url = directory::BASE_URL,
            page_count = directory::PAGE_COUNT,
            tz_token = directory::TZ_TOKEN,
            page_batch = workers::PAGE_BATCH_SIZE,
            station_batch = workers::STATION_BATCH_SIZE,
            batch_delay = human(workers::BATCH_DELAY),
            station_batch_delay = human(workers::STATION_BATCH_DELAY),
            validation_timeout = human(stream::VALIDATION_TIMEOUT),
            min_valid_bytes = stream::MIN_VALID_BYTES,
            max_hops = stream::MAX_REDIRECT_HOPS,
            validation_retries = stream::MAX_STREAM_VALIDATION_RETRIES,
            retry_delay = human(stream::VALIDATION_RETRY_DELAY),
            disallowed = stream::DISALLOWED_HOST_PREFIXES
                .iter()
                .map(|host| format!("\"{}\"", host))
                .collect::<Vec<_>>()
                .join(", "),
            sample_bytes = bitrate::SAMPLE_BYTES,
            sample_timeout = human(bitrate::SAMPLE_TIMEOUT),
            output_path = output::DEFAULT_OUTPUT_FILE,
            country = output::COUNTRY_CODE,
            flag = output::STREAM_FLAG,
            default_bitrate = bitrate::DEFAULT_KBPS,
        )
    }
}

fn human(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}
