//! Application constants for the live streams fetcher
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain. Most of them are only defaults: the
//! runtime values live in the configuration structs.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (X11; Linux x86_64) LiveStreamsFetcher/0.1 (+stream validator)";

    /// Default timeout for a single fetch attempt
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Maximum number of redirects the fetch layer follows transparently
    pub const MAX_REDIRECTS: usize = 10;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for outgoing fetches (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;

    /// Retries after the first failed fetch (3 attempts in total)
    pub const MAX_RETRIES: u32 = 2;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 200;

    /// Growth factor per attempt
    pub const RETRY_BACKOFF_FACTOR: f64 = 1.2;

    /// Upper bound (exclusive) of the random jitter added to each delay
    pub const RETRY_JITTER_MS: u64 = 100;

    /// Maximum backoff delay (milliseconds)
    pub const MAX_BACKOFF_MS: u64 = 1000;
}

/// Directory site layout
pub mod directory {
    /// Default listing URL
    pub const BASE_URL: &str = "https://onlineradiobox.com/ua/?cs=ua.radiorelax.com.ua";

    /// Number of listing pages crawled by default
    pub const PAGE_COUNT: usize = 15;

    /// Timezone token appended to every page URL
    pub const TZ_TOKEN: &str = "Europe%2FWarsaw";

    /// CSS selector for station containers
    pub const STATION_SELECTOR: &str = ".stations__station";

    /// CSS selector for buttons inside a station container
    pub const BUTTON_SELECTOR: &str = "button";

    /// CSS selector for links inside a station container
    pub const LINK_SELECTOR: &str = "a[href]";

    /// Exact class attribute of the play control
    pub const PLAY_BUTTON_CLASS: &str = "b-play station_play";

    /// Attribute holding the advertised stream URL
    pub const STREAM_ATTR: &str = "stream";

    /// Attribute holding the station display name
    pub const NAME_ATTR: &str = "radioName";

    /// Link fragment identifying the genre anchor
    pub const GENRE_PATH_MARKER: &str = "/ua/genre/";

    /// Genre used when a station has none
    pub const UNKNOWN_GENRE: &str = "Unknown";
}

/// Stream resolution and validation
pub mod stream {
    use super::Duration;

    /// Range requested by validation probes
    pub const PROBE_RANGE: &str = "bytes=0-16384";

    /// Hard wall-clock budget for one validation
    pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(12);

    /// Bytes that prove an endpoint is live
    pub const MIN_VALID_BYTES: usize = 128;

    /// Maximum redirect hops chased by the validator
    pub const MAX_REDIRECT_HOPS: u32 = 5;

    /// Extra validation attempts for embedded or accepted sources
    pub const MAX_STREAM_VALIDATION_RETRIES: u32 = 2;

    /// Linear delay step between validation attempts
    pub const VALIDATION_RETRY_DELAY: Duration = Duration::from_millis(500);

    /// MIME types accepted as audio without further heuristics
    pub const SUPPORTED_AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/mp3"];

    /// Substrings marking formats this pipeline does not play
    pub const UNSUPPORTED_FORMATS: &[&str] = &["m3u8", "aac", "ogg"];

    /// Hosts that never serve a stream themselves
    pub const DISALLOWED_HOST_PREFIXES: &[&str] = &["onlineradiobox.com", "www.onlineradiobox.com"];
}

/// Bitrate estimation
pub mod bitrate {
    use super::Duration;

    /// Standard bitrates, ascending
    pub const LADDER: [u32; 6] = [128, 160, 192, 224, 256, 320];

    /// Bytes sampled for a timing estimate
    pub const SAMPLE_BYTES: usize = 65_536;

    /// Budget for the timing sample
    pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(8);

    /// Bitrate written when none could be determined
    pub const DEFAULT_KBPS: u32 = 320;
}

/// Known dead endpoints
pub mod broken {
    /// Exact URLs that never deliver audio
    pub const URLS: &[&str] = &[
        "http://online.radiorelax.com.ua/RadioRelax",
        "http://cast.mediaonline.net.ua/radiozemlyaki",
        "https://stream.radiojazz.ua/radiojazz",
    ];

    /// Stable path fragments of endpoints whose URLs embed volatile tokens
    pub const PATTERNS: &[&str] = &["/radio_ua_hls/", "tavr.media/HitFM_Ukr", "?token=expired"];
}

/// Worker and concurrency configuration
pub mod workers {
    use super::Duration;

    /// Directory pages processed in parallel
    pub const PAGE_BATCH_SIZE: usize = 3;

    /// Stations resolved in parallel within one page
    pub const STATION_BATCH_SIZE: usize = 5;

    /// Pause between page batches
    pub const BATCH_DELAY: Duration = Duration::from_millis(1000);

    /// Pause between station sub-batches
    pub const STATION_BATCH_DELAY: Duration = Duration::from_millis(250);
}

/// Output file constants
pub mod output {
    /// Default output file name
    pub const DEFAULT_OUTPUT_FILE: &str = "live_streams.sii";

    /// Country code written for every station
    pub const COUNTRY_CODE: &str = "UA";

    /// Trailing flag written for every station
    pub const STREAM_FLAG: &str = "0";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "live-streams.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "live-streams-fetcher";

    /// File name inside the config dir
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use http::USER_AGENT;
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES};
pub use output::DEFAULT_OUTPUT_FILE;
pub use stream::MAX_STREAM_VALIDATION_RETRIES;
