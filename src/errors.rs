//! Error types for the live streams fetcher
//!
//! Each pipeline stage has its own error enum so that component boundaries can
//! decide precisely which failures are "skip this item" and which propagate.
//! Everything is unified under [`AppError`] for the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Network errors raised by the retrying fetcher
#[derive(Error, Debug)]
pub enum FetchError {
    /// All attempts failed with a timeout, network error or retryable status
    #[error("Request to {url} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned a non-success status where a body was required
    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// HTTP client error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Rate limiter could not be created
    #[error("Invalid rate limit: {reason}")]
    InvalidRateLimit { reason: String },
}

/// Markup errors raised while reading directory or wrapper pages
#[derive(Error, Debug)]
pub enum ParseError {
    /// CSS selector error
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

/// Stream resolution and validation errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// URL is syntactically invalid or uses an unsupported format/source
    #[error("Unsupported stream {url}: {reason}")]
    FormatRejected { url: String, reason: String },

    /// URL is on the known-broken list
    #[error("Known broken endpoint: {url}")]
    KnownBroken { url: String },

    /// Endpoint was reachable but did not deliver audio
    #[error("Stream validation failed for {url}: {reason}")]
    ValidationFailed { url: String, reason: String },

    /// Content type is not recognised as audio
    #[error("Not an audio stream: {url} ({content_type})")]
    NotAudio { url: String, content_type: String },

    /// Underlying fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Output writer errors
#[derive(Error, Debug)]
pub enum OutputError {
    /// I/O error while writing the output file
    #[error("Failed to write output file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic rename failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No user configuration directory could be determined
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Stream error
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Output error
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The whole crawl produced nothing
    #[error("No stations found across {pages} directory pages")]
    NoStationsFound { pages: usize },

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(FetchError::RetriesExhausted { .. })
                | AppError::Fetch(FetchError::Http(_))
                | AppError::Stream(StreamError::Fetch(_))
                | AppError::Stream(StreamError::ValidationFailed { .. })
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Parse(_) => "parse",
            AppError::Stream(_) => "stream",
            AppError::Output(_) => "output",
            AppError::Config(_) => "config",
            AppError::NoStationsFound { .. } => "crawl",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Parse result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Stream result type alias
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Output result type alias
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
