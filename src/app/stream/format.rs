//! URL and content-type checks for stream candidates

use url::Url;

use crate::constants::stream;
use crate::errors::{StreamError, StreamResult};

/// Parse a stream URL, accepting only http and https
pub fn parse_stream_url(raw: &str) -> StreamResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| StreamError::FormatRejected {
        url: raw.to_string(),
        reason: format!("invalid URL: {}", e),
    })?;
    check_scheme(&url)?;
    Ok(url)
}

/// Reject formats and sources this pipeline cannot play
///
/// A URL is rejected when it contains `m3u8`, `aac` or `ogg` anywhere, or
/// when its host starts with one of `disallowed_host_prefixes`.
pub fn check_format(url: &Url, disallowed_host_prefixes: &[String]) -> StreamResult<()> {
    check_scheme(url)?;

    let lowered = url.as_str().to_ascii_lowercase();
    if let Some(format) = stream::UNSUPPORTED_FORMATS
        .iter()
        .find(|format| lowered.contains(*format))
    {
        return Err(StreamError::FormatRejected {
            url: url.to_string(),
            reason: format!("unsupported format '{}'", format),
        });
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if let Some(prefix) = disallowed_host_prefixes
        .iter()
        .find(|prefix| !prefix.is_empty() && host.starts_with(&prefix.to_ascii_lowercase()))
    {
        return Err(StreamError::FormatRejected {
            url: url.to_string(),
            reason: format!("host '{}' is not a stream source", prefix),
        });
    }

    Ok(())
}

fn check_scheme(url: &Url) -> StreamResult<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(StreamError::FormatRejected {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// MIME type without parameters, trimmed and lower-cased
pub fn base_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Exact match against the MIME types the output format supports
pub fn is_supported_audio_type(mime: &str) -> bool {
    stream::SUPPORTED_AUDIO_TYPES.contains(&mime)
}

/// Whether a non-HTML content type is accepted as audio
///
/// With `octet_stream_heuristic` off only genuine `audio/*` types pass.
pub fn is_audio_content_type(mime: &str, octet_stream_heuristic: bool) -> bool {
    if is_supported_audio_type(mime) || mime.contains("audio/") {
        return true;
    }
    octet_stream_heuristic && (mime == "application/octet-stream" || mime.contains("stream"))
}
