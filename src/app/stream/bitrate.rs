//! Bitrate estimation
//!
//! Stream URLs and station names often carry the bitrate ("/live320",
//! "Radio X 192kbps"), which is free to read. Otherwise a short sample is
//! timed and the measured rate is snapped to the standard ladder.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use url::Url;

use crate::app::context::RunContext;
use crate::app::models::Bitrate;
use crate::app::stream::validator::read_at_least;
use crate::errors::{StreamError, StreamResult};

fn bitrate_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^0-9])(128|160|192|224|256|320)(?:\s?k(?:bps|bit|b)?)?(?:[^0-9]|$)")
            .expect("bitrate pattern is valid")
    })
}

/// First ladder bitrate mentioned in `text`, if any
///
/// The number must not be part of a longer number, so ports like `:8128`
/// do not count.
pub fn bitrate_from_text(text: &str) -> Option<Bitrate> {
    bitrate_token()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|token| token.as_str().parse().ok())
        .and_then(Bitrate::from_ladder)
}

/// Bitrate from the URL text, or from a timed sample of the stream
pub async fn detect_bitrate(ctx: &RunContext, url: &str) -> Option<Bitrate> {
    if let Some(bitrate) = bitrate_from_text(url) {
        ctx.stats().record_bitrate_from_text();
        return Some(bitrate);
    }
    sample_bitrate(ctx, url).await
}

/// Time the download of `sample_bytes` bytes and snap the rate to the ladder
///
/// Returns `None` on timeout, error, or a stream that ends before the
/// sample is complete.
pub async fn sample_bitrate(ctx: &RunContext, url: &str) -> Option<Bitrate> {
    let settings = ctx.settings();
    let parsed = Url::parse(url).ok()?;
    let started = Instant::now();

    let sample = tokio::time::timeout(
        settings.sample_timeout,
        read_sample(ctx, &parsed, settings.sample_bytes),
    )
    .await;

    match sample {
        Ok(Ok(bytes)) => {
            let kbps = estimate_kbps(bytes, started.elapsed());
            let bitrate = Bitrate::snap(kbps);
            ctx.stats().record_bitrate_sampled();
            tracing::debug!("Sampled {} bytes from {}: ~{} kbps -> {}", bytes, url, kbps, bitrate);
            Some(bitrate)
        }
        Ok(Err(e)) => {
            tracing::debug!("Bitrate sample failed: {}", e);
            None
        }
        Err(_) => {
            tracing::debug!(
                "Bitrate sample of {} timed out after {:?}",
                url,
                settings.sample_timeout
            );
            None
        }
    }
}

async fn read_sample(ctx: &RunContext, url: &Url, target: usize) -> StreamResult<usize> {
    let failed = |reason: String| StreamError::ValidationFailed {
        url: url.to_string(),
        reason,
    };

    let mut response = ctx
        .fetcher()
        .open(url, ctx.settings().sample_timeout)
        .await
        .map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status().as_u16())));
    }

    let received = read_at_least(&mut response, target)
        .await
        .map_err(|e| failed(e.to_string()))?;
    if received < target {
        return Err(failed(format!(
            "stream ended after {} of {} sample bytes",
            received, target
        )));
    }
    Ok(received)
}

/// `round(bytes * 8 / seconds / 1000)`
pub fn estimate_kbps(bytes: usize, elapsed: Duration) -> u64 {
    // Guard against a zero clock reading on very fast local streams
    let seconds = elapsed.as_secs_f64().max(0.001);
    (bytes as f64 * 8.0 / seconds / 1000.0).round() as u64
}
