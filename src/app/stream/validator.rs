//! Stream liveness validation
//!
//! A stream is live if a ranged GET delivers its first bytes within the
//! validation budget. The body is never downloaded: the response is dropped
//! as soon as enough bytes have arrived, which also closes the connection.
//! Redirects are chased here rather than by the HTTP client so that every
//! hop is checked against the known-broken filter and the hop count stays
//! explicit.

use reqwest::header::LOCATION;
use reqwest::Response;
use url::Url;

use crate::app::context::RunContext;
use crate::app::stream::format;
use crate::constants::stream;
use crate::errors::{StreamError, StreamResult};

/// True if `url` delivers audio bytes within the validation budget
///
/// Never fails: every error, timeout or abort counts as "not live".
pub async fn validate_stream(ctx: &RunContext, url: &str) -> bool {
    match check_stream(ctx, url).await {
        Ok(()) => {
            tracing::debug!("Stream is live: {}", url);
            true
        }
        Err(e) => {
            tracing::debug!("{}", e);
            false
        }
    }
}

/// Validate with up to `max_validation_retries` extra attempts
///
/// Attempt `n` (0-based) is preceded by `validation_retry_delay * n`.
pub async fn validate_with_retries(ctx: &RunContext, url: &str) -> bool {
    let settings = ctx.settings();
    for attempt in 0..=settings.max_validation_retries {
        if attempt > 0 {
            tokio::time::sleep(settings.validation_retry_delay * attempt).await;
            tracing::debug!(
                "Re-validating {} (attempt {}/{})",
                url,
                attempt + 1,
                settings.max_validation_retries + 1
            );
        }
        if validate_stream(ctx, url).await {
            return true;
        }
    }
    false
}

/// Validation with the failure reason kept
pub async fn check_stream(ctx: &RunContext, url: &str) -> StreamResult<()> {
    if ctx.broken().is_known_broken(url) {
        return Err(StreamError::KnownBroken {
            url: url.to_string(),
        });
    }
    let start = format::parse_stream_url(url)?;

    let budget = ctx.settings().validation_timeout;
    // Dropping the probe future on expiry tears down its connection
    match tokio::time::timeout(budget, probe_chain(ctx, start)).await {
        Ok(result) => result,
        Err(_) => Err(StreamError::ValidationFailed {
            url: url.to_string(),
            reason: format!("no audio within {:?}", budget),
        }),
    }
}

async fn probe_chain(ctx: &RunContext, mut url: Url) -> StreamResult<()> {
    let settings = ctx.settings();
    let mut hops = 0u32;

    loop {
        let mut response = ctx
            .fetcher()
            .probe(&url, Some(stream::PROBE_RANGE))
            .await
            .map_err(|e| failed(&url, e.to_string()))?;
        let status = response.status();

        if status.is_redirection() {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
            {
                hops += 1;
                if hops > settings.max_redirect_hops {
                    return Err(failed(
                        &url,
                        format!("more than {} redirect hops", settings.max_redirect_hops),
                    ));
                }
                let next = url
                    .join(location)
                    .map_err(|e| failed(&url, format!("bad redirect target '{}': {}", location, e)))?;
                if ctx.broken().is_known_broken(next.as_str()) {
                    return Err(StreamError::KnownBroken {
                        url: next.to_string(),
                    });
                }
                tracing::trace!("Validation hop {}: {} -> {}", hops, url, next);
                url = next;
                continue;
            }
        }

        if !status.is_success() {
            return Err(failed(&url, format!("HTTP {}", status.as_u16())));
        }

        let received = read_at_least(&mut response, settings.min_valid_bytes)
            .await
            .map_err(|e| failed(&url, e.to_string()))?;

        // Short bodies still count as long as something arrived
        return if received > 0 {
            Ok(())
        } else {
            Err(failed(&url, "empty body".to_string()))
        };
    }
}

/// Read chunks until `threshold` bytes have arrived or the body ends
///
/// Returns the number of bytes received; the remainder of the body is left
/// unread.
pub(crate) async fn read_at_least(
    response: &mut Response,
    threshold: usize,
) -> Result<usize, reqwest::Error> {
    let mut received = 0;
    while received < threshold {
        match response.chunk().await? {
            Some(chunk) => received += chunk.len(),
            None => break,
        }
    }
    Ok(received)
}

fn failed(url: &Url, reason: String) -> StreamError {
    StreamError::ValidationFailed {
        url: url.to_string(),
        reason,
    }
}
