//! Candidate URL resolution
//!
//! Turns an advertised URL into the URL that actually plays: redirects are
//! followed, HTML player pages are unwrapped, and the final endpoint is
//! validated before it is accepted. Successful resolutions are cached for
//! the rest of the run.

use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use url::Url;

use crate::app::context::RunContext;
use crate::app::stream::validator::{validate_stream, validate_with_retries};
use crate::app::stream::{format, wrapper};
use crate::errors::{StreamError, StreamResult};

/// What was read from the fetched response before it was released
enum Fetched {
    /// No content type; whether the first chunk carried any bytes
    Untyped { has_bytes: bool },
    /// A wrapper page and its markup
    Html(String),
    /// Any other content type, already reduced to its base MIME type
    Typed(String),
}

/// Resolve a candidate to its playable URL, or `None`
///
/// Never fails; the reason for a rejection is logged and counted.
pub async fn resolve(ctx: &RunContext, candidate_url: &str) -> Option<String> {
    match try_resolve(ctx, candidate_url).await {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            match &e {
                StreamError::KnownBroken { .. } => ctx.stats().record_known_broken(),
                StreamError::FormatRejected { .. } => ctx.stats().record_format_rejected(),
                _ => ctx.stats().record_unresolved(),
            }
            tracing::debug!("Unresolved {}: {}", candidate_url, e);
            None
        }
    }
}

/// Resolve a candidate, keeping the reason for a rejection
pub async fn try_resolve(ctx: &RunContext, candidate_url: &str) -> StreamResult<String> {
    let settings = ctx.settings();
    let original = format::parse_stream_url(candidate_url)?;
    format::check_format(&original, &settings.disallowed_host_prefixes)?;
    ensure_not_broken(ctx, original.as_str())?;

    if let Some(cached) = ctx.cache().get(candidate_url) {
        if validate_stream(ctx, &cached).await {
            tracing::debug!("Cache hit for {} -> {}", candidate_url, cached);
            return Ok(cached);
        }
        tracing::debug!("Cached resolution for {} went stale", candidate_url);
        ctx.cache().evict(candidate_url);
    }

    let response = ctx.fetcher().get(&original).await?;
    let resolved = response.url().clone();
    if resolved != original {
        tracing::debug!("Redirected {} -> {}", original, resolved);
        format::check_format(&resolved, &settings.disallowed_host_prefixes)?;
        ensure_not_broken(ctx, resolved.as_str())?;
    }

    // Read what the content type calls for, then let the connection go
    let fetched = read_fetched(response).await;

    if !validate_stream(ctx, resolved.as_str()).await {
        return Err(StreamError::ValidationFailed {
            url: resolved.to_string(),
            reason: "endpoint did not deliver audio".to_string(),
        });
    }

    let accepted = match fetched {
        Fetched::Untyped { has_bytes: true } => resolved.to_string(),
        Fetched::Untyped { has_bytes: false } => {
            return Err(StreamError::ValidationFailed {
                url: resolved.to_string(),
                reason: "no content type and no body".to_string(),
            })
        }
        Fetched::Html(html) => unwrap_wrapper(ctx, &resolved, &html).await?,
        Fetched::Typed(mime) => {
            if !format::is_audio_content_type(&mime, settings.octet_stream_heuristic) {
                return Err(StreamError::NotAudio {
                    url: resolved.to_string(),
                    content_type: mime,
                });
            }
            if !validate_with_retries(ctx, resolved.as_str()).await {
                return Err(StreamError::ValidationFailed {
                    url: resolved.to_string(),
                    reason: format!("{} stream stopped responding", mime),
                });
            }
            resolved.to_string()
        }
    };

    ctx.cache().insert(candidate_url, accepted.as_str());
    tracing::debug!("Resolved {} -> {}", candidate_url, accepted);
    Ok(accepted)
}

async fn read_fetched(mut response: Response) -> Fetched {
    let mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(format::base_mime)
        .filter(|mime| !mime.is_empty());

    match mime.as_deref() {
        None => {
            let has_bytes = matches!(response.chunk().await, Ok(Some(chunk)) if !chunk.is_empty());
            Fetched::Untyped { has_bytes }
        }
        Some("text/html") => Fetched::Html(response.text().await.unwrap_or_default()),
        Some(other) => Fetched::Typed(other.to_string()),
    }
}

/// Find and validate the audio source embedded in a wrapper page
async fn unwrap_wrapper(ctx: &RunContext, page_url: &Url, html: &str) -> StreamResult<String> {
    let settings = ctx.settings();
    let sources = wrapper::embedded_audio_sources(html).map_err(|e| {
        StreamError::ValidationFailed {
            url: page_url.to_string(),
            reason: e.to_string(),
        }
    })?;

    if sources.is_empty() {
        // Last resort: the page URL itself may be a misconfigured stream
        if validate_with_retries(ctx, page_url.as_str()).await {
            return Ok(page_url.to_string());
        }
        return Err(StreamError::ValidationFailed {
            url: page_url.to_string(),
            reason: "wrapper page embeds no audio source".to_string(),
        });
    }

    for src in &sources {
        let absolute = match page_url.join(src) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping embedded source '{}' on {}: {}", src, page_url, e);
                continue;
            }
        };
        if ctx.broken().is_known_broken(absolute.as_str()) {
            tracing::debug!("Embedded source is known broken: {}", absolute);
            continue;
        }
        if let Err(e) = format::check_format(&absolute, &settings.disallowed_host_prefixes) {
            tracing::debug!("{}", e);
            continue;
        }
        if validate_with_retries(ctx, absolute.as_str()).await {
            tracing::debug!("Unwrapped {} -> {}", page_url, absolute);
            return Ok(absolute.to_string());
        }
    }

    Err(StreamError::ValidationFailed {
        url: page_url.to_string(),
        reason: format!("none of {} embedded sources delivered audio", sources.len()),
    })
}

fn ensure_not_broken(ctx: &RunContext, url: &str) -> StreamResult<()> {
    if ctx.broken().is_known_broken(url) {
        return Err(StreamError::KnownBroken {
            url: url.to_string(),
        });
    }
    Ok(())
}
