//! Integration tests for stream resolution, validation and bitrate sampling
//!
//! Endpoints are served by wiremock; endpoints that stall mid-body are served
//! by a raw TCP listener, which wiremock cannot do.

use std::time::{Duration, Instant};

use reqwest::cookie::CookieStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use live_streams_fetcher::app::{
    detect_bitrate, resolve, sample_bitrate, try_resolve, validate_stream, BrokenEndpointSet,
    ClientConfig, RunContext, StreamConfig,
};
use live_streams_fetcher::errors::{FetchError, StreamError};

/// Context with fast retry settings for tests
fn test_context(stream: StreamConfig) -> RunContext {
    let client = ClientConfig {
        max_retries: 1,
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    RunContext::new(&client, stream, BrokenEndpointSet::builtin()).unwrap()
}

fn fast_stream_config() -> StreamConfig {
    StreamConfig {
        validation_timeout: Duration::from_secs(3),
        validation_retry_delay: Duration::from_millis(10),
        sample_timeout: Duration::from_secs(3),
        ..Default::default()
    }
}

fn audio(bytes: usize) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(vec![0xFFu8; bytes], "audio/mpeg")
}

fn redirect(to: &str) -> ResponseTemplate {
    ResponseTemplate::new(302).insert_header("Location", to)
}

/// Answer every connection with the raw bytes of `response`, then keep the
/// socket open for `hold`
async fn raw_server(response: Vec<u8>, hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;

                let _ = socket.write_all(&response).await;
                let _ = socket.flush().await;
                tokio::time::sleep(hold).await;
            });
        }
    });

    format!("http://{}/live", addr)
}

/// Serve `head` bytes of an audio body announced as much longer, then stall
async fn stalled_server(head: usize) -> String {
    let mut response =
        b"HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: 100000\r\n\r\n".to_vec();
    response.extend(vec![0xFFu8; head]);
    raw_server(response, Duration::from_secs(30)).await
}

#[tokio::test]
async fn test_short_audio_body_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/radio/live"))
        .respond_with(audio(200))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let url = format!("{}/radio/live", server.uri());

    assert!(validate_stream(&ctx, &url).await);
    assert_eq!(resolve(&ctx, &url).await, Some(url.clone()));
}

#[tokio::test]
async fn test_stalled_stream_is_accepted_after_threshold() {
    let url = stalled_server(128).await;
    let ctx = test_context(StreamConfig {
        validation_timeout: Duration::from_secs(10),
        ..fast_stream_config()
    });

    let started = Instant::now();
    assert!(validate_stream(&ctx, &url).await);
    // Early exit: no waiting for the rest of the body or the timeout
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_stall_before_threshold_times_out() {
    let url = stalled_server(10).await;
    let ctx = test_context(StreamConfig {
        validation_timeout: Duration::from_millis(500),
        ..fast_stream_config()
    });

    let started = Instant::now();
    assert!(!validate_stream(&ctx, &url).await);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_redirect_loop_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop-a"))
        .respond_with(redirect("/loop-b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop-b"))
        .respond_with(redirect("/loop-a"))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let url = format!("{}/loop-a", server.uri());

    assert!(!validate_stream(&ctx, &url).await);
    // Five hops are followed, the sixth redirect fails the validation
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn test_redirect_chain_within_limit_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hop1"))
        .respond_with(redirect("/hop2"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hop2"))
        .respond_with(redirect("/stream.mp3"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stream.mp3"))
        .respond_with(audio(512))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let resolved = try_resolve(&ctx, &format!("{}/hop1", server.uri()))
        .await
        .unwrap();
    assert_eq!(resolved, format!("{}/stream.mp3", server.uri()));
}

#[tokio::test]
async fn test_redirect_into_known_broken_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(redirect("/radio_ua_hls/stream"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/radio_ua_hls/stream"))
        .respond_with(audio(512))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let result = try_resolve(&ctx, &format!("{}/short", server.uri())).await;
    assert!(matches!(result, Err(StreamError::KnownBroken { .. })));
}

#[tokio::test]
async fn test_wrapper_page_is_unwrapped() {
    let server = MockServer::start().await;
    let player = r#"<html><body>
        <audio controls>
          <source src="/real.mp3" type="audio/mpeg">
        </audio>
        </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(player, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real.mp3"))
        .respond_with(audio(1024))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let advertised = format!("{}/player", server.uri());

    let resolved = resolve(&ctx, &advertised).await;
    assert_eq!(resolved, Some(format!("{}/real.mp3", server.uri())));
    assert_eq!(ctx.cache().get(&advertised), resolved);
}

#[tokio::test]
async fn test_wrapper_without_working_source_is_rejected() {
    let server = MockServer::start().await;
    let player = r#"<audio><source src="/gone.mp3" type="audio/mpeg"></audio>"#;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(player, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.mp3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    assert_eq!(resolve(&ctx, &format!("{}/player", server.uri())).await, None);
    assert_eq!(ctx.stats().snapshot().unresolved, 1);
}

#[tokio::test]
async fn test_unsupported_format_is_rejected_without_network() {
    let server = MockServer::start().await;
    let ctx = test_context(fast_stream_config());

    for suffix in ["/live/playlist.m3u8", "/radio.aac", "/radio.ogg"] {
        let result = try_resolve(&ctx, &format!("{}{}", server.uri(), suffix)).await;
        assert!(matches!(result, Err(StreamError::FormatRejected { .. })));
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_audio_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("all good", "text/plain"))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let result = try_resolve(&ctx, &format!("{}/status", server.uri())).await;
    assert!(matches!(result, Err(StreamError::NotAudio { .. })));
}

#[tokio::test]
async fn test_cached_resolution_is_reused_and_evicted_when_stale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(redirect("/stream.mp3"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stream.mp3"))
        .respond_with(audio(512))
        .up_to_n_times(3)
        .mount(&server)
        .await;

    let ctx = test_context(StreamConfig {
        max_validation_retries: 0,
        ..fast_stream_config()
    });
    let advertised = format!("{}/short", server.uri());
    let resolved = format!("{}/stream.mp3", server.uri());

    // First resolution: fetch, probe, retry-validation probe
    assert_eq!(resolve(&ctx, &advertised).await, Some(resolved.clone()));
    assert_eq!(ctx.cache().get(&advertised), Some(resolved.clone()));

    // The stream is gone now; the cached entry must not be trusted blindly
    assert_eq!(resolve(&ctx, &advertised).await, None);
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn test_bitrate_from_url_needs_no_network() {
    let server = MockServer::start().await;
    let ctx = test_context(fast_stream_config());

    let bitrate = detect_bitrate(&ctx, &format!("{}/live192", server.uri())).await;
    assert_eq!(bitrate.map(|b| b.kbps()), Some(192));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sampled_bitrate_snaps_to_ladder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(audio(65_536))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tiny"))
        .respond_with(audio(1_000))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());

    // A local server delivers far faster than any ladder step
    let fast = sample_bitrate(&ctx, &format!("{}/fast", server.uri())).await;
    assert_eq!(fast.map(|b| b.kbps()), Some(320));

    // A body shorter than the sample gives no estimate
    let tiny = sample_bitrate(&ctx, &format!("{}/tiny", server.uri())).await;
    assert_eq!(tiny, None);
    assert_eq!(ctx.stats().snapshot().bitrate_sampled, 1);
}

#[tokio::test]
async fn test_fetch_retries_unavailable_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(audio(64))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let url = Url::parse(&format!("{}/busy", server.uri())).unwrap();

    let response = ctx
        .fetcher()
        .fetch(&url, 2, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let url = Url::parse(&format!("{}/throttled", server.uri())).unwrap();

    let result = ctx.fetcher().fetch(&url, 1, Duration::from_secs(2)).await;
    assert!(matches!(
        result,
        Err(FetchError::RetriesExhausted { attempts: 2, .. })
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_retries_timeouts() {
    // Accepts connections but never answers
    let url = raw_server(Vec::new(), Duration::from_secs(30)).await;
    let ctx = test_context(fast_stream_config());
    let url = Url::parse(&url).unwrap();

    let result = ctx
        .fetcher()
        .fetch(&url, 1, Duration::from_millis(300))
        .await;
    match result {
        Err(FetchError::RetriesExhausted {
            attempts, reason, ..
        }) => {
            assert_eq!(attempts, 2);
            assert!(reason.contains("timed out"), "reason: {}", reason);
        }
        other => panic!("expected exhausted retries, got {:?}", other.map(|r| r.status())),
    }
}

#[tokio::test]
async fn test_session_cookie_is_replayed_to_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(audio(64).insert_header("Set-Cookie", "sid=42; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .and(header("cookie", "sid=42"))
        .respond_with(audio(64))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let login = Url::parse(&format!("{}/login", server.uri())).unwrap();
    let next = Url::parse(&format!("{}/next", server.uri())).unwrap();

    ctx.fetcher().get(&login).await.unwrap();
    let cookie = ctx.fetcher().cookies().cookies(&next).unwrap();
    assert_eq!(cookie.to_str().unwrap(), "sid=42");

    // Without the cookie the mock server answers 404
    let response = ctx.fetcher().get(&next).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Validation probes use the same jar
    let probed = ctx.fetcher().probe(&next, Some("bytes=0-16384")).await.unwrap();
    assert_eq!(probed.status().as_u16(), 200);
}

#[tokio::test]
async fn test_missing_content_type_is_accepted_with_bytes() {
    let mut response =
        b"HTTP/1.1 200 OK\r\nContent-Length: 200\r\nConnection: close\r\n\r\n".to_vec();
    response.extend(vec![0xFFu8; 200]);
    let url = raw_server(response, Duration::ZERO).await;

    let ctx = test_context(fast_stream_config());
    let resolved = try_resolve(&ctx, &url).await.unwrap();
    assert_eq!(resolved, url);
}

#[tokio::test]
async fn test_octet_stream_follows_heuristic_setting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/binary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0xFFu8; 512], "application/octet-stream"),
        )
        .mount(&server)
        .await;
    let url = format!("{}/binary", server.uri());

    let ctx = test_context(fast_stream_config());
    assert_eq!(try_resolve(&ctx, &url).await.unwrap(), url);

    let strict = test_context(StreamConfig {
        octet_stream_heuristic: false,
        ..fast_stream_config()
    });
    let result = try_resolve(&strict, &url).await;
    assert!(matches!(result, Err(StreamError::NotAudio { .. })));
}

#[tokio::test]
async fn test_wrapper_with_only_unsupported_sources_ignores_audio_src() {
    let server = MockServer::start().await;
    let player = r#"<audio src="/fallback.mp3">
          <source src="/live.ogg" type="audio/ogg">
        </audio>"#;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(player, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fallback.mp3"))
        .respond_with(audio(512))
        .mount(&server)
        .await;

    let ctx = test_context(fast_stream_config());
    let page = format!("{}/player", server.uri());

    // The page itself is the last resort and it does answer with bytes
    assert_eq!(try_resolve(&ctx, &page).await.unwrap(), page);
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/fallback.mp3"));
}
