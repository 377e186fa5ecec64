//! Integration tests for the crawl coordinator
//!
//! A wiremock server plays both the directory and the stream hosts, so whole
//! crawls run from listing page to rendered definition file.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use live_streams_fetcher::app::{
    render_live_streams, write_live_streams, BrokenEndpointSet, ClientConfig, Coordinator,
    CrawlConfig, CrawlEvent, OutputConfig, RunContext, StreamConfig,
};
use live_streams_fetcher::AppError;

/// One directory page listing `stations` as (stream URL, name, genre)
fn directory_page(stations: &[(&str, &str, &str)]) -> String {
    let items: String = stations
        .iter()
        .map(|(stream, name, genre)| {
            format!(
                r#"<li class="stations__station">
                     <button class="b-play station_play" stream="{}" radioName="{}"></button>
                     <a href="/ua/genre/{}/">{}</a>
                   </li>"#,
                stream, name, genre, genre
            )
        })
        .collect();
    format!(
        "<html><body><ul class=\"stations__list\">{}</ul></body></html>",
        items
    )
}

async fn mount_page(server: &MockServer, html: String) {
    Mock::given(method("GET"))
        .and(path("/ua/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

async fn mount_audio(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0xFFu8; 200], "audio/mpeg"))
        .mount(server)
        .await;
}

/// Coordinator over one page of the mock directory, without pacing delays
fn coordinator(server: &MockServer) -> Coordinator {
    let client = ClientConfig {
        max_retries: 1,
        ..Default::default()
    };
    let stream = StreamConfig {
        validation_timeout: Duration::from_secs(3),
        validation_retry_delay: Duration::from_millis(10),
        sample_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let ctx = RunContext::new(&client, stream, BrokenEndpointSet::builtin()).unwrap();
    let config = CrawlConfig::default()
        .with_base_url(format!("{}/ua/", server.uri()))
        .with_page_count(1)
        .with_delays(Duration::ZERO, Duration::ZERO);
    Coordinator::new(Arc::new(ctx), config)
}

#[tokio::test]
async fn test_end_to_end_single_page() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let station_a = format!("{}/a/stream", uri);
    let station_b = format!("{}/radio_ua_hls/b", uri);

    mount_page(
        &server,
        directory_page(&[
            (&station_a, "Radio A", "pop"),
            (&station_b, "Radio B", "rock"),
        ]),
    )
    .await;
    mount_audio(&server, "/a/stream").await;
    mount_audio(&server, "/radio_ua_hls/b").await;

    let coordinator = coordinator(&server);
    let report = assert_ok!(coordinator.run().await);

    assert_eq!(report.stations.len(), 1);
    assert_eq!(report.stats.skipped_known_broken, 1);
    assert_eq!(report.stats.candidates_found, 2);

    let content = render_live_streams(&report.stations, &OutputConfig::default());
    assert!(content.contains(" stream_data: 1\n"));
    // No ladder value in URL or name, and the body is too short to sample
    assert!(content.contains(&format!(
        " stream_data[0]: \"{}|Radio A|Pop|UA|320|0\"\n",
        station_a
    )));
    assert!(!content.contains("stream_data[1]"));
    assert!(!content.contains("Radio B"));

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("live_streams.sii");
    write_live_streams(&output, &content).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), content);
}

#[tokio::test]
async fn test_duplicates_collapse_to_last_seen() {
    let server = MockServer::start().await;
    let uri = server.uri();

    for route in ["/one", "/two"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/same.mp3"))
            .mount(&server)
            .await;
    }
    mount_audio(&server, "/same.mp3").await;
    mount_page(
        &server,
        directory_page(&[
            (&format!("{}/one", uri), "One", "pop"),
            (&format!("{}/two", uri), "Two", "pop"),
        ]),
    )
    .await;

    let report = coordinator(&server).run().await.unwrap();

    assert_eq!(report.stations.len(), 1);
    assert_eq!(report.stations[0].stream_url, format!("{}/same.mp3", uri));
    assert_eq!(report.stations[0].display_name, "Two");
    assert_eq!(report.stats.duplicates_collapsed, 1);
    assert_eq!(report.stats.stations_accepted, 2);
}

#[tokio::test]
async fn test_stations_are_ordered_by_stream_url() {
    let server = MockServer::start().await;
    let uri = server.uri();

    for route in ["/zeta.mp3", "/Alpha.mp3", "/beta.mp3"] {
        mount_audio(&server, route).await;
    }
    mount_page(
        &server,
        directory_page(&[
            (&format!("{}/zeta.mp3", uri), "Zeta 128", "jazz"),
            (&format!("{}/Alpha.mp3", uri), "Alpha", "jazz"),
            (&format!("{}/beta.mp3", uri), "Beta", "jazz"),
        ]),
    )
    .await;

    let report = coordinator(&server).run().await.unwrap();

    let urls: Vec<&str> = report
        .stations
        .iter()
        .map(|s| s.stream_url.as_str())
        .collect();
    // Ordinal comparison puts upper case first
    assert_eq!(
        urls,
        vec![
            format!("{}/Alpha.mp3", uri),
            format!("{}/beta.mp3", uri),
            format!("{}/zeta.mp3", uri),
        ]
    );
    // The bitrate in the station name is used when the URL has none
    assert_eq!(report.stations[2].bitrate.map(|b| b.kbps()), Some(128));
}

#[tokio::test]
async fn test_empty_directory_is_an_error() {
    let server = MockServer::start().await;
    mount_page(&server, directory_page(&[])).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator = coordinator(&server).with_events(tx);

    let result = coordinator.run().await;
    assert!(matches!(result, Err(AppError::NoStationsFound { pages: 1 })));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events.as_slice(),
        [
            CrawlEvent::PageCompleted { candidates: 0, .. },
            CrawlEvent::BatchCompleted { batch: 1, batches: 1, stations: 0 },
        ]
    ));
}

#[tokio::test]
async fn test_events_follow_accepted_stations() {
    let server = MockServer::start().await;
    let uri = server.uri();
    mount_audio(&server, "/live").await;
    mount_page(
        &server,
        directory_page(&[(&format!("{}/live", uri), "Live", "news")]),
    )
    .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let report = coordinator(&server).with_events(tx).run().await.unwrap();
    assert_eq!(report.stations.len(), 1);

    let mut accepted = 0;
    let mut pages = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            CrawlEvent::StationAccepted { name, .. } => {
                assert_eq!(name, "Live");
                accepted += 1;
            }
            CrawlEvent::PageCompleted { accepted: n, .. } => {
                assert_eq!(n, 1);
                pages += 1;
            }
            CrawlEvent::BatchCompleted { .. } => {}
        }
    }
    assert_eq!((accepted, pages), (1, 1));
}
