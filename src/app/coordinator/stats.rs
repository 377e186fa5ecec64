//! Crawl statistics tracking
//!
//! Counters are bumped concurrently from page and station tasks, so they are
//! plain atomics; a [`CrawlStatsSnapshot`] is taken for reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live counters for one crawl
#[derive(Debug)]
pub struct CrawlStats {
    session_start: DateTime<Utc>,
    pages_scraped: AtomicUsize,
    pages_failed: AtomicUsize,
    candidates_found: AtomicUsize,
    skipped_known_broken: AtomicUsize,
    format_rejected: AtomicUsize,
    unresolved: AtomicUsize,
    stations_accepted: AtomicUsize,
    duplicates_collapsed: AtomicUsize,
    bitrate_from_text: AtomicUsize,
    bitrate_sampled: AtomicUsize,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self {
            session_start: Utc::now(),
            pages_scraped: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
            candidates_found: AtomicUsize::new(0),
            skipped_known_broken: AtomicUsize::new(0),
            format_rejected: AtomicUsize::new(0),
            unresolved: AtomicUsize::new(0),
            stations_accepted: AtomicUsize::new(0),
            duplicates_collapsed: AtomicUsize::new(0),
            bitrate_from_text: AtomicUsize::new(0),
            bitrate_sampled: AtomicUsize::new(0),
        }
    }
}

impl CrawlStats {
    /// Fresh counters starting now
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page_scraped(&self, candidates: usize) {
        self.pages_scraped.fetch_add(1, Ordering::Relaxed);
        self.candidates_found.fetch_add(candidates, Ordering::Relaxed);
    }

    pub fn record_page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_known_broken(&self) {
        self.skipped_known_broken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_format_rejected(&self) {
        self.format_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.stations_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_collapsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bitrate_from_text(&self) {
        self.bitrate_from_text.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bitrate_sampled(&self) {
        self.bitrate_sampled.fetch_add(1, Ordering::Relaxed);
    }

    /// Candidates dropped by the known-broken filter so far
    pub fn skipped_known_broken(&self) -> usize {
        self.skipped_known_broken.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CrawlStatsSnapshot {
        CrawlStatsSnapshot {
            session_start: self.session_start,
            session_duration: Utc::now()
                .signed_duration_since(self.session_start)
                .to_std()
                .unwrap_or(Duration::ZERO),
            pages_scraped: self.pages_scraped.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            candidates_found: self.candidates_found.load(Ordering::Relaxed),
            skipped_known_broken: self.skipped_known_broken.load(Ordering::Relaxed),
            format_rejected: self.format_rejected.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            stations_accepted: self.stations_accepted.load(Ordering::Relaxed),
            duplicates_collapsed: self.duplicates_collapsed.load(Ordering::Relaxed),
            bitrate_from_text: self.bitrate_from_text.load(Ordering::Relaxed),
            bitrate_sampled: self.bitrate_sampled.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`CrawlStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStatsSnapshot {
    /// Start time of the crawl
    pub session_start: DateTime<Utc>,
    /// Time elapsed since the start
    pub session_duration: Duration,
    /// Pages fetched and parsed
    pub pages_scraped: usize,
    /// Pages that could not be fetched
    pub pages_failed: usize,
    /// Candidates listed on the scraped pages
    pub candidates_found: usize,
    /// Candidates dropped by the known-broken filter
    pub skipped_known_broken: usize,
    /// Candidates rejected for format or source
    pub format_rejected: usize,
    /// Candidates that did not resolve to a live stream
    pub unresolved: usize,
    /// Stations that resolved and validated
    pub stations_accepted: usize,
    /// Accepted stations that overwrote an earlier one with the same URL
    pub duplicates_collapsed: usize,
    /// Bitrates read from the URL or name
    pub bitrate_from_text: usize,
    /// Bitrates measured from a timed sample
    pub bitrate_sampled: usize,
}

impl CrawlStatsSnapshot {
    /// Share of candidates that became stations, in percent
    pub fn acceptance_rate(&self) -> f64 {
        if self.candidates_found == 0 {
            return 0.0;
        }
        self.stations_accepted as f64 / self.candidates_found as f64 * 100.0
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} pages ({} failed), {} candidates, {} accepted ({} duplicates), {} known broken, {} rejected, {} unresolved in {:.1}s",
            self.pages_scraped,
            self.pages_failed,
            self.candidates_found,
            self.stations_accepted,
            self.duplicates_collapsed,
            self.skipped_known_broken,
            self.format_rejected,
            self.unresolved,
            self.session_duration.as_secs_f64()
        )
    }
}
