//! Progress display for crawls
//!
//! A single indicatif bar over directory pages, fed by the coordinator's
//! [`CrawlEvent`]s. The bar is only drawn when stderr is a terminal; in any
//! other case the events are still consumed so the tally stays correct.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::CrawlEvent;
use crate::errors::{AppError, Result};

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable the visual progress bar
    pub enable_progress_bars: bool,
    /// Show the name of every accepted station under the bar
    pub show_stations: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            show_stations: false,
        }
    }
}

/// What the display saw while the crawl ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressTally {
    pub pages: usize,
    pub candidates: usize,
    pub accepted: usize,
}

/// Page progress bar driven by crawl events
pub struct ProgressDisplay {
    config: ProgressConfig,
    bar: Option<ProgressBar>,
    tally: ProgressTally,
}

impl ProgressDisplay {
    /// Create a display for a crawl over `total_pages` pages
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the bar template is invalid
    pub fn new(config: ProgressConfig, total_pages: usize) -> Result<Self> {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let bar = if config.enable_progress_bars && is_terminal {
            let bar = ProgressBar::new(total_pages as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}",
                    )
                    .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
                    .progress_chars("##-"),
            );
            bar.set_message("crawling");
            Some(bar)
        } else {
            debug!("Progress bar disabled (terminal: {})", is_terminal);
            None
        };

        Ok(Self {
            config,
            bar,
            tally: ProgressTally::default(),
        })
    }

    /// Apply one event to the bar and the tally
    pub fn update(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::PageCompleted {
                candidates,
                accepted,
                ..
            } => {
                self.tally.pages += 1;
                self.tally.candidates += candidates;
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
                debug!("Page done: {} candidates, {} accepted", candidates, accepted);
            }
            CrawlEvent::StationAccepted { name, .. } => {
                self.tally.accepted += 1;
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("{} stations", self.tally.accepted));
                    if self.config.show_stations {
                        bar.println(format!("  ✓ {}", name));
                    }
                }
            }
            CrawlEvent::BatchCompleted {
                batch,
                batches,
                stations,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!(
                        "{} unique stations (batch {}/{})",
                        stations, batch, batches
                    ));
                }
            }
        }
    }

    /// Consume events until the coordinator drops its sender
    pub fn spawn(
        mut self,
        mut events: mpsc::UnboundedReceiver<CrawlEvent>,
    ) -> JoinHandle<ProgressTally> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.update(&event);
            }
            self.finish()
        })
    }

    /// Clear the bar and return the tally
    pub fn finish(self) -> ProgressTally {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.tally
    }
}
