//! Command handlers for the live streams fetcher CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments, the loaded configuration and the crawl pipeline.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::{
    detect_bitrate, render_live_streams, try_resolve, write_json, write_live_streams,
    Coordinator, RunContext,
};
use crate::cli::{
    CheckArgs, ConfigAction, ConfigArgs, CrawlArgs, GlobalArgs, ProgressConfig, ProgressDisplay,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the crawl command
///
/// Crawls the directory with the effective configuration, then writes the
/// definition file (and optionally JSON) unless this is a dry run.
pub async fn handle_crawl(
    args: CrawlArgs,
    mut config: AppConfig,
    global: &GlobalArgs,
) -> Result<()> {
    let start_time = Instant::now();

    args.validate().map_err(AppError::generic)?;
    args.apply(&mut config);
    config.validate()?;

    let ctx = RunContext::new(
        &config.client,
        config.stream.clone(),
        config.broken_endpoints(),
    )?;
    let (known_urls, known_patterns) = ctx.broken().counts();
    info!(
        "Starting crawl of {} ({} pages, {} known broken URLs, {} patterns)",
        config.crawl.base_url, config.crawl.page_count, known_urls, known_patterns
    );
    if !global.quiet {
        println!(
            "🚀 Crawling {} directory pages in batches of {}...",
            config.crawl.page_count, config.crawl.page_batch_size
        );
    }

    let progress_config = ProgressConfig {
        enable_progress_bars: !args.no_progress && !global.quiet,
        show_stations: global.verbose || global.very_verbose,
    };
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let progress_task =
        ProgressDisplay::new(progress_config, config.crawl.page_count)?.spawn(event_rx);

    let coordinator = Coordinator::new(Arc::new(ctx), config.crawl.clone()).with_events(event_tx);
    let result = coordinator.run().await;
    // Dropping the coordinator closes the event channel
    drop(coordinator);
    let tally = progress_task
        .await
        .map_err(|e| AppError::generic(format!("Progress task panicked: {}", e)))?;

    let report = result?;
    let content = render_live_streams(&report.stations, &config.output);

    if args.dry_run {
        info!("Dry run: nothing written");
        println!("{}", content);
    } else {
        write_live_streams(&config.output.path, &content).await?;
        if let Some(json_path) = &args.json {
            write_json(json_path, &report.stations).await?;
        }
    }

    let stats = &report.stats;
    let defaulted = report
        .stations
        .iter()
        .filter(|station| station.bitrate.is_none())
        .count();

    if !global.quiet {
        println!("\n📊 Crawl Summary:");
        println!("  Pages: {} ({} failed)", stats.pages_scraped, stats.pages_failed);
        println!("  Candidates: {}", stats.candidates_found);
        println!("  Known broken: {}", stats.skipped_known_broken);
        println!("  Rejected formats: {}", stats.format_rejected);
        println!("  Unresolved: {}", stats.unresolved);
        println!(
            "  Stations: {} ({} duplicates collapsed, {} at default bitrate)",
            report.stations.len(),
            stats.duplicates_collapsed,
            defaulted
        );
        println!("  Acceptance rate: {:.1}%", stats.acceptance_rate());
        println!("  Total time: {:?}", start_time.elapsed());
        if !args.dry_run {
            println!("  Written to: {}", config.output.path.display());
        }
    }

    if tally.pages != stats.pages_scraped + stats.pages_failed {
        warn!(
            "Progress saw {} pages, stats counted {}",
            tally.pages,
            stats.pages_scraped + stats.pages_failed
        );
    }
    Ok(())
}

/// Handle the check command
///
/// Resolves one advertised URL the same way a crawl would and reports the
/// playable endpoint and its bitrate.
pub async fn handle_check(args: CheckArgs, config: AppConfig) -> Result<()> {
    let ctx = RunContext::new(
        &config.client,
        config.stream.clone(),
        config.broken_endpoints(),
    )?;

    info!("Checking {}", args.url);
    match try_resolve(&ctx, &args.url).await {
        Ok(resolved) => {
            let bitrate = detect_bitrate(&ctx, &resolved).await;
            println!("✅ {}", args.url);
            if resolved != args.url {
                println!("   Resolves to: {}", resolved);
            }
            match bitrate {
                Some(bitrate) => println!("   Bitrate: {}", bitrate),
                None => println!(
                    "   Bitrate: unknown (would use {} kbps)",
                    config.output.default_bitrate
                ),
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ {}", args.url);
            println!("   {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration commands
///
/// `config` is the result of loading the configuration; `init` works even
/// when the existing file does not load.
pub async fn handle_config(
    args: ConfigArgs,
    config: Result<AppConfig>,
    global: &GlobalArgs,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let target = match &global.config {
                Some(path) => path.clone(),
                None => AppConfig::default_config_path()?,
            };
            if AppConfig::initialize(&target, force).await? {
                println!("📁 Created default configuration file:");
                println!("   {}", target.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("ℹ️  Configuration file already exists: {}", target.display());
                println!("   Use --force to overwrite it.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = config?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
