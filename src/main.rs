//! Live Streams Fetcher CLI application
//!
//! Command-line interface for building a live radio streams definition from
//! a station directory. Every advertised stream is resolved and validated
//! before it is written.

use std::process;

use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use live_streams_fetcher::cli::{handle_check, handle_config, handle_crawl, Cli, Commands};
use live_streams_fetcher::config::AppConfig;
use live_streams_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await;

    match &config {
        Ok(config) => init_logging(&cli, &config.logging.level, config.logging.colored_output),
        Err(_) => init_logging(&cli, "info", true),
    }

    info!("Live Streams Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let Cli { global, command } = cli;
    match command {
        Commands::Crawl(args) => {
            info!("Executing crawl command");
            handle_crawl(args, config?, &global).await
        }
        Commands::Check(args) => {
            info!("Executing check command");
            handle_check(args, config?).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, config, &global).await
        }
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, configured_level: &str, colored: bool) {
    let log_level = cli.log_level(configured_level);

    let mut filter = EnvFilter::from_default_env();
    match format!("live_streams_fetcher={}", log_level).parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", log_level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(colored && atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
