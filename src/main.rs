//! Brickscout main entry point
//!
//! Two stages, run independently: `crawl` walks the paginated search
//! results into a listings CSV, `enrich` geocodes a cleaned listings CSV
//! and appends proximity features.

use anyhow::Context;
use brickscout::config::{load_config_with_hash, Config};
use brickscout::crawler::{Crawler, HttpPageFetcher};
use brickscout::geo::{GeoCache, GeoEnricher, NominatimClient};
use brickscout::storage::{self, checkpoint};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Brickscout: a resumable real-estate listing scraper
///
/// Crawls Noida residential search results with checkpoint/resume and
/// courtesy delays, then enriches cleaned records with coordinates,
/// pincodes and metro proximity from Nominatim.
#[derive(Parser, Debug)]
#[command(name = "brickscout")]
#[command(version)]
#[command(about = "Scrape and geo-enrich Noida residential listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; compiled-in defaults when omitted
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl paginated search results into the listings CSV
    Crawl {
        /// Discard any existing checkpoint and start from page 1
        #[arg(long)]
        fresh: bool,
    },

    /// Geocode a cleaned listings CSV and append proximity features
    Enrich,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl { fresh } => handle_crawl(config, fresh).await,
        Command::Enrich => handle_enrich(config).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("brickscout=info,warn"),
            1 => EnvFilter::new("brickscout=debug,info"),
            2 => EnvFilter::new("brickscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or falls back to compiled-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::info!(
                "Configuration loaded from {} (hash: {})",
                path.display(),
                hash
            );
            Ok(config)
        }
        None => {
            tracing::info!("No config file given; using built-in defaults");
            Ok(Config::default())
        }
    }
}

/// Handles the crawl subcommand
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        checkpoint::clear(
            Path::new(&config.output.checkpoint_path),
            &config.output.checkpoint_meta_path(),
        )
        .context("failed to clear checkpoint files")?;
        tracing::info!("Starting fresh crawl (checkpoint discarded)");
    }

    let fetcher =
        HttpPageFetcher::new(&config.user_agent).context("failed to build HTTP client")?;
    let listings_path = config.output.listings_path.clone();

    let crawler = Crawler::new(config, fetcher);
    let records = crawler.run().await.context("crawl failed")?;

    tracing::info!(
        "Crawl complete: {} records written to {}",
        records.len(),
        listings_path
    );
    Ok(())
}

/// Handles the enrich subcommand
async fn handle_enrich(config: Config) -> anyhow::Result<()> {
    let input_path = Path::new(&config.geocode.input_path);
    let records = storage::load_listings(input_path).with_context(|| {
        format!(
            "cannot read cleaned input {}; ensure the cleaned file is present",
            input_path.display()
        )
    })?;
    tracing::info!(
        "Starting enrichment for {} listings from {}",
        records.len(),
        input_path.display()
    );

    let provider = NominatimClient::new(&config.geocode.endpoint, &config.user_agent)
        .context("failed to build geocoding client")?;
    let forward = GeoCache::load(&config.output.forward_cache_path);
    let reverse = GeoCache::load(&config.output.reverse_cache_path);

    let mut enricher = GeoEnricher::new(provider, forward, reverse, config.geocode.city.clone());
    let enriched = enricher.enrich(records).await.context("enrichment failed")?;

    storage::save_enriched(Path::new(&config.output.enriched_path), &enriched)
        .context("failed to write enriched output")?;
    tracing::info!(
        "Enrichment complete. Data saved to {}",
        config.output.enriched_path
    );
    Ok(())
}
