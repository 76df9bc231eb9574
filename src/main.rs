//! Gridscout main entry point
//!
//! Command-line interface for the grid-sweep business collector.

use clap::Parser;
use gridscout::collector::{collect, CollectOptions};
use gridscout::config::{load_config_with_hash, Config};
use gridscout::geo::{cell_edge_meters, plan_grid};
use gridscout::net::{BoundaryResolver, NominatimResolver};
use gridscout::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gridscout: grid-sweep collector for location-search results
///
/// Partitions an area into query cells, sweeps each cell through the
/// provider's paginated search endpoint, deduplicates the results, and
/// optionally enriches them with place details and reviews. Interrupted
/// runs resume from their checkpoint.
#[derive(Parser, Debug)]
#[command(name = "gridscout")]
#[command(version = "1.0.0")]
#[command(about = "Grid-sweep collector for location-search results", long_about = None)]
struct Cli {
    /// Area to collect, e.g. "Springfield, USA"
    area: String,

    /// Business category to search for, e.g. "tax lawyers"
    category: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Buffer distance around the boundary for result filtering (km)
    #[arg(long, default_value_t = 5.0)]
    buffer_km: f64,

    /// Fetch place details for every collected business
    #[arg(long)]
    enrich: bool,

    /// Fetch reviews for every collected business (implies enrichment)
    #[arg(long)]
    reviews: bool,

    /// Maximum reviews per business
    #[arg(long, default_value_t = 20)]
    reviews_limit: u32,

    /// Concurrent search workers
    #[arg(long, default_value_t = 20)]
    workers: usize,

    /// Concurrent enrichment workers
    #[arg(long, default_value_t = 5)]
    enrichment_workers: usize,

    /// Save a checkpoint after every N accepted records
    #[arg(long, default_value_t = 100)]
    checkpoint_interval: u64,

    /// Ignore any existing checkpoint and start fresh
    #[arg(long)]
    fresh: bool,

    /// Partition by named sub-regions instead of uniform tiling
    #[arg(long)]
    subdivide: bool,

    /// Resolve the boundary and show the partition plan without querying
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
            config
        }
        None => Config::default(),
    };

    let options = CollectOptions {
        buffer_km: cli.buffer_km,
        enrich_details: cli.enrich || cli.reviews,
        enrich_reviews: cli.reviews,
        reviews_limit: cli.reviews_limit,
        search_workers: cli.workers,
        enrichment_workers: cli.enrichment_workers,
        checkpoint_interval: cli.checkpoint_interval,
        resume: !cli.fresh,
        subdivide: cli.subdivide,
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &config).await;
    }

    // Flip the cancellation flag on the first interrupt signal
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests...");
            let _ = cancel_tx.send(true);
        }
    });

    match collect(&cli.area, &cli.category, &options, config, cancel_rx).await {
        Ok(result) => {
            print_statistics(&result.statistics);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gridscout=info,warn"),
            1 => EnvFilter::new("gridscout=debug,info"),
            2 => EnvFilter::new("gridscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Handles --dry-run: resolve the boundary, show the plan, change nothing
async fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== Gridscout Dry Run ===\n");

    let resolver = NominatimResolver::new(config.proxy_url().as_deref())?;
    let boundary = resolver.resolve(&cli.area).await?;

    println!("Area: {}", cli.area);
    println!("Category: {}", cli.category);
    println!(
        "Boundary: N={:.4} S={:.4} E={:.4} W={:.4}",
        boundary.north, boundary.south, boundary.east, boundary.west
    );
    println!(
        "Extent: {:.1} km × {:.1} km",
        boundary.width_km(),
        boundary.height_km()
    );

    let edge = cell_edge_meters(&boundary);
    let cells = plan_grid(&boundary);
    println!("Cell edge: {} m", edge);
    println!("Cells: {}", cells.len());
    println!(
        "Filter boundary: buffered by {:.1} km on all sides",
        cli.buffer_km
    );
    println!(
        "Page size: {} results, {} search workers",
        config.search.results_per_page, cli.workers
    );

    println!("\n✓ Would sweep {} cells", cells.len());
    Ok(())
}
