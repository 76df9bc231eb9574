//! The collection engine
//!
//! This module contains the concurrent core: the adaptive rate limiter, the
//! per-cell search executor, the dedup/boundary filter, the enrichment
//! pipeline, and the coordinator that composes them into one resumable run.

mod coordinator;
mod enrichment;
mod executor;
mod filter;
mod limiter;

pub use coordinator::Collector;
pub use enrichment::{EnrichStatus, EnrichmentConfig, EnrichmentPipeline, EnrichmentStats};
pub use executor::{build_search_fields, search_url, CellFailure, CellSweep, SearchExecutor, SearchQuery};
pub use filter::{Admission, DedupFilter, FilterCounts};
pub use limiter::RateLimiter;

use crate::config::Config;
use crate::net::{HttpTransport, NominatimResolver};
use crate::output::{CollectionResult, JsonOutput};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Per-run options exposed to callers
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Buffer distance around the boundary for result filtering (km)
    pub buffer_km: f64,
    /// Fetch place details for accepted records
    pub enrich_details: bool,
    /// Fetch reviews for accepted records
    pub enrich_reviews: bool,
    /// Maximum reviews per business
    pub reviews_limit: u32,
    pub search_workers: usize,
    pub enrichment_workers: usize,
    /// Save a checkpoint after every N newly accepted records
    pub checkpoint_interval: u64,
    /// Resume from an existing checkpoint when one matches
    pub resume: bool,
    /// Partition by named sub-regions instead of uniform tiling
    pub subdivide: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            buffer_km: 5.0,
            enrich_details: false,
            enrich_reviews: false,
            reviews_limit: 20,
            search_workers: 20,
            enrichment_workers: 5,
            checkpoint_interval: 100,
            resume: true,
            subdivide: false,
        }
    }
}

/// Runs one collection with the production transport, resolver, and JSON
/// output sink.
///
/// This is the single synchronous-looking entry point callers use; all
/// failure conditions surface through [`ScoutError`].
///
/// [`ScoutError`]: crate::ScoutError
pub async fn collect(
    area: &str,
    category: &str,
    options: &CollectOptions,
    config: Config,
    cancel: watch::Receiver<bool>,
) -> Result<CollectionResult> {
    let proxy = config.proxy_url();
    let transport = HttpTransport::new(proxy.as_deref(), config.cookie_header())?;
    let resolver = NominatimResolver::new(proxy.as_deref())?;
    let sink = Arc::new(JsonOutput::create(
        Path::new(&config.output.dir),
        area,
        category,
    )?);

    Collector::new(transport, resolver, config)
        .with_sink(sink)
        .collect(area, category, options, cancel)
        .await
}
