//! Collection coordinator - main run orchestration
//!
//! Drives one resumable run through its phases:
//! - `Init`: load a checkpoint if resume was requested
//! - `Partitioning`: resolve the boundary and build the cell plan (skipped
//!   on resume, the plan is already known)
//! - `Searching`: fan pending cells out to a bounded worker pool
//! - `Retrying`: re-run failed cells while attempt budget remains
//! - `Enriching`: details/reviews over the accepted set, if requested
//! - `Finalizing`: statistics, sink hand-off, checkpoint cleanup
//!
//! Cancellation stops dispatch, lets in-flight requests finish under their
//! timeouts, forces a final checkpoint save, and surfaces the distinguished
//! `Interrupted` error so the operator knows resume is possible.

use crate::collector::enrichment::{EnrichStatus, EnrichmentConfig, EnrichmentPipeline};
use crate::collector::executor::{SearchExecutor, SearchQuery};
use crate::collector::filter::{Admission, DedupFilter};
use crate::collector::limiter::RateLimiter;
use crate::collector::CollectOptions;
use crate::config::Config;
use crate::geo::{plan_grid, plan_subdivision, PartitionMode, SUBDIVISION_CATEGORIES};
use crate::net::{BoundaryResolver, ResolveError, Transport};
use crate::output::{
    CollectionResult, CollectionStatistics, EnrichmentMeta, NullSink, RecordSink, RunMetadata,
};
use crate::record::BusinessRecord;
use crate::state::{Cell, CellStatus, RunPhase, RunState, MAX_CELL_ATTEMPTS};
use crate::storage::CheckpointStore;
use crate::{ScoutError, Result};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;

/// Main collector: composes partitioning, search, dedup, retry, enrichment,
/// and checkpointing into one resumable run.
pub struct Collector<T: Transport, R: BoundaryResolver> {
    transport: Arc<T>,
    resolver: R,
    config: Config,
    sink: Arc<dyn RecordSink>,
}

/// State shared by every worker in one run
struct RunContext<T: Transport> {
    transport: Arc<T>,
    limiter: RateLimiter,
    query: SearchQuery,
    cells: Mutex<Vec<Cell>>,
    queue: Mutex<VecDeque<usize>>,
    filter: DedupFilter,
    records: Mutex<Vec<BusinessRecord>>,
    enriched_ids: Mutex<HashSet<String>>,
    sink: Arc<dyn RecordSink>,
    structural_warnings: AtomicU64,
    /// Records accepted by the run this one resumed, if any
    base_accepted: u64,
    checkpoint: Mutex<CheckpointGuard>,
    cancel: watch::Receiver<bool>,
}

/// Single-writer checkpoint access plus the snapshot skeleton
struct CheckpointGuard {
    store: CheckpointStore,
    skeleton: RunState,
    interval: u64,
    last_saved: u64,
}

impl<T: Transport, R: BoundaryResolver> Collector<T, R> {
    pub fn new(transport: T, resolver: R, config: Config) -> Self {
        Self {
            transport: Arc::new(transport),
            resolver,
            config,
            sink: Arc::new(NullSink),
        }
    }

    /// Replaces the default discard sink
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs one collection to completion (or interruption).
    ///
    /// `cancel` flips to `true` when the operator requests a stop; workers
    /// observe it between cells.
    pub async fn collect(
        &self,
        area: &str,
        category: &str,
        options: &CollectOptions,
        cancel: watch::Receiver<bool>,
    ) -> Result<CollectionResult> {
        let run_start = Instant::now();
        tracing::info!("Collecting {:?} in {:?}", category, area);

        // ===== Init =====
        let store = CheckpointStore::new(
            Path::new(&self.config.checkpoint.state_dir),
            area,
            category,
        );

        let resumed_state = if options.resume {
            match store.load() {
                Some(mut state) if state.matches(area, category) => {
                    state.prepare_resume();
                    let (pending, done, _) = state.cell_counts();
                    tracing::info!(
                        "Resuming from checkpoint: {} cells done, {} to go, {} records accepted",
                        done,
                        pending,
                        state.accepted_count
                    );
                    Some(state)
                }
                Some(_) => {
                    tracing::warn!("Checkpoint belongs to a different query, starting fresh");
                    None
                }
                None => None,
            }
        } else {
            None
        };

        // ===== Partitioning (skipped on resume) =====
        let state = match resumed_state {
            Some(state) => state,
            None => {
                tracing::info!("Phase {}: resolving {:?}", RunPhase::Partitioning, area);
                let boundary = match self.resolver.resolve(area).await {
                    Ok(boundary) => boundary,
                    Err(ResolveError::NotFound { .. }) => {
                        return Err(ScoutError::BoundaryNotFound {
                            area: area.to_string(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                };

                let (cells, mode) = self.partition(area, &boundary, options).await;
                tracing::info!("Partition plan: {} cells ({} mode)", cells.len(), mode);
                RunState::new(area, category, options.buffer_km, mode, boundary, cells)
            }
        };

        let filter_boundary = state.boundary.expanded(state.buffer_km);
        let filter = DedupFilter::new(filter_boundary.clone());
        filter.seed(&state.seen_place_ids, &state.seen_hex_ids);

        let base_accepted = state.accepted_count;
        let enriched_ids = state.enriched_ids.clone();
        let cells = state.cells.clone();

        let ctx = Arc::new(RunContext {
            transport: Arc::clone(&self.transport),
            limiter: RateLimiter::new(std::time::Duration::from_millis(
                self.config.search.base_delay_ms,
            )),
            query: SearchQuery {
                text: category.to_string(),
                page_size: self.config.search.results_per_page,
                viewport_dist: self.config.search.viewport_dist,
            },
            cells: Mutex::new(cells),
            queue: Mutex::new(VecDeque::new()),
            filter,
            records: Mutex::new(Vec::new()),
            enriched_ids: Mutex::new(enriched_ids),
            sink: Arc::clone(&self.sink),
            structural_warnings: AtomicU64::new(0),
            base_accepted,
            checkpoint: Mutex::new(CheckpointGuard {
                store,
                skeleton: state,
                interval: options.checkpoint_interval,
                last_saved: base_accepted,
            }),
            cancel,
        });

        // ===== Searching =====
        let pending = enqueue_cells(&ctx, |cell| cell.status == CellStatus::Pending);
        let workers = options
            .search_workers
            .min(self.config.search.max_workers)
            .min(pending.max(1))
            .max(1);
        tracing::info!(
            "Phase {}: {} pending cells, {} workers",
            RunPhase::Searching,
            pending,
            workers
        );
        run_pool(&ctx, workers).await;

        if is_cancelled(&ctx) {
            return Err(interrupt(&ctx));
        }

        // ===== Retrying =====
        let mut round = 0u32;
        loop {
            let retryable = enqueue_cells(&ctx, |cell| cell.retryable(MAX_CELL_ATTEMPTS));
            if retryable == 0 || is_cancelled(&ctx) {
                break;
            }

            tracing::info!(
                "Phase {}: {} failed cells, round {}",
                RunPhase::Retrying,
                retryable,
                round + 1
            );
            tokio::time::sleep(ctx.limiter.retry_backoff(round)).await;
            run_pool(&ctx, workers.min(retryable)).await;
            round += 1;
        }

        if is_cancelled(&ctx) {
            return Err(interrupt(&ctx));
        }

        let (completed_cells, exhausted_cells, total_cells) = {
            let cells = ctx.cells.lock().unwrap();
            let completed = cells.iter().filter(|c| c.status.is_success()).count();
            let exhausted = cells
                .iter()
                .filter(|c| c.status == CellStatus::Exhausted)
                .count();
            (completed, exhausted, cells.len())
        };

        if completed_cells == 0 {
            ctx.save_checkpoint();
            return Err(ScoutError::AllCellsFailed {
                failed: exhausted_cells,
            });
        }

        let search_seconds = run_start.elapsed().as_secs_f64();

        // ===== Enriching =====
        let enrichment_config = EnrichmentConfig {
            details: options.enrich_details,
            reviews: options.enrich_reviews,
            reviews_limit: options.reviews_limit,
            page_size: self.config.enrichment.reviews_page_size,
            workers: options.enrichment_workers,
        };
        let mut enrichment_stats = Default::default();

        if enrichment_config.is_enabled() {
            tracing::info!("Phase {}", RunPhase::Enriching);
            let records = std::mem::take(&mut *ctx.records.lock().unwrap());
            let already = ctx.enriched_ids.lock().unwrap().clone();
            let enrich_limiter = RateLimiter::new(std::time::Duration::from_millis(
                self.config.enrichment.base_delay_ms,
            ));
            let pipeline =
                EnrichmentPipeline::new(self.transport.as_ref(), &enrich_limiter, &enrichment_config);

            let done_counter = AtomicU64::new(0);
            let checkpoint_every = self.config.checkpoint.enrichment_interval;
            let hook_ctx = Arc::clone(&ctx);

            let (enriched, stats) = pipeline
                .enrich_all(records, &already, &ctx.cancel, move |record, status| {
                    if status == EnrichStatus::Enriched {
                        if let Some(key) = record.enrichment_key() {
                            hook_ctx
                                .enriched_ids
                                .lock()
                                .unwrap()
                                .insert(key.to_string());
                        }
                    }
                    let done = done_counter.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % checkpoint_every == 0 {
                        hook_ctx.save_checkpoint();
                    }
                })
                .await;

            *ctx.records.lock().unwrap() = enriched;
            enrichment_stats = stats;

            if is_cancelled(&ctx) {
                return Err(interrupt(&ctx));
            }
        }

        // ===== Finalizing =====
        tracing::info!("Phase {}", RunPhase::Finalizing);
        let counts = ctx.filter.counts();
        let businesses = std::mem::take(&mut *ctx.records.lock().unwrap());

        let statistics = CollectionStatistics {
            total_cells,
            completed_cells,
            failed_cells: exhausted_cells,
            total_collected: businesses.len(),
            duplicates_removed: counts.duplicates,
            filtered_outside_boundary: counts.filtered,
            structural_warnings: ctx.structural_warnings.load(Ordering::Relaxed),
            enriched: enrichment_stats.enriched,
            enrichment_failed: enrichment_stats.failed,
            enrichment_skipped: enrichment_stats.skipped,
            search_seconds,
            total_seconds: run_start.elapsed().as_secs_f64(),
        };

        let mode = ctx.checkpoint.lock().unwrap().skeleton.mode;

        let result = CollectionResult {
            metadata: RunMetadata {
                area: area.to_string(),
                category: category.to_string(),
                boundary: filter_boundary,
                search_mode: mode,
                enrichment: EnrichmentMeta {
                    details_fetched: options.enrich_details,
                    reviews_fetched: options.enrich_reviews,
                    reviews_limit: if options.enrich_reviews {
                        options.reviews_limit
                    } else {
                        0
                    },
                },
            },
            statistics,
            businesses,
        };

        self.sink.finish(&result)?;

        if exhausted_cells == 0 {
            ctx.checkpoint.lock().unwrap().store.delete()?;
            tracing::info!("Run complete, checkpoint removed");
        } else {
            ctx.save_checkpoint();
            tracing::warn!(
                "Run complete with {} permanently failed cells; checkpoint retained for resume",
                exhausted_cells
            );
        }

        tracing::info!(
            "Collected {} records in {:.1}s ({} duplicates, {} out of bounds)",
            result.statistics.total_collected,
            result.statistics.total_seconds,
            result.statistics.duplicates_removed,
            result.statistics.filtered_outside_boundary
        );
        Ok(result)
    }

    /// Builds the cell plan, trying sub-region categories in order when
    /// subdivision was requested and falling back to whole-area tiling.
    async fn partition(
        &self,
        area: &str,
        boundary: &crate::geo::BoundaryBox,
        options: &CollectOptions,
    ) -> (Vec<Cell>, PartitionMode) {
        if options.subdivide {
            for category in SUBDIVISION_CATEGORIES {
                match self.resolver.sub_regions(area, category).await {
                    Ok(subs) if !subs.is_empty() => {
                        tracing::info!(
                            "Subdividing {:?} into {} {} regions",
                            area,
                            subs.len(),
                            category
                        );
                        return (plan_subdivision(&subs), PartitionMode::Subdivision);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Sub-region lookup ({}) failed: {}", category, e);
                    }
                }
            }
            tracing::warn!(
                "No sub-regions resolved for {:?}, falling back to whole-area tiling",
                area
            );
        }

        (plan_grid(boundary), PartitionMode::Grid)
    }
}

impl<T: Transport> RunContext<T> {
    /// Offers one record to the filter; accepted records go to the live
    /// sink and the accumulator.
    fn ingest(&self, record: BusinessRecord) {
        match self.filter.admit(&record) {
            Admission::Accepted => {
                if let Err(e) = self.sink.record(&record) {
                    tracing::warn!("Record stream sink failed: {}", e);
                }
                self.records.lock().unwrap().push(record);
            }
            Admission::Duplicate | Admission::OutOfBounds => {}
        }
    }

    /// Total accepted across this run and the one it resumed
    fn total_accepted(&self) -> u64 {
        self.base_accepted + self.filter.counts().accepted
    }

    /// Builds a consistent snapshot of the current run state
    fn snapshot(&self) -> RunState {
        let mut state = self.checkpoint.lock().unwrap().skeleton.clone();
        state.cells = self.cells.lock().unwrap().clone();
        let (place_ids, hex_ids) = self.filter.snapshot_ids();
        state.seen_place_ids = place_ids;
        state.seen_hex_ids = hex_ids;
        state.enriched_ids = self.enriched_ids.lock().unwrap().clone();
        state.accepted_count = self.total_accepted();
        state
    }

    /// Unconditional checkpoint save; the guard serializes writers
    fn save_checkpoint(&self) {
        let mut snapshot = self.snapshot();
        let mut guard = self.checkpoint.lock().unwrap();
        guard.last_saved = snapshot.accepted_count;
        if let Err(e) = guard.store.save(&mut snapshot) {
            tracing::warn!("Checkpoint save failed: {}", e);
        }
    }

    /// Saves when enough records were accepted since the last save
    fn maybe_checkpoint(&self) {
        let due = {
            let guard = self.checkpoint.lock().unwrap();
            self.total_accepted() >= guard.last_saved + guard.interval
        };
        if due {
            self.save_checkpoint();
        }
    }
}

/// Queues every cell matching the predicate; returns how many were queued
fn enqueue_cells<T: Transport>(
    ctx: &Arc<RunContext<T>>,
    eligible: impl Fn(&Cell) -> bool,
) -> usize {
    let cells = ctx.cells.lock().unwrap();
    let mut queue = ctx.queue.lock().unwrap();
    queue.clear();
    for (index, cell) in cells.iter().enumerate() {
        if eligible(cell) {
            queue.push_back(index);
        }
    }
    queue.len()
}

/// Spawns `workers` search workers and waits for all of them to drain the
/// queue
async fn run_pool<T: Transport>(ctx: &Arc<RunContext<T>>, workers: usize) {
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let ctx = Arc::clone(ctx);
        handles.push(tokio::spawn(search_worker(ctx)));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Search worker panicked: {}", e);
        }
    }
}

/// One worker: pull the next cell, sweep it, record the outcome
async fn search_worker<T: Transport>(ctx: Arc<RunContext<T>>) {
    loop {
        if *ctx.cancel.borrow() {
            break;
        }

        let index = { ctx.queue.lock().unwrap().pop_front() };
        let Some(index) = index else { break };

        let cell = {
            let mut cells = ctx.cells.lock().unwrap();
            cells[index].status = CellStatus::InFlight;
            cells[index].clone()
        };

        let executor = SearchExecutor::new(ctx.transport.as_ref(), &ctx.limiter, &ctx.query);
        let outcome = executor.sweep_cell(&cell, |record| ctx.ingest(record)).await;

        {
            let mut cells = ctx.cells.lock().unwrap();
            let cell = &mut cells[index];
            match &outcome {
                Ok(sweep) => {
                    cell.status = CellStatus::Done;
                    tracing::debug!(
                        "Cell {} done: {} records over {} pages",
                        cell.id,
                        sweep.found,
                        sweep.pages
                    );
                }
                Err(failure) => {
                    cell.attempts += 1;
                    cell.status = if cell.attempts >= MAX_CELL_ATTEMPTS {
                        CellStatus::Exhausted
                    } else {
                        CellStatus::Failed
                    };
                    if failure.structural {
                        ctx.structural_warnings.fetch_add(1, Ordering::Relaxed);
                    }
                    tracing::warn!(
                        "Cell {} failed (attempt {}): {}",
                        cell.id,
                        cell.attempts,
                        failure.message
                    );
                }
            }
        }

        ctx.maybe_checkpoint();
    }
}

fn is_cancelled<T: Transport>(ctx: &Arc<RunContext<T>>) -> bool {
    *ctx.cancel.borrow()
}

/// Final checkpoint plus the distinguished interrupted error
fn interrupt<T: Transport>(ctx: &Arc<RunContext<T>>) -> ScoutError {
    ctx.save_checkpoint();
    let checkpoint = ctx
        .checkpoint
        .lock()
        .unwrap()
        .store
        .path()
        .display()
        .to_string();
    tracing::warn!(
        "Run interrupted; checkpoint saved to {}. Rerun with resume to continue",
        checkpoint
    );
    ScoutError::Interrupted { checkpoint }
}
