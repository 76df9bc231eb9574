//! Output trait and result types

use crate::geo::{BoundaryBox, PartitionMode};
use crate::output::stats::CollectionStatistics;
use crate::record::BusinessRecord;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Enrichment settings recorded alongside the result
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentMeta {
    pub details_fetched: bool,
    pub reviews_fetched: bool,
    pub reviews_limit: u32,
}

/// Run metadata recorded alongside the result
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub area: String,
    pub category: String,
    /// Buffered boundary every accepted record lies within
    pub boundary: BoundaryBox,
    pub search_mode: PartitionMode,
    pub enrichment: EnrichmentMeta,
}

/// The final assembled result handed to the sink
#[derive(Debug, Serialize)]
pub struct CollectionResult {
    pub metadata: RunMetadata,
    pub statistics: CollectionStatistics,
    pub businesses: Vec<BusinessRecord>,
}

/// Output capability: a live record stream plus the final result.
///
/// Implementations must be callable from many workers at once.
pub trait RecordSink: Send + Sync {
    /// Called once per accepted record, as it is accepted
    fn record(&self, record: &BusinessRecord) -> OutputResult<()>;

    /// Called once with the fully assembled result
    fn finish(&self, result: &CollectionResult) -> OutputResult<()>;
}

/// Sink that discards everything; useful for callers that only want the
/// returned [`CollectionResult`]
pub struct NullSink;

impl RecordSink for NullSink {
    fn record(&self, _record: &BusinessRecord) -> OutputResult<()> {
        Ok(())
    }

    fn finish(&self, _result: &CollectionResult) -> OutputResult<()> {
        Ok(())
    }
}
