//! Gridscout: a grid-sweep collector for an undocumented location-search API
//!
//! This crate partitions a geographic area into query cells, sweeps each cell
//! through the provider's paginated search endpoint, and assembles the
//! duplicate-laden partial results into one deduplicated dataset, with
//! checkpointed resume, bounded retry, and an optional enrichment pass for
//! place details and reviews.

pub mod codec;
pub mod collector;
pub mod config;
pub mod extract;
pub mod geo;
pub mod net;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for gridscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wire codec error: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Transport error: {0}")]
    Transport(#[from] net::TransportError),

    #[error("Boundary resolution error: {0}")]
    Resolve(#[from] net::ResolveError),

    #[error("Checkpoint storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Area not found: {area}")]
    BoundaryNotFound { area: String },

    #[error("No cell ever succeeded ({failed} cells permanently failed)")]
    AllCellsFailed { failed: usize },

    #[error("Run interrupted; resume from checkpoint {checkpoint}")]
    Interrupted { checkpoint: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for gridscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collector::{CollectOptions, Collector};
pub use config::Config;
pub use geo::BoundaryBox;
pub use record::{BusinessRecord, ReviewRecord};
pub use state::{CellStatus, RunPhase};
