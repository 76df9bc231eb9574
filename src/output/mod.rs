//! Output handling for collection results
//!
//! The engine talks to a [`RecordSink`]: a live per-record stream for
//! incremental persistence plus a final assembled result. The built-in
//! implementation streams accepted records to a JSONL file and writes the
//! final document (metadata + statistics + businesses) as one JSON file.

mod json_output;
mod stats;
mod traits;

pub use json_output::JsonOutput;
pub use stats::{print_statistics, CollectionStatistics};
pub use traits::{
    CollectionResult, EnrichmentMeta, NullSink, OutputError, OutputResult, RecordSink, RunMetadata,
};
