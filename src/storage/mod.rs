//! Durable run state for resumable collection
//!
//! One collection run owns at most one checkpoint file, keyed by the
//! category and area it was started with. Saves are atomic (write to a
//! temporary file, then rename); a checkpoint that cannot be read is
//! treated as absent, never as a fatal condition.

mod checkpoint;

pub use checkpoint::{CheckpointStore, StorageError};
