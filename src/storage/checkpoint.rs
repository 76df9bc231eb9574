//! Checkpoint persistence: atomic snapshot/restore of [`RunState`]

use crate::state::RunState;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from checkpoint persistence
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stores one run's checkpoint under a key derived from category and area
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: &Path, area: &str, category: &str) -> Self {
        let key = checkpoint_key(area, category);
        Self {
            path: dir.join(format!(".checkpoint_{key}.json")),
        }
    }

    /// Location of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves a snapshot, stamping its checkpoint time.
    ///
    /// Idempotent and safe to call repeatedly; the write goes to a
    /// temporary file first and is renamed into place so a reader never
    /// observes a torn snapshot.
    pub fn save(&self, state: &mut RunState) -> Result<(), StorageError> {
        state.last_checkpoint = chrono::Utc::now();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "Checkpoint saved: {} ({} accepted)",
            self.path.display(),
            state.accepted_count
        );
        Ok(())
    }

    /// Loads the last saved snapshot. A missing or unreadable checkpoint
    /// returns `None`; corruption is logged, never fatal.
    pub fn load(&self) -> Option<RunState> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read checkpoint {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupted checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Removes the checkpoint; succeeds when it is already gone
    pub fn delete(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Filesystem-safe key for a (category, area) pair
fn checkpoint_key(area: &str, category: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_bytes());
    hasher.update(b"|");
    hasher.update(area.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}
