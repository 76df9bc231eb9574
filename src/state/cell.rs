//! Cell definitions for tracking search progress

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a search cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Cell has not been queried yet
    Pending,

    /// A worker is currently sweeping this cell
    InFlight,

    /// All pages exhausted, records delivered
    Done,

    /// Last attempt failed; eligible for retry while attempts remain
    Failed,

    /// Attempt ceiling reached; permanently abandoned for this run
    Exhausted,
}

impl CellStatus {
    /// Returns true if no further processing will happen in this run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Exhausted)
    }

    /// Returns true if the cell completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// String form used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Exhausted => "exhausted",
        }
    }

    /// Parses the string form; returns None for unknown input
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_flight" => Some(Self::InFlight),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "exhausted" => Some(Self::Exhausted),
            _ => None,
        }
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of search work: a circular query centered on a grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Stable id within the partition plan
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
    /// Label of the owning region, propagated to records as `found_in`
    pub region: String,
    pub status: CellStatus,
    pub attempts: u32,
}

impl Cell {
    /// Whether this cell can still be retried under the given ceiling
    pub fn retryable(&self, max_attempts: u32) -> bool {
        self.status == CellStatus::Failed && self.attempts < max_attempts
    }
}
