//! Checkpoint payload: everything needed to resume an interrupted run
//!
//! The identifier sets are monotonically non-decreasing within a run and
//! persist across resumes; a resumed run seeds the dedup filter from them so
//! it never re-emits an already-seen entity.

use crate::geo::{BoundaryBox, PartitionMode};
use crate::state::cell::{Cell, CellStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub area: String,
    pub category: String,
    pub buffer_km: f64,
    pub mode: PartitionMode,

    /// Exact area boundary the plan was tiled from
    pub boundary: BoundaryBox,

    /// The partition plan with per-cell status and attempt counts
    pub cells: Vec<Cell>,

    /// Every primary identifier accepted so far
    pub seen_place_ids: HashSet<String>,

    /// Every secondary identifier accepted so far
    pub seen_hex_ids: HashSet<String>,

    /// Identifiers whose enrichment already completed
    pub enriched_ids: HashSet<String>,

    pub accepted_count: u64,

    pub started_at: DateTime<Utc>,
    pub last_checkpoint: DateTime<Utc>,
}

impl RunState {
    pub fn new(
        area: &str,
        category: &str,
        buffer_km: f64,
        mode: PartitionMode,
        boundary: BoundaryBox,
        cells: Vec<Cell>,
    ) -> Self {
        let now = Utc::now();
        Self {
            area: area.to_string(),
            category: category.to_string(),
            buffer_km,
            mode,
            boundary,
            cells,
            seen_place_ids: HashSet::new(),
            seen_hex_ids: HashSet::new(),
            enriched_ids: HashSet::new(),
            accepted_count: 0,
            started_at: now,
            last_checkpoint: now,
        }
    }

    /// Prepares a loaded state for a new pass: in-flight cells go back to
    /// pending, and permanently failed cells get a fresh attempt budget.
    pub fn prepare_resume(&mut self) {
        for cell in &mut self.cells {
            match cell.status {
                CellStatus::InFlight => cell.status = CellStatus::Pending,
                CellStatus::Failed | CellStatus::Exhausted => {
                    cell.status = CellStatus::Pending;
                    cell.attempts = 0;
                }
                CellStatus::Pending | CellStatus::Done => {}
            }
        }
    }

    /// Number of cells in each interesting state, for progress logs
    pub fn cell_counts(&self) -> (usize, usize, usize) {
        let mut pending = 0;
        let mut done = 0;
        let mut exhausted = 0;
        for cell in &self.cells {
            match cell.status {
                CellStatus::Pending | CellStatus::InFlight | CellStatus::Failed => pending += 1,
                CellStatus::Done => done += 1,
                CellStatus::Exhausted => exhausted += 1,
            }
        }
        (pending, done, exhausted)
    }

    /// Whether this checkpoint belongs to the given query
    pub fn matches(&self, area: &str, category: &str) -> bool {
        self.area == area && self.category == category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_cells(statuses: &[(CellStatus, u32)]) -> RunState {
        let cells = statuses
            .iter()
            .enumerate()
            .map(|(i, (status, attempts))| Cell {
                id: format!("-{i}"),
                latitude: 0.0,
                longitude: 0.0,
                radius_meters: 707,
                region: "area".to_string(),
                status: *status,
                attempts: *attempts,
            })
            .collect();

        RunState::new(
            "Testville",
            "lawyers",
            5.0,
            PartitionMode::Grid,
            BoundaryBox::new("Testville", 1.0, 0.0, 1.0, 0.0),
            cells,
        )
    }

    #[test]
    fn test_prepare_resume_resets_cells() {
        let mut state = state_with_cells(&[
            (CellStatus::Done, 1),
            (CellStatus::InFlight, 1),
            (CellStatus::Failed, 3),
            (CellStatus::Exhausted, 5),
            (CellStatus::Pending, 0),
        ]);

        state.prepare_resume();

        assert_eq!(state.cells[0].status, CellStatus::Done);
        assert_eq!(state.cells[1].status, CellStatus::Pending);
        assert_eq!(state.cells[1].attempts, 1);
        assert_eq!(state.cells[2].status, CellStatus::Pending);
        assert_eq!(state.cells[2].attempts, 0);
        assert_eq!(state.cells[3].status, CellStatus::Pending);
        assert_eq!(state.cells[3].attempts, 0);
        assert_eq!(state.cells[4].status, CellStatus::Pending);
    }

    #[test]
    fn test_cell_counts() {
        let state = state_with_cells(&[
            (CellStatus::Done, 1),
            (CellStatus::Failed, 2),
            (CellStatus::Exhausted, 5),
            (CellStatus::Pending, 0),
        ]);
        assert_eq!(state.cell_counts(), (2, 1, 1));
    }

    #[test]
    fn test_serde_roundtrip_preserves_sets() {
        let mut state = state_with_cells(&[(CellStatus::Done, 1)]);
        state.seen_place_ids.insert("p1".to_string());
        state.seen_hex_ids.insert("0x1:0xa".to_string());
        state.enriched_ids.insert("p1".to_string());
        state.accepted_count = 1;

        let json = serde_json::to_string(&state).unwrap();
        let back: RunState = serde_json::from_str(&json).unwrap();

        assert!(back.seen_place_ids.contains("p1"));
        assert!(back.seen_hex_ids.contains("0x1:0xa"));
        assert!(back.enriched_ids.contains("p1"));
        assert_eq!(back.accepted_count, 1);
        assert!(back.matches("Testville", "lawyers"));
        assert!(!back.matches("Testville", "plumbers"));
    }
}
