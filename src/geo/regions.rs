//! Partition planning over whole areas and named sub-regions

use crate::geo::boundary::BoundaryBox;
use crate::geo::grid::{cell_edge_meters, tile};
use crate::state::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative categories tried in order when resolving sub-regions
pub const SUBDIVISION_CATEGORIES: [&str; 3] = ["city", "settlement", "state"];

/// How the area was partitioned into cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMode {
    /// Uniform tiling of the whole boundary
    Grid,
    /// Per-sub-region tiling, each at its own cell size
    Subdivision,
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Subdivision => write!(f, "subdivision"),
        }
    }
}

/// A named administrative sub-region of the target area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRegion {
    /// Short name, used to tag cell ids
    pub name: String,
    /// Full display name, used for `found_in`
    pub display_name: String,
    pub boundary: BoundaryBox,
}

/// Tiles the whole boundary at its auto-selected cell size
pub fn plan_grid(boundary: &BoundaryBox) -> Vec<Cell> {
    let edge = cell_edge_meters(boundary);
    tracing::info!(
        "Tiling {} at {} m cell edge ({:.0} km × {:.0} km)",
        boundary.name,
        edge,
        boundary.width_km(),
        boundary.height_km()
    );
    tile(boundary, edge, &boundary.name, "")
}

/// Tiles each sub-region independently at its own auto-selected cell size,
/// tagging every cell with its owning sub-region.
pub fn plan_subdivision(sub_regions: &[SubRegion]) -> Vec<Cell> {
    let mut cells = Vec::new();

    for sub in sub_regions {
        let edge = cell_edge_meters(&sub.boundary);
        let sub_cells = tile(&sub.boundary, edge, &sub.display_name, &sub.name);
        tracing::debug!(
            "Sub-region {}: {} cells at {} m edge",
            sub.name,
            sub_cells.len(),
            edge
        );
        cells.extend(sub_cells);
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_box(name: &str, south: f64, west: f64) -> BoundaryBox {
        BoundaryBox::new(name, south + 2.0 / 111.0, south, west + 2.0 / 111.0, west)
    }

    #[test]
    fn test_plan_grid_uses_area_name() {
        let cells = plan_grid(&small_box("Smalltown", 0.0, 0.0));
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|c| c.region == "Smalltown"));
        assert!(cells[0].id.starts_with("-0"));
    }

    #[test]
    fn test_plan_subdivision_tags_cells() {
        let subs = vec![
            SubRegion {
                name: "north".to_string(),
                display_name: "North District".to_string(),
                boundary: small_box("North District", 1.0, 0.0),
            },
            SubRegion {
                name: "south".to_string(),
                display_name: "South District".to_string(),
                boundary: small_box("South District", 0.0, 0.0),
            },
        ];

        let cells = plan_subdivision(&subs);
        assert!(cells.iter().any(|c| c.id.starts_with("north-")));
        assert!(cells.iter().any(|c| c.id.starts_with("south-")));
        assert!(cells
            .iter()
            .filter(|c| c.id.starts_with("north-"))
            .all(|c| c.region == "North District"));

        // Ids are unique across sub-regions
        let mut ids: Vec<&str> = cells.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), cells.len());
    }

    #[test]
    fn test_subdivision_sizes_per_region() {
        // A tiny region and a large one pick different edges
        let tiny = small_box("tiny", 0.0, 0.0);
        let large = BoundaryBox::new("large", 3.0, 0.0, 3.0, 0.0);
        assert_ne!(cell_edge_meters(&tiny), cell_edge_meters(&large));
    }
}
