//! Geographic partitioning of a target area into query cells
//!
//! This module handles:
//! - Boundary box math (degree/meter conversion, buffering, containment)
//! - Auto-selection of a cell edge length from the area's extent
//! - Tiling a boundary into covering circular-search cells
//! - Turning resolved sub-regions into a tagged partition plan

mod boundary;
mod grid;
mod regions;

pub use boundary::{meters_to_lat_degrees, meters_to_lng_degrees, BoundaryBox};
pub use grid::{cell_edge_meters, tile};
pub use regions::{plan_grid, plan_subdivision, PartitionMode, SubRegion, SUBDIVISION_CATEGORIES};
