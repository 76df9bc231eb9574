//! Grid tiling and cell-size selection

use crate::geo::boundary::{meters_to_lat_degrees, meters_to_lng_degrees, BoundaryBox};
use crate::state::{Cell, CellStatus};

/// Cell-size bands keyed by the boundary's larger dimension:
/// upper bound in km (exclusive) → cell edge length in meters.
const EDGE_BANDS: [(f64, u32); 5] = [
    (10.0, 1_000),
    (30.0, 2_000),
    (100.0, 5_000),
    (200.0, 10_000),
    (500.0, 50_000),
];

/// Edge length for areas past the last band (country scale)
const EDGE_MAX_METERS: u32 = 100_000;

/// Selects the cell edge length for a boundary from its larger dimension
pub fn cell_edge_meters(boundary: &BoundaryBox) -> u32 {
    let larger = boundary.larger_dimension_km();
    for (upper_km, edge) in EDGE_BANDS {
        if larger < upper_km {
            return edge;
        }
    }
    EDGE_MAX_METERS
}

/// Tiles a boundary with square-spaced circular-search cells.
///
/// Cell centers are laid out `edge_meters` apart; each cell's search radius
/// is `edge / √2`, so the circles circumscribe their squares and the tiling
/// covers the whole box with overlap. Cell ids are `"{tag}-{index}"`, stable
/// for a given boundary and edge length so a resumed run reproduces them.
pub fn tile(boundary: &BoundaryBox, edge_meters: u32, region: &str, tag: &str) -> Vec<Cell> {
    let radius_meters = (f64::from(edge_meters) / std::f64::consts::SQRT_2).round() as u32;
    let lat_step = meters_to_lat_degrees(f64::from(edge_meters));

    let mut cells = Vec::new();
    let mut index = 0usize;
    let mut lat = boundary.south + lat_step / 2.0;

    while lat <= boundary.north {
        let lng_step = meters_to_lng_degrees(f64::from(edge_meters), lat);
        let mut lng = boundary.west + lng_step / 2.0;

        while lng <= boundary.east {
            cells.push(Cell {
                id: format!("{tag}-{index}"),
                latitude: round6(lat),
                longitude: round6(lng),
                radius_meters,
                region: region.to_string(),
                status: CellStatus::Pending,
                attempts: 0,
            });
            index += 1;
            lng += lng_step;
        }

        lat += lat_step;
    }

    cells
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}
