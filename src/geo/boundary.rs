//! Boundary box math

use serde::{Deserialize, Serialize};

/// Kilometers per degree of latitude, used for extent estimates and buffers
const KM_PER_DEGREE: f64 = 111.0;

/// Meters per degree of latitude, used for grid step conversion
const METERS_PER_LAT_DEGREE: f64 = 111_320.0;

/// North/south/east/west extent of a named area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryBox {
    pub name: String,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundaryBox {
    pub fn new(name: impl Into<String>, north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            name: name.into(),
            north,
            south,
            east,
            west,
        }
    }

    /// Whether the point lies inside this box (inclusive)
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.south <= lat && lat <= self.north && self.west <= lng && lng <= self.east
    }

    /// Returns this box expanded by `buffer_km` on all sides
    pub fn expanded(&self, buffer_km: f64) -> Self {
        let buffer_deg = buffer_km / KM_PER_DEGREE;
        Self {
            name: format!("{} region", self.name),
            north: self.north + buffer_deg,
            south: self.south - buffer_deg,
            east: self.east + buffer_deg,
            west: self.west - buffer_deg,
        }
    }

    /// North-south extent in kilometers
    pub fn height_km(&self) -> f64 {
        (self.north - self.south) * KM_PER_DEGREE
    }

    /// East-west extent in kilometers, corrected for latitude
    pub fn width_km(&self) -> f64 {
        (self.east - self.west) * KM_PER_DEGREE * self.south.to_radians().cos()
    }

    /// The larger of the two extents, which keys the cell-size band
    pub fn larger_dimension_km(&self) -> f64 {
        self.height_km().max(self.width_km())
    }
}

/// Converts meters to latitude degrees
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_LAT_DEGREE
}

/// Converts meters to longitude degrees at the given latitude
pub fn meters_to_lng_degrees(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_LAT_DEGREE * latitude.to_radians().cos())
}
