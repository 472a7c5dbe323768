//! Coordinates and bounding boxes

use serde::{Deserialize, Serialize};

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Rectangular latitude/longitude filter region.
///
/// Containment is inclusive on all four edges, matching `BETWEEN` in the
/// store queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Self {
        Self {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        }
    }

    /// Check whether `position` lies inside or on the edge of this box
    #[must_use]
    pub fn contains(&self, position: LatLon) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&position.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&position.longitude)
    }
}
