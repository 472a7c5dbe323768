//! Map element keys and their geometry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::geo::LatLon;

/// Kind of map element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    /// Name as stored in the database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "NODE",
            Self::Way => "WAY",
            Self::Relation => "RELATION",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NODE" => Ok(Self::Node),
            "WAY" => Ok(Self::Way),
            "RELATION" => Ok(Self::Relation),
            other => Err(Error::InvalidInput(format!("Unknown element type: {other}"))),
        }
    }
}

/// Identifies a map element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey {
    pub element_type: ElementType,
    pub element_id: i64,
}

impl ElementKey {
    #[must_use]
    pub const fn new(element_type: ElementType, element_id: i64) -> Self {
        Self {
            element_type,
            element_id,
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type, self.element_id)
    }
}

impl FromStr for ElementKey {
    type Err = Error;

    /// Parses `TYPE/ID`, e.g. `way/42`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (element_type, element_id) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidInput(format!("Expected TYPE/ID, got: {s}")))?;
        let element_id = element_id
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::InvalidInput(format!("Invalid element id in {s}: {e}")))?;
        Ok(Self::new(element_type.parse()?, element_id))
    }
}

/// Spatial shape of an element.
///
/// Every variant carries a precomputed center. Polylines and polygons keep
/// their coordinate sequences; a point is only its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementGeometry {
    Point {
        center: LatLon,
    },
    Polylines {
        polylines: Vec<Vec<LatLon>>,
        center: LatLon,
    },
    Polygons {
        polygons: Vec<Vec<LatLon>>,
        center: LatLon,
    },
}

impl ElementGeometry {
    #[must_use]
    pub const fn center(&self) -> LatLon {
        match self {
            Self::Point { center }
            | Self::Polylines { center, .. }
            | Self::Polygons { center, .. } => *center,
        }
    }
}

/// Geometry of one element together with its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementGeometryEntry {
    pub element_type: ElementType,
    pub element_id: i64,
    pub geometry: ElementGeometry,
}

impl ElementGeometryEntry {
    #[must_use]
    pub const fn new(element_type: ElementType, element_id: i64, geometry: ElementGeometry) -> Self {
        Self {
            element_type,
            element_id,
            geometry,
        }
    }

    #[must_use]
    pub const fn key(&self) -> ElementKey {
        ElementKey::new(self.element_type, self.element_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_parse() {
        assert_eq!("NODE".parse::<ElementType>().unwrap(), ElementType::Node);
        assert_eq!("way".parse::<ElementType>().unwrap(), ElementType::Way);
        assert_eq!(
            " Relation ".parse::<ElementType>().unwrap(),
            ElementType::Relation
        );
        assert!("area".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_element_type_round_trips_through_str() {
        for element_type in [ElementType::Node, ElementType::Way, ElementType::Relation] {
            assert_eq!(
                element_type.as_str().parse::<ElementType>().unwrap(),
                element_type
            );
        }
    }

    #[test]
    fn test_center_of_each_variant() {
        let center = LatLon::new(1.0, 2.0);
        let line = vec![LatLon::new(0.0, 0.0), LatLon::new(2.0, 4.0)];

        assert_eq!(ElementGeometry::Point { center }.center(), center);
        assert_eq!(
            ElementGeometry::Polylines {
                polylines: vec![line.clone()],
                center
            }
            .center(),
            center
        );
        assert_eq!(
            ElementGeometry::Polygons {
                polygons: vec![line],
                center
            }
            .center(),
            center
        );
    }

    #[test]
    fn test_element_key_display() {
        assert_eq!(ElementKey::new(ElementType::Way, 42).to_string(), "WAY/42");
    }

    #[test]
    fn test_element_key_parse() {
        assert_eq!(
            "way/42".parse::<ElementKey>().unwrap(),
            ElementKey::new(ElementType::Way, 42)
        );
        assert_eq!(
            "NODE/-3".parse::<ElementKey>().unwrap(),
            ElementKey::new(ElementType::Node, -3)
        );
        assert!("WAY".parse::<ElementKey>().is_err());
        assert!("WAY/x".parse::<ElementKey>().is_err());
        assert!("AREA/1".parse::<ElementKey>().is_err());
    }
}
