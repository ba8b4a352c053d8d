//! GeoJSON-compatible geometry types.
//!
//! Regions travel to the imagery service as GeoJSON, so the types here
//! serialize to exactly that shape (`{"type": "Polygon", "coordinates": ...}`).
//! Only the geometry kinds the service hands back or accepts for export
//! regions are modelled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single coordinate, `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// A WGS84 geometry in GeoJSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Polygon made of an outer ring and optional holes.
    Polygon { coordinates: Vec<Vec<Position>> },

    /// Collection of polygons.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },

    /// Closed ring, as used by catalog image footprints.
    LinearRing { coordinates: Vec<Position> },
}

impl Geometry {
    /// Rectangle polygon from bounding box coordinates.
    ///
    /// The ring starts at the north-east corner and runs clockwise:
    /// `(xmax,ymax), (xmax,ymin), (xmin,ymin), (xmin,ymax), (xmax,ymax)`.
    pub fn from_bbox(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        let ring = vec![
            vec![xmax, ymax],
            vec![xmax, ymin],
            vec![xmin, ymin],
            vec![xmin, ymax],
            vec![xmax, ymax],
        ];
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Parse a raw GeoJSON value.
    ///
    /// Accepts a bare geometry or a `Feature` wrapping one.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(mut map) if map.get("type").and_then(Value::as_str) == Some("Feature") => {
                let geometry = map.remove("geometry").unwrap_or(Value::Null);
                serde_json::from_value(geometry)
            }
            other => serde_json::from_value(other),
        }
    }

    /// GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::LinearRing { .. } => "LinearRing",
        }
    }

    /// Outer ring of the geometry (first polygon for multi-polygons).
    pub fn exterior(&self) -> Option<&[Position]> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|polygon| polygon.first())
                .map(Vec::as_slice),
            Geometry::LinearRing { coordinates } => Some(coordinates.as_slice()),
        }
    }
}

/// A region as handed to the descriptor resolver.
///
/// Catalog footprints and hand-built GeoJSON arrive as raw JSON; they are
/// converted to [`Geometry`] once the destination region is settled.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSpec {
    /// Already-typed geometry.
    Geometry(Geometry),
    /// Raw GeoJSON structure.
    Raw(Value),
}

impl From<Geometry> for RegionSpec {
    fn from(geometry: Geometry) -> Self {
        RegionSpec::Geometry(geometry)
    }
}
