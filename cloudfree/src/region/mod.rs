//! Region resolution.
//!
//! Turns the user's region input (a geometry, a GeoJSON file, a raster file
//! or bounding box coordinates) into a single WGS84 [`Geometry`].

mod raster;

pub use raster::{raster_footprint, RasterFootprintError};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::geometry::Geometry;

/// Default percentage by which raster footprints are expanded.
pub const DEFAULT_REGION_BUFFER_PCT: f64 = 5.0;

/// Where a region comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionInput {
    /// A geometry the caller already has in hand.
    Geometry(Geometry),
    /// Path to a GeoJSON or raster file.
    Path(PathBuf),
}

/// Bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Build from a `[xmin, ymin, xmax, ymax]` slice.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [xmin, ymin, xmax, ymax] => Some(Self::new(*xmin, *ymin, *xmax, *ymax)),
            _ => None,
        }
    }

    pub fn to_geometry(&self) -> Geometry {
        Geometry::from_bbox(self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Resolve a region input or bounding box into a geometry.
///
/// `region` wins over `bbox` when both are given. `buffer_pct` only applies
/// to raster inputs.
pub fn resolve_region(
    region: Option<&RegionInput>,
    bbox: Option<&BoundingBox>,
    buffer_pct: f64,
) -> Result<Geometry, ConfigError> {
    match (region, bbox) {
        (Some(RegionInput::Geometry(geometry)), _) => Ok(geometry.clone()),
        (Some(RegionInput::Path(path)), _) if is_geojson_path(path) => read_geojson(path),
        (Some(RegionInput::Path(path)), _) => {
            raster_footprint(path, buffer_pct).map_err(|e| ConfigError::InvalidRaster {
                path: path.clone(),
                reason: e.to_string(),
            })
        }
        (None, Some(bbox)) => Ok(bbox.to_geometry()),
        (None, None) => Err(ConfigError::NoRegion),
    }
}

/// Whether a path looks like a GeoJSON file (`.json`, `.geojson`).
fn is_geojson_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

fn read_geojson(path: &Path) -> Result<Geometry, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidGeoJson {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
    Geometry::from_value(value).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_no_input_is_config_error() {
        let result = resolve_region(None, None, DEFAULT_REGION_BUFFER_PCT);
        assert!(matches!(result, Err(ConfigError::NoRegion)));
    }

    #[test]
    fn test_bbox_ring() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let geometry = resolve_region(None, Some(&bbox), DEFAULT_REGION_BUFFER_PCT).unwrap();
        assert_eq!(
            geometry,
            Geometry::Polygon {
                coordinates: vec![vec![
                    vec![10.0, 10.0],
                    vec![10.0, 0.0],
                    vec![0.0, 0.0],
                    vec![0.0, 10.0],
                    vec![10.0, 10.0],
                ]]
            }
        );
    }

    #[test]
    fn test_geometry_passes_through() {
        let geometry = Geometry::from_bbox(1.0, 2.0, 3.0, 4.0);
        let input = RegionInput::Geometry(geometry.clone());
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let resolved = resolve_region(Some(&input), Some(&bbox), 0.0).unwrap();
        assert_eq!(resolved, geometry);
    }

    #[test]
    fn test_geojson_file() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#
        )
        .unwrap();

        let input = RegionInput::Path(file.path().to_path_buf());
        let geometry = resolve_region(Some(&input), None, 0.0).unwrap();
        assert_eq!(geometry.kind(), "Polygon");
    }

    #[test]
    fn test_bad_geojson_names_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "not json").unwrap();

        let input = RegionInput::Path(file.path().to_path_buf());
        let err = resolve_region(Some(&input), None, 0.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGeoJson { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_unreadable_raster_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "definitely not a tiff").unwrap();

        let input = RegionInput::Path(file.path().to_path_buf());
        let err = resolve_region(Some(&input), None, 5.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRaster { .. }));
    }

    #[test]
    fn test_bbox_from_slice() {
        assert!(BoundingBox::from_slice(&[1.0, 2.0, 3.0]).is_none());
        let bbox = BoundingBox::from_slice(&[20.0, -34.0, 21.0, -33.0]).unwrap();
        assert_eq!(bbox.ymax, -33.0);
    }

    proptest! {
        #[test]
        fn prop_bbox_ring_is_closed_and_deterministic(
            xmin in -180.0f64..180.0,
            ymin in -90.0f64..90.0,
            w in 0.0f64..10.0,
            h in 0.0f64..10.0,
        ) {
            let bbox = BoundingBox::new(xmin, ymin, xmin + w, ymin + h);
            let first = resolve_region(None, Some(&bbox), 0.0).unwrap();
            let second = resolve_region(None, Some(&bbox), 0.0).unwrap();
            prop_assert_eq!(&first, &second);

            let ring = first.exterior().unwrap();
            prop_assert_eq!(ring.len(), 5);
            prop_assert_eq!(&ring[0], &ring[4]);
            prop_assert_eq!(&ring[0], &vec![xmin + w, ymin + h]);
            prop_assert_eq!(&ring[2], &vec![xmin, ymin]);
        }
    }
}
