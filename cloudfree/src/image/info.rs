//! Image metadata records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property holding an image's intrinsic footprint geometry.
pub const FOOTPRINT_PROPERTY: &str = "system:footprint";

/// Metadata of a remote image.
///
/// `crs` and `scale` are those of the band with the finest resolution. Both
/// are absent for computed images that have no native projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub crs: Option<String>,

    #[serde(default)]
    pub scale: Option<f64>,

    #[serde(default)]
    pub bands: Vec<BandInfo>,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ImageInfo {
    /// Intrinsic footprint, if the image has one.
    pub fn footprint(&self) -> Option<&Value> {
        self.properties
            .get(FOOTPRINT_PROPERTY)
            .filter(|value| !value.is_null())
    }
}

/// Metadata of a single band, in service order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandInfo(Map<String, Value>);

impl BandInfo {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn crs(&self) -> Option<&str> {
        self.0.get("crs").and_then(Value::as_str)
    }

    pub fn scale(&self) -> Option<f64> {
        self.0.get("scale").and_then(Value::as_f64)
    }

    /// All attributes, including `id`, `crs` and `scale`.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_info() {
        let info: ImageInfo = serde_json::from_value(json!({
            "id": "LANDSAT/LC08/C02/T1_L2/LC08_172083_20210101",
            "crs": "EPSG:32634",
            "scale": 30.0,
            "bands": [
                {"id": "SR_B2", "crs": "EPSG:32634", "scale": 30.0, "center_wavelength": 0.48},
                {"id": "SR_B3", "crs": "EPSG:32634", "scale": 30.0}
            ],
            "properties": {"CLOUD_COVER": 12.5, "system:footprint": {"type": "LinearRing", "coordinates": []}}
        }))
        .unwrap();

        assert_eq!(info.bands.len(), 2);
        assert_eq!(info.bands[0].id(), Some("SR_B2"));
        assert_eq!(info.bands[0].scale(), Some(30.0));
        assert_eq!(info.bands[0].attributes().len(), 4);
        assert!(info.footprint().is_some());
    }

    #[test]
    fn test_composite_info_has_no_projection() {
        let info: ImageInfo = serde_json::from_value(json!({"bands": []})).unwrap();
        assert!(info.id.is_none());
        assert!(info.crs.is_none());
        assert!(info.scale.is_none());
        assert!(info.footprint().is_none());
    }
}
