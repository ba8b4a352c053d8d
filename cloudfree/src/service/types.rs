//! Wire types exchanged with the imagery service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::catalog::CompositeMethod;
use crate::geometry::Geometry;
use crate::image::ImageInfo;

/// Opaque reference to a remote image.
///
/// The service treats this as an expression it can evaluate: a catalog asset,
/// a masked catalog asset or a computed composite. Callers never look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(Value);

impl ImageRef {
    /// Plain catalog asset.
    pub fn asset(id: impl Into<String>) -> Self {
        Self(json!({ "asset": id.into() }))
    }

    /// Catalog asset with cloud/shadow masking and reflectance scaling applied
    /// remotely.
    pub fn masked(id: impl Into<String>, mask: bool, scale_refl: bool) -> Self {
        Self(json!({
            "asset": id.into(),
            "mask": mask,
            "scaleRefl": scale_refl,
        }))
    }

    /// Wrap an expression returned by the service.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Raster file format requested from the download endpoint.
pub const GEOTIFF_FORMAT: &str = "GeoTIFF";

/// Parameters of a direct-download link request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadParams {
    pub scale: f64,
    pub crs: String,
    pub file_format: String,
    pub file_per_band: bool,
    pub region: Geometry,
}

impl DownloadParams {
    /// Single-file GeoTIFF request.
    pub fn geotiff(region: Geometry, crs: impl Into<String>, scale: f64) -> Self {
        Self {
            scale,
            crs: crs.into(),
            file_format: GEOTIFF_FORMAT.to_string(),
            file_per_band: false,
            region,
        }
    }
}

/// Parameters of an asynchronous export submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub region: Geometry,
    pub description: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub scale: f64,
    pub crs: String,
    pub max_pixels: f64,
}

/// Handle to a submitted export job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    /// Operation name used to poll status.
    pub name: String,
    /// Human-readable description the job was submitted with.
    #[serde(default)]
    pub description: String,
}

/// State string reported for a successful job.
pub const STATE_SUCCEEDED: &str = "SUCCEEDED";

/// A single status record polled from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub description: Option<String>,
    /// Fractional progress in `[0, 1]`, absent while the job is being prepared.
    pub progress: Option<f64>,
    pub done: bool,
    pub state: Option<String>,
    /// Full payload, kept for error reports.
    pub raw: Value,
}

impl TaskStatus {
    /// Parse an operation record.
    ///
    /// `state` is read from `metadata.state`, falling back to a top-level
    /// `state` field.
    pub fn from_value(raw: Value) -> Self {
        let metadata = raw.get("metadata");
        let description = metadata
            .and_then(|m| m.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let progress = metadata.and_then(|m| m.get("progress")).and_then(Value::as_f64);
        let state = metadata
            .and_then(|m| m.get("state"))
            .or_else(|| raw.get("state"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let done = raw.get("done").and_then(Value::as_bool).unwrap_or(false);

        Self {
            description,
            progress,
            done,
            state,
            raw,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state.as_deref() == Some(STATE_SUCCEEDED)
    }
}

/// Catalog search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Full catalog collection id.
    pub collection: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub region: Geometry,
    /// Minimum percentage of cloud/shadow free pixels.
    pub valid_portion: f64,
}

/// One image returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: String,
    /// Summary properties in service order (date, validity, score, ...).
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Composite request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRequest {
    pub ids: Vec<String>,
    pub method: CompositeMethod,
    pub mask: bool,
    pub scale_refl: bool,
}

/// Composite image computed by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompositeImage {
    /// Synthesized id, e.g. `LANDSAT-LC08-C02-T1_L2-Q_MOSAIC-2021_01_01-2021_01_02`.
    pub id: String,
    pub image: ImageRef,
    /// Metadata when the service returns it alongside the composite.
    #[serde(default)]
    pub info: Option<ImageInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_progress() {
        let status = TaskStatus::from_value(json!({
            "name": "operations/ABC",
            "metadata": {"description": "export", "state": "PENDING"}
        }));
        assert_eq!(status.progress, None);
        assert!(!status.done);
        assert_eq!(status.state.as_deref(), Some("PENDING"));
        assert_eq!(status.description.as_deref(), Some("export"));
    }

    #[test]
    fn test_status_top_level_state_fallback() {
        let status = TaskStatus::from_value(json!({
            "metadata": {"description": "export", "progress": 1.0},
            "done": true,
            "state": "SUCCEEDED"
        }));
        assert!(status.done);
        assert!(status.succeeded());
        assert_eq!(status.progress, Some(1.0));
    }

    #[test]
    fn test_download_params_wire_shape() {
        let params = DownloadParams::geotiff(Geometry::from_bbox(0.0, 0.0, 1.0, 1.0), "EPSG:32734", 30.0);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["fileFormat"], "GeoTIFF");
        assert_eq!(value["filePerBand"], false);
        assert_eq!(value["crs"], "EPSG:32734");
    }

    #[test]
    fn test_image_ref_is_transparent() {
        let image = ImageRef::asset("COPERNICUS/S2/20210101");
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value, json!({"asset": "COPERNICUS/S2/20210101"}));
    }
}
