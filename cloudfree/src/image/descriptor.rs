//! Image descriptor resolution.
//!
//! Combines an image's intrinsic metadata with the caller's overrides into
//! the region/CRS/scale triple that download and export requests need.

use std::path::Path;

use tracing::info;

use crate::geometry::{Geometry, RegionSpec};
use crate::service::{DownloadParams, ExportParams, ImageRef, ImageService, ServiceResult};

use super::error::{ResolutionError, UNSUPPORTED_NATIVE_CRS};
use super::handle::{ImageHandle, RemoteImage};
use super::info::ImageInfo;

/// Caller-supplied destination parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub region: Option<RegionSpec>,
    pub crs: Option<String>,
    pub scale: Option<f64>,
}

impl Overrides {
    pub fn with_region(mut self, region: impl Into<RegionSpec>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Where the destination region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Override,
    Footprint,
}

/// An image with every export parameter resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    pub id: String,
    /// Destination name the descriptor was resolved for.
    pub name: String,
    pub image: ImageRef,
    pub info: ImageInfo,
    pub crs: String,
    pub scale: f64,
    pub region: Geometry,
    pub region_source: RegionSource,
}

impl ImageDescriptor {
    /// Resolve a handle into a descriptor.
    ///
    /// Metadata is fetched at most once per handle; no other service calls
    /// are made.
    pub fn resolve(
        handle: &ImageHandle,
        service: &dyn ImageService,
        name: &str,
        overrides: &Overrides,
    ) -> Result<Self, ResolutionError> {
        let info = handle
            .fetch_metadata(service)
            .map_err(|source| ResolutionError::Metadata {
                name: name.to_string(),
                source,
            })?;

        let id = match &info.id {
            Some(id) => id.clone(),
            None => name_stem(name),
        };

        let (native_crs, native_scale) = match (&info.crs, info.scale) {
            (Some(crs), Some(scale)) => (Some(crs.as_str()), Some(scale)),
            _ if overrides.crs.is_some() && overrides.scale.is_some() => (None, None),
            _ => return Err(ResolutionError::MissingProjection { id }),
        };

        if native_crs == Some(UNSUPPORTED_NATIVE_CRS) && overrides.crs.is_none() {
            return Err(ResolutionError::UnsupportedCrs {
                id,
                crs: UNSUPPORTED_NATIVE_CRS.to_string(),
            });
        }

        let crs = match (&overrides.crs, native_crs) {
            (Some(crs), _) => crs.clone(),
            (None, Some(crs)) => crs.to_string(),
            (None, None) => return Err(ResolutionError::MissingProjection { id }),
        };

        let (region, region_source) = match (&overrides.region, info.footprint()) {
            (Some(region), _) => (region.clone(), RegionSource::Override),
            (None, Some(footprint)) => {
                info!(%id, "region not specified, using image footprint");
                (RegionSpec::Raw(footprint.clone()), RegionSource::Footprint)
            }
            (None, None) => return Err(ResolutionError::MissingFootprint { id }),
        };

        let scale = match (overrides.scale, native_scale) {
            (Some(scale), _) | (None, Some(scale)) => scale,
            (None, None) => return Err(ResolutionError::MissingProjection { id }),
        };

        let region = match region {
            RegionSpec::Geometry(geometry) => geometry,
            RegionSpec::Raw(value) => {
                Geometry::from_value(value).map_err(|e| ResolutionError::InvalidRegion {
                    id: id.clone(),
                    reason: e.to_string(),
                })?
            }
        };

        Ok(Self {
            id,
            name: name.to_string(),
            image: handle.image_ref().clone(),
            info: info.clone(),
            crs,
            scale,
            region,
            region_source,
        })
    }

    /// Parameters for a single-file GeoTIFF download link.
    pub fn download_params(&self) -> DownloadParams {
        DownloadParams::geotiff(self.region.clone(), self.crs.clone(), self.scale)
    }

    /// Parameters for an export submission.
    pub fn export_params(
        &self,
        description: impl Into<String>,
        folder: impl Into<String>,
        max_pixels: f64,
    ) -> ExportParams {
        ExportParams {
            region: self.region.clone(),
            description: description.into(),
            folder: folder.into(),
            file_name_prefix: self.name.clone(),
            scale: self.scale,
            crs: self.crs.clone(),
            max_pixels,
        }
    }
}

impl RemoteImage for ImageDescriptor {
    fn image_ref(&self) -> &ImageRef {
        &self.image
    }

    fn fetch_metadata(&self, _service: &dyn ImageService) -> ServiceResult<&ImageInfo> {
        Ok(&self.info)
    }
}

fn name_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
        .to_string()
}
