//! State shared between chained commands.
//!
//! `cloudfree search ... composite ... download ...` runs each command in
//! order against one [`PipelineContext`]. Search records its ids and region,
//! composite consumes the ids and records its result, and download or export
//! pick up whichever is present.

use crate::catalog::{image_list, ImageEntry, SearchResults};
use crate::error::{ConfigError, Result};
use crate::geometry::Geometry;
use crate::region::{resolve_region, BoundingBox, RegionInput};
use crate::service::ImageService;

/// Results carried from one chained command to the next.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    search_ids: Option<Vec<String>>,
    search_region: Option<Geometry>,
    composite: Option<ImageEntry>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a search's ids and region.
    pub fn record_search(&mut self, results: &SearchResults) {
        self.search_ids = Some(results.ids());
        self.search_region = Some(results.query.region.clone());
    }

    pub fn search_ids(&self) -> Option<&[String]> {
        self.search_ids.as_deref()
    }

    pub fn search_region(&self) -> Option<&Geometry> {
        self.search_region.as_ref()
    }

    pub fn record_composite(&mut self, entry: ImageEntry) {
        self.composite = Some(entry);
    }

    pub fn composite(&self) -> Option<&ImageEntry> {
        self.composite.as_ref()
    }

    /// Ids to composite: the explicit list, or else the chained search ids.
    ///
    /// Search ids are consumed so later commands see only the composite.
    pub fn take_composite_ids(
        &mut self,
        ids: &[String],
    ) -> std::result::Result<Vec<String>, ConfigError> {
        if !ids.is_empty() {
            return Ok(ids.to_vec());
        }
        self.search_ids.take().ok_or(ConfigError::NoImageSource)
    }

    /// Region for a download or export.
    ///
    /// An explicit region or bounding box wins over the chained search
    /// region.
    pub fn resolve_region(
        &self,
        region: Option<&RegionInput>,
        bbox: Option<&BoundingBox>,
        buffer_pct: f64,
    ) -> std::result::Result<Geometry, ConfigError> {
        if region.is_none() && bbox.is_none() {
            return self.search_region.clone().ok_or(ConfigError::NoRegion);
        }
        resolve_region(region, bbox, buffer_pct)
    }

    /// Images for a download or export.
    ///
    /// Precedence: chained composite, chained search ids, explicit ids.
    pub fn resolve_images(
        &self,
        service: &dyn ImageService,
        ids: &[String],
        mask: bool,
        scale_refl: bool,
    ) -> Result<Vec<ImageEntry>> {
        if let Some(composite) = &self.composite {
            return Ok(vec![composite.clone()]);
        }
        if let Some(search_ids) = &self.search_ids {
            return image_list(service, search_ids, mask, scale_refl);
        }
        if !ids.is_empty() {
            return image_list(service, ids, mask, scale_refl);
        }
        Err(ConfigError::NoImageSource.into())
    }
}
