//! Compositing requests.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::image::ImageHandle;
use crate::service::{CompositeRequest, ImageService};

use super::collections::output_name;
use super::ImageEntry;

/// How the service combines images into a composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMethod {
    /// Quality mosaic: per pixel, the image with the best cloud distance.
    #[default]
    QMosaic,
    /// First valid pixel in date order.
    Mosaic,
    Median,
    Medoid,
}

impl CompositeMethod {
    pub const ALL: [CompositeMethod; 4] = [
        CompositeMethod::QMosaic,
        CompositeMethod::Mosaic,
        CompositeMethod::Median,
        CompositeMethod::Medoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CompositeMethod::QMosaic => "q_mosaic",
            CompositeMethod::Mosaic => "mosaic",
            CompositeMethod::Median => "median",
            CompositeMethod::Medoid => "medoid",
        }
    }
}

impl fmt::Display for CompositeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompositeMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|method| method.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownCompositeMethod(s.to_string()))
    }
}

/// Composite a set of images remotely.
///
/// The result carries metadata when the service returns it; otherwise its
/// metadata is fetched on first use.
pub fn composite(
    service: &dyn ImageService,
    ids: &[String],
    method: CompositeMethod,
    mask: bool,
    scale_refl: bool,
) -> Result<ImageEntry> {
    if ids.is_empty() {
        return Err(ConfigError::NoImageSource.into());
    }

    let request = CompositeRequest {
        ids: ids.to_vec(),
        method,
        mask,
        scale_refl,
    };
    let composite = service.composite(&request)?;
    info!(id = %composite.id, images = ids.len(), %method, "composite created");

    let handle = match composite.info {
        Some(info) => ImageHandle::enriched(composite.image, info),
        None => ImageHandle::raw(composite.image),
    };

    Ok(ImageEntry {
        name: output_name(&composite.id),
        id: composite.id,
        handle,
    })
}
