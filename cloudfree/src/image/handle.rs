//! Remote image handles.
//!
//! A handle is either a bare reference whose metadata is fetched on first use
//! (`Raw`) or a reference that already carries its metadata (`Enriched`:
//! masked catalog images and composites). Callers use both through
//! [`RemoteImage`].

use std::cell::OnceCell;

use tracing::debug;

use crate::service::{
    DownloadParams, ExportParams, ExportTask, ImageRef, ImageService, ServiceResult,
};

use super::info::ImageInfo;

/// Capabilities shared by every kind of image handle.
pub trait RemoteImage {
    /// Reference sent to the service.
    fn image_ref(&self) -> &ImageRef;

    /// Image metadata, fetched at most once per handle.
    fn fetch_metadata(&self, service: &dyn ImageService) -> ServiceResult<&ImageInfo>;

    /// Request a direct-download link.
    fn request_download_link(
        &self,
        service: &dyn ImageService,
        params: &DownloadParams,
    ) -> ServiceResult<String> {
        service.download_url(self.image_ref(), params)
    }

    /// Submit an export job.
    fn request_export(
        &self,
        service: &dyn ImageService,
        params: &ExportParams,
    ) -> ServiceResult<ExportTask> {
        service.start_export(self.image_ref(), params)
    }
}

/// A remote image, tagged by where its metadata comes from.
#[derive(Debug, Clone)]
pub enum ImageHandle {
    /// Bare reference; metadata is fetched lazily and cached.
    Raw {
        image: ImageRef,
        info: OnceCell<ImageInfo>,
    },
    /// Reference with metadata already attached.
    Enriched { image: ImageRef, info: ImageInfo },
}

impl ImageHandle {
    pub fn raw(image: ImageRef) -> Self {
        ImageHandle::Raw {
            image,
            info: OnceCell::new(),
        }
    }

    pub fn enriched(image: ImageRef, info: ImageInfo) -> Self {
        ImageHandle::Enriched { image, info }
    }

    /// Fetch metadata now and attach it to the reference.
    pub fn enrich(image: ImageRef, service: &dyn ImageService) -> ServiceResult<Self> {
        let info = service.image_info(&image)?;
        Ok(Self::enriched(image, info))
    }

    /// Whether metadata is available without a service call.
    pub fn has_metadata(&self) -> bool {
        match self {
            ImageHandle::Raw { info, .. } => info.get().is_some(),
            ImageHandle::Enriched { .. } => true,
        }
    }
}

impl RemoteImage for ImageHandle {
    fn image_ref(&self) -> &ImageRef {
        match self {
            ImageHandle::Raw { image, .. } | ImageHandle::Enriched { image, .. } => image,
        }
    }

    fn fetch_metadata(&self, service: &dyn ImageService) -> ServiceResult<&ImageInfo> {
        match self {
            ImageHandle::Enriched { info, .. } => Ok(info),
            ImageHandle::Raw { image, info } => {
                if let Some(cached) = info.get() {
                    return Ok(cached);
                }
                debug!(image = %image.as_value(), "fetching image metadata");
                let fetched = service.image_info(image)?;
                Ok(info.get_or_init(|| fetched))
            }
        }
    }
}
