//! Service abstractions for testability.
//!
//! The imagery service and the download transport are consumed through these
//! traits so the resolver, drivers and CLI can run against in-process fakes.

use std::io::Read;

use super::error::ServiceResult;
use super::types::{
    CompositeImage, CompositeRequest, DownloadParams, ExportParams, ExportTask, ImageRef,
    SearchQuery, SearchRecord, TaskStatus,
};
use crate::image::ImageInfo;

/// Remote imagery catalog and compute service.
pub trait ImageService: Send + Sync {
    /// Fetch id, CRS, scale, band and property metadata for an image.
    fn image_info(&self, image: &ImageRef) -> ServiceResult<ImageInfo>;

    /// Request a direct-download link for a single-file GeoTIFF bundle.
    fn download_url(&self, image: &ImageRef, params: &DownloadParams) -> ServiceResult<String>;

    /// Submit an asynchronous export job.
    fn start_export(&self, image: &ImageRef, params: &ExportParams) -> ServiceResult<ExportTask>;

    /// Poll the status record of an export job.
    fn task_status(&self, task: &ExportTask) -> ServiceResult<TaskStatus>;

    /// Search a collection.
    fn search(&self, query: &SearchQuery) -> ServiceResult<Vec<SearchRecord>>;

    /// Composite a set of images into one.
    fn composite(&self, request: &CompositeRequest) -> ServiceResult<CompositeImage>;
}

/// An open response body.
pub struct RemoteBody {
    pub reader: Box<dyn Read + Send>,
    /// Declared content length, when the server sent one.
    pub content_length: Option<u64>,
}

impl std::fmt::Debug for RemoteBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens download links for streaming.
pub trait BundleFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> ServiceResult<RemoteBody>;
}
