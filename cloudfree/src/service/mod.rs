//! Remote imagery service access.
//!
//! The catalog/compute service is consumed as a black box: image metadata,
//! download links, export jobs, search and compositing all go through the
//! [`ImageService`] trait. [`HttpImageService`] talks to the real service;
//! tests substitute in-process fakes.

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::{ServiceConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_ENV};
pub use error::{ServiceError, ServiceResult};
pub use http::{HttpBundleFetcher, HttpImageService};
pub use traits::{BundleFetcher, ImageService, RemoteBody};
pub use types::{
    CompositeImage, CompositeRequest, DownloadParams, ExportParams, ExportTask, ImageRef,
    SearchQuery, SearchRecord, TaskStatus, GEOTIFF_FORMAT, STATE_SUCCEEDED,
};
