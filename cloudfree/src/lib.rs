//! cloudfree - cloud-free satellite imagery as georeferenced rasters
//!
//! This library searches a remote imagery catalog, builds cloud-masked
//! composites, and retrieves images either as direct GeoTIFF downloads or as
//! asynchronous cloud-storage exports. Downloaded rasters get a GDAL PAM
//! sidecar carrying the image and band metadata.
//!
//! The remote catalog is reached through [`service::ImageService`]; the
//! command-line client lives in the `cloudfree-cli` crate.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image;
pub mod logging;
pub mod pipeline;
pub mod region;
pub mod service;
pub mod sidecar;

pub use error::{ConfigError, Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
