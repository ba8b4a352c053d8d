//! Crate-level error types.
//!
//! Each pipeline stage owns its own error enum; [`Error`] gathers them so
//! callers at the batch and CLI boundary can propagate with `?`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::download::DownloadError;
use crate::export::ExportError;
use crate::image::ResolutionError;
use crate::logging::LoggingError;
use crate::service::ServiceError;
use crate::sidecar::SidecarError;

/// Result type for cloudfree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// User-supplied configuration is incomplete or contradictory.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a region nor a bounding box was given.
    #[error("no region specified: pass --region or --bbox, or chain this command with `search`")]
    NoRegion,

    /// No image ids, search results or composite to operate on.
    #[error("no images specified: pass --id, or chain this command with `search` or `composite`")]
    NoImageSource,

    /// A GeoJSON region file could not be read or parsed.
    #[error("{path} is not a valid GeoJSON file: {reason}")]
    InvalidGeoJson { path: PathBuf, reason: String },

    /// A raster region file could not be read.
    #[error("{path} is not a valid GeoJSON or raster file: {reason}")]
    InvalidRaster { path: PathBuf, reason: String },

    /// The search results output file has an unsupported extension.
    #[error("unknown output file extension: {extension:?} (expected .csv or .json)")]
    UnknownOutputExtension { extension: String },

    /// The collection short name is not known.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The compositing method is not known.
    #[error("unknown compositing method: {0}")]
    UnknownCompositeMethod(String),

    /// A date range is inverted or otherwise unusable.
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("valid portion {0} is outside 0-100")]
    InvalidValidPortion(f64),
}

/// Any error raised by the cloudfree library.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Sidecar(#[from] SidecarError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// Local filesystem failure outside the stages above.
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}
