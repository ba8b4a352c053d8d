//! Download errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::service::ServiceError;
use crate::sidecar::SidecarError;

/// A direct download failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The requested extent exceeds the direct-download size limit.
    #[error("the requested image is too large, reduce its size or use `export` instead ({message})")]
    TooLarge { message: String },

    /// The service rejected the download-link request.
    #[error("download request failed: {0}")]
    Service(#[from] ServiceError),

    /// Reading the response body failed.
    #[error("failed to read download from {url}: {reason}")]
    Transfer { url: String, reason: String },

    /// The bundle is not a usable archive.
    #[error("invalid download bundle: {reason}")]
    Bundle { reason: String },

    /// Local file operation failed.
    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The user declined to overwrite an existing file.
    #[error("download aborted: {path} already exists")]
    Aborted { path: PathBuf },

    #[error(transparent)]
    Sidecar(#[from] SidecarError),
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DownloadError::Io {
            path: path.into(),
            source,
        }
    }
}
