//! Direct download of resolved images.
//!
//! The service packs the GeoTIFF into a zip bundle. The bundle is streamed to
//! a uniquely named temporary file next to the destination, its single raster
//! is unpacked into a second temporary file, and that file is moved into
//! place once any collision with an existing file is settled. Both temporary
//! files are removed when dropped, so nothing is left behind on failure.

use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::image::{ImageDescriptor, RemoteImage};
use crate::service::{BundleFetcher, ImageService, ServiceError};
use crate::sidecar::{sidecar_path, write_sidecar};

use super::collision::{settle_destination, AbortOnCollision, CollisionResolver};
use super::error::DownloadError;

/// Read buffer size for streaming bundles.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Prefix of temporary files created in the destination directory.
pub const TEMP_PREFIX: &str = ".cloudfree-";

/// Progress callback for bundle transfers.
///
/// # Arguments
///
/// * `bytes_downloaded` - Bytes written so far
/// * `total_bytes` - Declared content length, if the server sent one
pub type TransferProgressCallback = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Download link the bundle was fetched from.
    pub link: String,
    /// Final raster path.
    pub path: PathBuf,
    /// Size of the transferred bundle.
    pub bytes: u64,
}

/// Message pattern of the service's size-limit rejection.
fn size_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Total request size \(.*\) must be less than or equal to .*").unwrap()
    })
}

/// Whether a service error is the direct-download size limit.
pub fn is_size_limit_error(error: &ServiceError) -> bool {
    error
        .remote_message()
        .map(|message| size_limit_pattern().is_match(message))
        .unwrap_or(false)
}

/// Destination raster path: `destination` with its extension forced to `.tif`.
pub fn tif_destination(destination: &Path) -> PathBuf {
    destination.with_extension("tif")
}

/// Downloads resolved images.
pub struct DownloadDriver<'a> {
    service: &'a dyn ImageService,
    fetcher: &'a dyn BundleFetcher,
    resolver: &'a dyn CollisionResolver,
    chunk_size: usize,
}

impl<'a> DownloadDriver<'a> {
    /// Create a driver that aborts on collisions unless told to overwrite.
    pub fn new(service: &'a dyn ImageService, fetcher: &'a dyn BundleFetcher) -> Self {
        Self {
            service,
            fetcher,
            resolver: &AbortOnCollision,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn CollisionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Download `descriptor` to `destination`.
    ///
    /// The raster is written as `<destination stem>.tif` with its sidecar
    /// alongside.
    pub fn download(
        &self,
        descriptor: &ImageDescriptor,
        destination: &Path,
        overwrite: bool,
        on_progress: Option<&TransferProgressCallback>,
    ) -> Result<DownloadOutcome, DownloadError> {
        let link = descriptor
            .request_download_link(self.service, &descriptor.download_params())
            .map_err(|e| {
                if is_size_limit_error(&e) {
                    DownloadError::TooLarge {
                        message: e.remote_message().unwrap_or_default().to_string(),
                    }
                } else {
                    DownloadError::Service(e)
                }
            })?;
        debug!(id = %descriptor.id, %link, "download link");

        let target = tif_destination(destination);
        let directory = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (bundle, bytes) = self.fetch_bundle(&link, &directory, on_progress)?;
        let unpacked = unpack_single_raster(&bundle, &directory);
        let bundle_path = bundle.path().to_path_buf();
        bundle
            .close()
            .map_err(|e| DownloadError::io(bundle_path, e))?;
        let raster = unpacked?;

        let path = settle_destination(&target, overwrite, self.resolver)?;
        raster
            .persist(&path)
            .map_err(|e| DownloadError::io(&path, e.error))?;

        write_sidecar(&descriptor.info, &sidecar_path(&path))?;

        info!(id = %descriptor.id, path = %path.display(), bytes, "download complete");
        Ok(DownloadOutcome { link, path, bytes })
    }

    /// Stream the bundle behind `link` into a temporary file in `directory`.
    fn fetch_bundle(
        &self,
        link: &str,
        directory: &Path,
        on_progress: Option<&TransferProgressCallback>,
    ) -> Result<(NamedTempFile, u64), DownloadError> {
        let mut body = self.fetcher.fetch(link)?;
        let mut bundle = temp_file(directory, ".zip")?;
        let bundle_path = bundle.path().to_path_buf();

        let mut writer = BufWriter::new(bundle.as_file_mut());
        let mut buffer = vec![0u8; self.chunk_size];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = body
                .reader
                .read(&mut buffer)
                .map_err(|e| DownloadError::Transfer {
                    url: link.to_string(),
                    reason: e.to_string(),
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| DownloadError::io(&bundle_path, e))?;

            downloaded += bytes_read as u64;

            if let Some(cb) = on_progress {
                cb(downloaded, body.content_length);
            }
        }

        writer
            .flush()
            .map_err(|e| DownloadError::io(&bundle_path, e))?;
        drop(writer);

        Ok((bundle, downloaded))
    }
}

/// Extract the first file entry of a zip bundle into a temporary file.
fn unpack_single_raster(
    bundle: &NamedTempFile,
    directory: &Path,
) -> Result<NamedTempFile, DownloadError> {
    let bundle_file = bundle
        .reopen()
        .map_err(|e| DownloadError::io(bundle.path(), e))?;
    let mut archive = ZipArchive::new(bundle_file).map_err(|e| DownloadError::Bundle {
        reason: e.to_string(),
    })?;

    let files: Vec<usize> = (0..archive.len())
        .filter(|&i| archive.by_index(i).map(|f| !f.is_dir()).unwrap_or(false))
        .collect();
    let index = *files.first().ok_or_else(|| DownloadError::Bundle {
        reason: "bundle contains no files".to_string(),
    })?;
    if files.len() > 1 {
        warn!(entries = files.len(), "bundle has more than one file, using the first");
    }

    let mut entry = archive.by_index(index).map_err(|e| DownloadError::Bundle {
        reason: e.to_string(),
    })?;
    debug!(entry = entry.name(), size = entry.size(), "unpacking bundle");

    let mut raster = temp_file(directory, ".tif")?;
    let raster_path = raster.path().to_path_buf();
    io::copy(&mut entry, raster.as_file_mut()).map_err(|e| DownloadError::io(raster_path, e))?;
    Ok(raster)
}

fn temp_file(directory: &Path, suffix: &str) -> Result<NamedTempFile, DownloadError> {
    Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile_in(directory)
        .map_err(|e| DownloadError::io(directory, e))
}

/// Whether a path is a temporary file created by the download driver.
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(TEMP_PREFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_detection() {
        let too_large = ServiceError::Api {
            status: 400,
            message: "Total request size (56623104 bytes) must be less than or equal to 50331648 bytes."
                .to_string(),
        };
        let other = ServiceError::Api {
            status: 400,
            message: "Image.select: Pattern 'B99' did not match any bands.".to_string(),
        };

        assert!(is_size_limit_error(&too_large));
        assert!(!is_size_limit_error(&other));
        assert!(!is_size_limit_error(&ServiceError::Http("timeout".to_string())));
    }

    #[test]
    fn test_tif_destination() {
        assert_eq!(
            tif_destination(Path::new("/data/scene.jp2")),
            PathBuf::from("/data/scene.tif")
        );
        assert_eq!(
            tif_destination(Path::new("/data/LANDSAT-LC08-C02-T1_L2-LC08_172083_20210101")),
            PathBuf::from("/data/LANDSAT-LC08-C02-T1_L2-LC08_172083_20210101.tif")
        );
    }

    #[test]
    fn test_temp_file_names() {
        assert!(is_temp_file(Path::new("/data/.cloudfree-abc123.zip")));
        assert!(!is_temp_file(Path::new("/data/scene.tif")));
    }
}
