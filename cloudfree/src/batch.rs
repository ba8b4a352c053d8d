//! Batch download and export.
//!
//! Images are processed one at a time in list order. The first failure
//! aborts the batch; images already written stay on disk and jobs already
//! submitted keep running remotely.

use std::path::Path;

use tracing::info;

use crate::catalog::ImageEntry;
use crate::download::{DownloadDriver, DownloadOutcome, TransferProgressCallback};
use crate::error::Result;
use crate::export::{ExportDriver, ExportJob, ExportProgressCallback};
use crate::image::{ImageDescriptor, Overrides};
use crate::service::{ImageService, TaskStatus};

/// Hooks for reporting batch progress to a user interface.
pub trait BatchReporter {
    /// Progress callback for the transfer of one image.
    fn transfer_progress(&self, _name: &str) -> Option<TransferProgressCallback> {
        None
    }

    /// Progress callback for monitoring one export job.
    fn export_progress(&self, _label: &str) -> Option<ExportProgressCallback> {
        None
    }

    fn download_finished(&self, _outcome: &DownloadOutcome) {}

    fn export_submitted(&self, _job: &ExportJob) {}
}

/// Reporter that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl BatchReporter for SilentReporter {}

/// Resolve and download each image to `<directory>/<name>.tif`.
pub fn run_downloads(
    service: &dyn ImageService,
    driver: &DownloadDriver<'_>,
    entries: &[ImageEntry],
    overrides: &Overrides,
    directory: &Path,
    overwrite: bool,
    reporter: &dyn BatchReporter,
) -> Result<Vec<DownloadOutcome>> {
    info!(count = entries.len(), directory = %directory.display(), "downloading");
    let mut outcomes = Vec::with_capacity(entries.len());

    for entry in entries {
        let destination = directory.join(format!("{}.tif", entry.name));
        let descriptor = ImageDescriptor::resolve(
            &entry.handle,
            service,
            &destination.to_string_lossy(),
            overrides,
        )?;

        let progress = reporter.transfer_progress(&entry.name);
        let outcome = driver.download(&descriptor, &destination, overwrite, progress.as_ref())?;
        reporter.download_finished(&outcome);
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Outcome of an export batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBatch {
    pub jobs: Vec<ExportJob>,
    /// Terminal status of each job, in submission order. Empty when the
    /// batch did not wait.
    pub statuses: Vec<TaskStatus>,
}

/// Resolve and submit every image, then optionally monitor each job.
///
/// All jobs are submitted before any is monitored, so the remote service
/// can work on them concurrently.
pub fn run_exports(
    service: &dyn ImageService,
    driver: &ExportDriver<'_>,
    entries: &[ImageEntry],
    overrides: &Overrides,
    folder: &str,
    wait: bool,
    reporter: &dyn BatchReporter,
) -> Result<ExportBatch> {
    info!(count = entries.len(), folder, wait, "exporting");
    let mut jobs = Vec::with_capacity(entries.len());

    for entry in entries {
        let descriptor = ImageDescriptor::resolve(&entry.handle, service, &entry.name, overrides)?;
        let job = driver.submit(&descriptor, &entry.name, folder)?;
        reporter.export_submitted(&job);
        jobs.push(job);
    }

    let mut statuses = Vec::new();
    if wait {
        for job in &jobs {
            let progress = reporter.export_progress(&job.description);
            statuses.push(driver.monitor(job, None, progress.as_ref())?);
        }
    }

    Ok(ExportBatch { jobs, statuses })
}
