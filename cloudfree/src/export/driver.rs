//! Export job submission and monitoring.
//!
//! A job moves through these phases while it is polled:
//!
//! 1. `Submitted`: the status record has no progress field yet
//! 2. `Preparing`: the first record with a progress field arrived
//! 3. `Running`: progress is being reported
//! 4. `Succeeded` or `Failed`: the record's `done` flag is set
//!
//! Polling uses a fixed interval with no backoff. It is unbounded unless a
//! timeout is configured, and stops early when the cancel token is set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::image::{ImageDescriptor, RemoteImage};
use crate::service::{ExportTask, ImageService, TaskStatus};

use super::clock::{CancelToken, Clock, SystemClock};
use super::error::ExportError;

/// Maximum length of a job description.
pub const DESCRIPTION_LIMIT: usize = 100;

/// Maximum length of the default monitor label.
pub const LABEL_LIMIT: usize = 80;

/// Pixel ceiling sent with every export.
pub const DEFAULT_MAX_PIXELS: f64 = 1e9;

/// Interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Progress callback for export monitoring.
///
/// # Arguments
///
/// * `phase` - Current job phase
/// * `progress` - Fraction complete in `[0, 1]`, `None` while submitted
/// * `label` - Human-readable job label
pub type ExportProgressCallback = Box<dyn Fn(JobPhase, Option<f64>, &str) + Send + Sync>;

/// Phases of a remote export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Submitted,
    Preparing,
    Running,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Preparing => "Preparing",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Polling behaviour of [`ExportDriver::monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    /// Upper bound on monitoring time; `None` polls until the job ends.
    pub timeout: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// A submitted export job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub task: ExportTask,
    /// Description the job was submitted with.
    pub description: String,
}

/// Submits exports and polls them to completion.
pub struct ExportDriver<'a> {
    service: &'a dyn ImageService,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    cancel: CancelToken,
    max_pixels: f64,
}

impl<'a> ExportDriver<'a> {
    pub fn new(service: &'a dyn ImageService) -> Self {
        Self {
            service,
            clock: Arc::new(SystemClock),
            settings: MonitorSettings::default(),
            cancel: CancelToken::new(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: MonitorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: f64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Submit an export of `descriptor` to `folder` under `name`.
    pub fn submit(
        &self,
        descriptor: &ImageDescriptor,
        name: &str,
        folder: &str,
    ) -> Result<ExportJob, ExportError> {
        let description = truncate(name, DESCRIPTION_LIMIT);
        let mut params = descriptor.export_params(description.clone(), folder, self.max_pixels);
        params.file_name_prefix = name.to_string();

        let task = descriptor.request_export(self.service, &params)?;
        info!(
            task = %task.name,
            %description,
            folder,
            crs = %params.crs,
            scale = params.scale,
            "export submitted"
        );

        Ok(ExportJob { task, description })
    }

    /// Poll a job until it reaches a terminal state.
    ///
    /// `label` defaults to the job description reported by the service.
    pub fn monitor(
        &self,
        job: &ExportJob,
        label: Option<&str>,
        on_progress: Option<&ExportProgressCallback>,
    ) -> Result<TaskStatus, ExportError> {
        let started = self.clock.now();
        let report = |phase: JobPhase, progress: Option<f64>, label: &str| {
            if let Some(callback) = on_progress {
                callback(phase, progress, label);
            }
        };

        let mut status = self.poll(job)?;
        let label = match label {
            Some(label) => label.to_string(),
            None => truncate(
                status.description.as_deref().unwrap_or(&job.description),
                LABEL_LIMIT,
            ),
        };

        let mut phase = JobPhase::Submitted;
        while status.progress.is_none() && !status.done {
            report(phase, None, &label);
            self.wait(job, started)?;
            status = self.poll(job)?;
        }

        let mut fraction = 0.0;
        if status.progress.is_some() {
            phase = JobPhase::Preparing;
            fraction = clamp_progress(status.progress);
            report(phase, Some(fraction), &label);
        }

        while !status.done {
            self.wait(job, started)?;
            status = self.poll(job)?;
            if status.progress.is_some() {
                fraction = clamp_progress(status.progress);
            }
            phase = JobPhase::Running;
            report(phase, Some(fraction), &label);
        }

        if status.succeeded() {
            report(JobPhase::Succeeded, Some(1.0), &label);
            info!(task = %job.task.name, "export succeeded");
            Ok(status)
        } else {
            report(JobPhase::Failed, Some(fraction), &label);
            let state = status.state.clone().unwrap_or_else(|| "UNKNOWN".to_string());
            warn!(task = %job.task.name, %state, "export failed");
            Err(ExportError::JobFailed {
                description: job.description.clone(),
                state,
                payload: status.raw.to_string(),
            })
        }
    }

    fn poll(&self, job: &ExportJob) -> Result<TaskStatus, ExportError> {
        let status = self.service.task_status(&job.task)?;
        debug!(
            task = %job.task.name,
            progress = ?status.progress,
            done = status.done,
            state = ?status.state,
            "polled export status"
        );
        Ok(status)
    }

    /// Sleep one interval, failing on cancellation or timeout.
    fn wait(&self, job: &ExportJob, started: Instant) -> Result<(), ExportError> {
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled {
                description: job.description.clone(),
            });
        }
        if let Some(timeout) = self.settings.timeout {
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= timeout {
                return Err(ExportError::TimedOut {
                    description: job.description.clone(),
                    elapsed,
                });
            }
        }
        self.clock.sleep(self.settings.interval);
        Ok(())
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn clamp_progress(progress: Option<f64>) -> f64 {
    progress.unwrap_or(0.0).clamp(0.0, 1.0)
}
