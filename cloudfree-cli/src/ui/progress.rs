//! Progress display for searches, downloads and exports.

use std::sync::Mutex;
use std::time::Duration;

use cloudfree::batch::BatchReporter;
use cloudfree::download::{DownloadOutcome, TransferProgressCallback};
use cloudfree::export::{ExportJob, ExportProgressCallback, JobPhase};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const TRANSFER_TEMPLATE: &str =
    "{msg:<40} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const EXPORT_TEMPLATE: &str = "{msg:<50} [{bar:30.cyan/blue}] {pos:>3}% ({elapsed})";

fn style_from(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or(fallback)
}

/// Spinner for a single remote call.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style_from(SPINNER_TEMPLATE, ProgressStyle::default_spinner()));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders batch progress on the terminal.
///
/// One bar is live at a time; it is finished when the next download
/// completes or the export reaches a terminal phase.
pub struct ConsoleReporter {
    current: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    fn replace_current(&self, pb: &ProgressBar) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(pb.clone()) {
                previous.finish_and_clear();
            }
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchReporter for ConsoleReporter {
    fn transfer_progress(&self, name: &str) -> Option<TransferProgressCallback> {
        let pb = ProgressBar::new(0);
        pb.set_style(style_from(TRANSFER_TEMPLATE, ProgressStyle::default_bar()));
        pb.set_message(name.to_string());
        self.replace_current(&pb);

        Some(Box::new(move |downloaded, total| {
            match total {
                Some(total) => pb.set_length(total),
                None => pb.set_length(downloaded),
            }
            pb.set_position(downloaded);
        }))
    }

    fn download_finished(&self, outcome: &DownloadOutcome) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(pb) = current.take() {
                pb.finish_and_clear();
            }
        }
        println!(
            "{} {}",
            style("Downloaded").green(),
            outcome.path.display()
        );
    }

    fn export_progress(&self, label: &str) -> Option<ExportProgressCallback> {
        let pb = ProgressBar::new(100);
        pb.set_style(style_from(EXPORT_TEMPLATE, ProgressStyle::default_bar()));
        pb.set_message(format!("{}: {}", label, JobPhase::Submitted.name()));
        pb.enable_steady_tick(Duration::from_millis(250));
        self.replace_current(&pb);

        Some(Box::new(move |phase, progress, label| {
            let percent = (progress.unwrap_or(0.0) * 100.0).round() as u64;
            pb.set_position(percent);
            let message = format!("{}: {}", label, phase.name());
            match phase {
                JobPhase::Succeeded => pb.finish_with_message(message),
                JobPhase::Failed => pb.abandon_with_message(message),
                _ => pb.set_message(message),
            }
        }))
    }

    fn export_submitted(&self, job: &ExportJob) {
        println!(
            "{} {} ({})",
            style("Submitted").cyan(),
            job.description,
            job.task.name
        );
    }
}
