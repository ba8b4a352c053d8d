//! Export command - write images to cloud storage asynchronously.

use std::time::Duration;

use clap::Args;
use cloudfree::batch::run_exports;
use cloudfree::export::ExportDriver;
use cloudfree::pipeline::PipelineContext;

use super::common::{flag, ImageArgs, RegionArgs, Session};
use crate::error::CliError;
use crate::ui::progress::ConsoleReporter;

/// Arguments for the export command.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    #[command(flatten)]
    pub region: RegionArgs,

    /// Export image(s) to this storage folder [default: root]
    #[arg(short, long, default_value = "")]
    pub folder: String,

    /// Wait for the exports to complete [default: wait]
    #[arg(short, long, overrides_with = "no_wait")]
    pub wait: bool,

    /// Return as soon as the exports are submitted
    #[arg(long)]
    pub no_wait: bool,

    /// Stop waiting after this many seconds, 0 for no limit [default: export.timeout_secs]
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Run the export command.
pub fn run(
    args: ExportArgs,
    session: &Session,
    context: &mut PipelineContext,
) -> Result<(), CliError> {
    let region = context.resolve_region(
        args.region.input().as_ref(),
        args.region.bounding_box().as_ref(),
        args.region.region_buf,
    )?;
    let entries = context.resolve_images(
        &session.service,
        &args.image.ids,
        args.image.mask(),
        args.image.refl.enabled(),
    )?;
    let overrides = args.image.overrides(region);
    let wait = flag(args.wait, args.no_wait, true);

    let mut settings = session.config.monitor_settings();
    if let Some(secs) = args.timeout {
        settings.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let driver = ExportDriver::new(&session.service)
        .with_settings(settings)
        .with_cancel(session.cancel.clone())
        .with_max_pixels(session.config.export.max_pixels);
    let reporter = ConsoleReporter::new();

    println!();
    println!("Exporting:");
    println!();

    let batch = run_exports(
        &session.service,
        &driver,
        &entries,
        &overrides,
        &args.folder,
        wait,
        &reporter,
    )?;

    println!();
    if wait {
        println!("{} export(s) completed", batch.statuses.len());
    } else {
        println!(
            "{} export(s) submitted, not waiting for completion",
            batch.jobs.len()
        );
    }
    Ok(())
}
