//! Download command - fetch images as GeoTIFF files.

use std::path::PathBuf;

use clap::Args;
use cloudfree::batch::run_downloads;
use cloudfree::download::DownloadDriver;
use cloudfree::pipeline::PipelineContext;

use super::common::{ImageArgs, RegionArgs, Session};
use crate::error::CliError;
use crate::ui::progress::ConsoleReporter;
use crate::ui::prompt::PromptResolver;

/// Arguments for the download command.
#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    #[command(flatten)]
    pub region: RegionArgs,

    /// Download image file(s) to this directory [default: download.directory or the current directory]
    #[arg(short, long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Overwrite existing files without asking
    #[arg(short, long)]
    pub overwrite: bool,
}

/// Run the download command.
pub fn run(
    args: DownloadArgs,
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

    let directory = args
        .download_dir
        .unwrap_or_else(|| session.config.download_dir());
    if !directory.is_dir() {
        return Err(CliError::Config(format!(
            "Download directory {} does not exist.",
            directory.display()
        )));
    }

    let resolver = PromptResolver::new();
    let driver = DownloadDriver::new(&session.service, &session.fetcher)
        .with_resolver(&resolver)
        .with_chunk_size(session.config.download.chunk_size);
    let reporter = ConsoleReporter::new();

    println!();
    println!("Downloading:");
    println!();

    let outcomes = run_downloads(
        &session.service,
        &driver,
        &entries,
        &overrides,
        &directory,
        args.overwrite,
        &reporter,
    )?;

    println!();
    println!("{} image(s) downloaded to {}", outcomes.len(), directory.display());
    Ok(())
}
