//! Composite command - build a cloud-free composite image.

use clap::Args;
use cloudfree::catalog::{self, CompositeMethod};
use cloudfree::pipeline::PipelineContext;

use super::common::{flag, ReflectanceArgs, Session};
use crate::error::CliError;
use crate::ui::progress::spinner;

/// Arguments for the composite command.
#[derive(Debug, Clone, Args)]
pub struct CompositeArgs {
    /// Catalog image id(s) [default: the chained search results]
    #[arg(short, long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Compositing method (q_mosaic, mosaic, median, medoid)
    #[arg(long, default_value_t = CompositeMethod::QMosaic)]
    pub method: CompositeMethod,

    /// Apply the cloud and shadow mask before compositing [default: mask]
    #[arg(short, long, overrides_with = "no_mask")]
    pub mask: bool,

    /// Composite without masking
    #[arg(long)]
    pub no_mask: bool,

    #[command(flatten)]
    pub refl: ReflectanceArgs,
}

/// Run the composite command.
pub fn run(
    args: CompositeArgs,
    session: &Session,
    context: &mut PipelineContext,
) -> Result<(), CliError> {
    let ids = context.take_composite_ids(&args.ids)?;
    let mask = flag(args.mask, args.no_mask, true);

    println!();
    println!("Compositing {} images ({})...", ids.len(), args.method);

    let pb = spinner("Compositing...");
    let entry = catalog::composite(&session.service, &ids, args.method, mask, args.refl.enabled());
    pb.finish_and_clear();
    let entry = entry?;

    println!("Composite image: {}", entry.id);
    context.record_composite(entry);
    Ok(())
}
