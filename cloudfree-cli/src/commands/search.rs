//! Search command - find images in a catalog collection.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use cloudfree::catalog::{self, OutputFormat, SearchArgs as Query, DEFAULT_COLLECTION};
use cloudfree::pipeline::PipelineContext;
use cloudfree::region::resolve_region;

use super::common::{RegionArgs, Session};
use crate::error::CliError;
use crate::ui::progress::spinner;

/// Arguments for the search command.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Collection to search (landsat7_c2_l2, landsat8_c2_l2, sentinel2_toa, sentinel2_sr, modis_nbar)
    #[arg(short, long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Start date (UTC), e.g. 2021-01-01
    #[arg(short, long)]
    pub start_date: NaiveDate,

    /// End date (UTC) [default: start date + 1 day]
    #[arg(short, long)]
    pub end_date: Option<NaiveDate>,

    #[command(flatten)]
    pub region: RegionArgs,

    /// Lower limit of the portion of valid (cloud and shadow free) pixels (%)
    #[arg(short, long, default_value_t = 0.0)]
    pub valid_portion: f64,

    /// Write results to this file; type inferred from extension (.csv or .json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SearchArgs {
    /// Format of the `--output` file, checked before anything is searched.
    pub fn output_format(&self) -> Result<Option<OutputFormat>, CliError> {
        match &self.output {
            Some(path) => Ok(Some(OutputFormat::from_path(path)?)),
            None => Ok(None),
        }
    }
}

/// Run the search command.
pub fn run(
    args: SearchArgs,
    session: &Session,
    context: &mut PipelineContext,
) -> Result<(), CliError> {
    args.output_format()?;

    let region = resolve_region(
        args.region.input().as_ref(),
        args.region.bounding_box().as_ref(),
        args.region.region_buf,
    )?;

    let query = Query {
        collection: args.collection.clone(),
        start_date: args.start_date,
        end_date: args.end_date,
        region,
        valid_portion: args.valid_portion,
    };
    let wire = query.to_query()?;

    println!();
    println!(
        "Searching for {} images between {} and {}...",
        wire.collection, wire.start_date, wire.end_date
    );

    let pb = spinner("Searching...");
    let results = catalog::search(&session.service, &query);
    pb.finish_and_clear();
    let results = results?;

    if results.is_empty() {
        println!("No images found");
        println!();
    } else {
        println!("{} images found", results.records.len());
        println!();

        let legend = results.legend();
        if !legend.is_empty() {
            println!("Image property descriptions:");
            println!();
            for (key, description) in &legend {
                println!("{:<16} {}", format!("{}:", key), description);
            }
            println!();
        }

        println!("Search Results:");
        println!();
        println!("{}", results.summary());
        println!();
    }

    if let Some(output) = &args.output {
        results.write_to(output)?;
        println!("Results written to {}", output.display());
    }

    context.record_search(&results);
    Ok(())
}
