//! CLI command definitions and dispatch.

pub mod common;
pub mod composite;
pub mod config;
pub mod download;
pub mod export;
pub mod search;

use clap::{Parser, Subcommand};
use cloudfree::pipeline::PipelineContext;

use crate::error::CliError;
use common::Session;

const AFTER_HELP: &str = "\
Commands can be chained, each one picking up the results of the previous:

  cloudfree search -s 2021-01-01 -b 20 -34 21 -33 composite download -d ./out";

/// Search, composite and download cloud-free satellite imagery.
#[derive(Debug, Parser)]
#[command(name = "cloudfree", version, about, after_help = AFTER_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search a collection for images
    Search(search::SearchArgs),

    /// Create a cloud-free composite image
    Composite(composite::CompositeArgs),

    /// Download image(s) as GeoTIFF files, with cloud and shadow masking
    Download(download::DownloadArgs),

    /// Export image(s) to cloud storage, with cloud and shadow masking
    Export(export::ExportArgs),

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Search(_) => "search",
            Command::Composite(_) => "composite",
            Command::Download(_) => "download",
            Command::Export(_) => "export",
            Command::Config { .. } => "config",
        }
    }

    /// Run a command that needs the imagery service.
    pub fn run(self, session: &Session, context: &mut PipelineContext) -> Result<(), CliError> {
        match self {
            Command::Search(args) => search::run(args, session, context),
            Command::Composite(args) => composite::run(args, session, context),
            Command::Download(args) => download::run(args, session, context),
            Command::Export(args) => export::run(args, session, context),
            Command::Config { command } => config::run(command),
        }
    }
}
