//! cloudfree CLI - Command-line interface
//!
//! Parses a chain of commands, sets up logging and the imagery service
//! session, then runs each command against a shared pipeline context.

mod chain;
mod commands;
mod error;
mod ui;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use cloudfree::config::ConfigFile;
use cloudfree::export::CancelToken;
use cloudfree::logging::{default_log_file, init_logging, LoggingGuard};
use cloudfree::pipeline::PipelineContext;

use chain::split_chain;
use commands::common::Session;
use commands::{Cli, Command};
use error::CliError;

/// Exit status after a second Ctrl+C.
const INTERRUPT_EXIT: i32 = 130;

fn main() -> ExitCode {
    let commands = parse_commands();

    let config = ConfigFile::load().unwrap_or_else(|e| {
        eprintln!("Warning: {}; using default settings", e);
        ConfigFile::default()
    });
    let _log_guard = start_logging(&config);

    match run(commands, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse every chained segment, exiting with clap's message on error.
fn parse_commands() -> Vec<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let segments = split_chain(&args);

    if segments.is_empty() {
        // No arguments: let clap print help.
        let cli = Cli::parse();
        return vec![cli.command];
    }

    segments
        .into_iter()
        .map(|segment| {
            let argv = std::iter::once("cloudfree".to_string()).chain(segment);
            match Cli::try_parse_from(argv) {
                Ok(cli) => cli.command,
                Err(e) => e.exit(),
            }
        })
        .collect()
}

fn start_logging(config: &ConfigFile) -> Option<LoggingGuard> {
    match init_logging(&config.log_dir(), default_log_file()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    }
}

/// First Ctrl+C cancels running work; a second one exits immediately.
fn install_interrupt_handler(cancel: CancelToken) -> Result<(), CliError> {
    let interrupted = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            std::process::exit(INTERRUPT_EXIT);
        }
        eprintln!();
        eprintln!("Interrupted, stopping... (press Ctrl+C again to exit now)");
        cancel.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))
}

fn run(chain: Vec<Command>, config: ConfigFile) -> Result<(), CliError> {
    if chain.len() > 1 && chain.iter().any(|c| matches!(c, Command::Config { .. })) {
        return Err(CliError::Config(
            "'config' cannot be chained with other commands".to_string(),
        ));
    }

    if let Some(Command::Config { command }) = chain.first() {
        return commands::config::run(command.clone());
    }

    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;

    let session = Session::connect(config, cancel)?;
    let mut context = PipelineContext::new();

    tracing::info!(
        commands = ?chain.iter().map(Command::name).collect::<Vec<_>>(),
        "running command chain"
    );

    for command in chain {
        let name = command.name();
        tracing::debug!(command = name, "starting");
        command.run(&session, &mut context)?;
        tracing::debug!(command = name, "finished");
    }

    Ok(())
}
