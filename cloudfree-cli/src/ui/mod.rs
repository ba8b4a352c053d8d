//! Terminal output for the CLI: progress bars and prompts.
//!
//! Kept apart from the log file so interactive output never mixes with
//! tracing records.

pub mod progress;
pub mod prompt;
