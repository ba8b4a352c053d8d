//! Destination file collision handling.
//!
//! The decision of what to do about an existing file is a pure function of
//! the file's existence and the overwrite flag. When it calls for asking the
//! user, a [`CollisionResolver`] supplies the answer; the CLI implements one
//! with terminal prompts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::error::DownloadError;

/// What to do with the destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionAction {
    /// Nothing is in the way.
    Write,
    /// Delete the existing file without asking.
    Overwrite,
    /// Ask the resolver.
    Ask,
}

/// Decide how to treat a destination path.
pub fn collision_action(exists: bool, overwrite: bool) -> CollisionAction {
    match (exists, overwrite) {
        (false, _) => CollisionAction::Write,
        (true, true) => CollisionAction::Overwrite,
        (true, false) => CollisionAction::Ask,
    }
}

/// A user's answer to a collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChoice {
    Overwrite,
    /// Use another file name. Relative names are taken relative to the
    /// directory of the colliding file.
    Rename(PathBuf),
    Abort,
}

/// Collects a decision about an existing destination file.
pub trait CollisionResolver {
    fn resolve(&self, existing: &Path) -> UserChoice;
}

/// Resolver for non-interactive use: never overwrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnCollision;

impl CollisionResolver for AbortOnCollision {
    fn resolve(&self, _existing: &Path) -> UserChoice {
        UserChoice::Abort
    }
}

/// Find a free destination path, removing an existing file when allowed.
///
/// Loops until the path is free or the resolver allows an overwrite.
pub fn settle_destination(
    desired: &Path,
    overwrite: bool,
    resolver: &dyn CollisionResolver,
) -> Result<PathBuf, DownloadError> {
    let mut destination = desired.to_path_buf();
    loop {
        match collision_action(destination.exists(), overwrite) {
            CollisionAction::Write => return Ok(destination),
            CollisionAction::Overwrite => {
                remove_existing(&destination)?;
                return Ok(destination);
            }
            CollisionAction::Ask => match resolver.resolve(&destination) {
                UserChoice::Overwrite => {
                    remove_existing(&destination)?;
                    return Ok(destination);
                }
                UserChoice::Rename(name) => {
                    destination = match destination.parent() {
                        Some(dir) if name.is_relative() => dir.join(name),
                        _ => name,
                    };
                }
                UserChoice::Abort => {
                    return Err(DownloadError::Aborted { path: destination });
                }
            },
        }
    }
}

fn remove_existing(path: &Path) -> Result<(), DownloadError> {
    info!(path = %path.display(), "overwriting existing file");
    fs::remove_file(path).map_err(|e| DownloadError::io(path, e))
}
