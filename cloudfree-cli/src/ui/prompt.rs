//! Interactive prompts.

use std::path::{Path, PathBuf};

use cloudfree::download::{CollisionResolver, UserChoice};
use console::{style, Term};
use dialoguer::{Input, Select};

const CHOICES: [&str; 3] = ["Overwrite", "Rename", "Abort"];

/// Asks on the terminal what to do about an existing file.
///
/// Without a terminal every collision aborts.
pub struct PromptResolver {
    term: Term,
}

impl PromptResolver {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn ask(&self, existing: &Path) -> dialoguer::Result<UserChoice> {
        let choice = Select::new()
            .with_prompt(format!(
                "{} {} exists",
                style("File").yellow(),
                existing.display()
            ))
            .items(&CHOICES)
            .default(2)
            .interact_on(&self.term)?;

        Ok(match choice {
            0 => UserChoice::Overwrite,
            1 => {
                let name: String = Input::new()
                    .with_prompt("New file name")
                    .interact_text_on(&self.term)?;
                UserChoice::Rename(PathBuf::from(name.trim()))
            }
            _ => UserChoice::Abort,
        })
    }
}

impl Default for PromptResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionResolver for PromptResolver {
    fn resolve(&self, existing: &Path) -> UserChoice {
        if !self.term.is_term() {
            return UserChoice::Abort;
        }
        self.ask(existing).unwrap_or(UserChoice::Abort)
    }
}
