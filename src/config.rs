//! Configuration types for CLI verbosity and fetch options.

use crate::constants::DEFAULT_REMOTE;
use crate::git::{self, GitLogger};
use std::path::PathBuf;

/// Runtime configuration derived from CLI arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Returns the git logger matching the verbosity settings.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Which repository to narrow, against which remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub repo_dir: PathBuf,
    pub remote: String,
    /// Explicit default branch; `None` means detect it from the remote's HEAD.
    pub default_branch: Option<String>,
    /// Delete every tracking ref of the remote before fetching.
    pub reset: bool,
}

impl FetchOptions {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            remote: DEFAULT_REMOTE.to_string(),
            default_branch: None,
            reset: false,
        }
    }
}
