//! Error taxonomy shared by the reconciler, schedule manager and CLI.
//!
//! Every variant is terminal for the invocation; `main` prints it and exits
//! with status 1. Git plumbing keeps using `anyhow` for context chains.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid menu choice '{0}': expected a number from 1 to 5")]
    InvalidMenuChoice(String),

    #[error("invalid interval '{0}': expected a whole number of minutes")]
    InvalidMinutes(String),

    #[error("interval of {minutes} minutes is below the minimum of {min} minutes")]
    IntervalTooShort { minutes: u32, min: u32 },

    #[error(
        "interval of {0} minutes cannot be expressed as a cron schedule \
         (use 30-59 minutes, whole hours dividing 24, or 1440)"
    )]
    UnsupportedInterval(u32),

    #[error("invalid selection '{0}': expected a number")]
    InvalidIndex(String),

    #[error("invalid selection {index}: expected 1 to {count}")]
    InvalidSelection { index: usize, count: usize },

    #[error("directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("log file not found: {0}")]
    MissingLogFile(PathBuf),

    #[error("invalid branch name: {0:?}")]
    InvalidBranchName(String),

    #[error("no schedule entry matches '{0}'")]
    NotFound(String),

    #[error("no repositories are scheduled (run with -c to add one)")]
    NothingScheduled,

    #[error("malformed schedule line: {0}")]
    MalformedEntry(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("schedule table unavailable: {0:#}")]
    ScheduleIo(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
