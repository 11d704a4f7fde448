//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

/// Remote used when neither `--remote` nor `GIT_NARROW_REMOTE` is set.
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch used when the remote's HEAD cannot be detected.
pub const FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Environment variables consumed by the CLI.
pub const ENV_REPO_DIR: &str = "GIT_NARROW_REPO_DIR";
pub const ENV_REMOTE: &str = "GIT_NARROW_REMOTE";
pub const ENV_DEFAULT_BRANCH: &str = "GIT_NARROW_DEFAULT_BRANCH";
pub const ENV_CRONTAB: &str = "GIT_NARROW_CRONTAB";

/// Program managing the schedule table.
pub const DEFAULT_CRONTAB_PROGRAM: &str = "crontab";

/// Default name used when a repository name cannot be determined from its path.
pub const DEFAULT_REPO_NAME: &str = "repository";

/// Marker prefix tagging schedule lines owned by this tool.
pub const SCHEDULE_TAG_MARKER: &str = "# git-narrow-fetch:";

/// Prefix of the divider line written before each logged run.
/// Rotation refuses to touch files that never received one.
pub const LOG_DIVIDER_PREFIX: &str = "===== git-narrow-fetch";

/// A log file is rotated once it grows beyond this many lines.
pub const LOG_MAX_LINES: usize = 5000;

/// Lines kept after rotation.
pub const LOG_RETAIN_LINES: usize = 1000;

/// Lines printed by `-t`.
pub const TAIL_LINES: usize = 100;

/// Smallest custom schedule interval accepted, in minutes.
pub const MIN_CUSTOM_INTERVAL_MINUTES: u32 = 30;

/// Directory under `$HOME` holding default log files.
pub const DEFAULT_LOG_DIR: &str = ".git-narrow-fetch";

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
