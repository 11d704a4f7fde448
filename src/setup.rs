//! Interactive schedule setup (`-c`) and entry selection (`-t`).
//!
//! Prompt I/O lives in the `prompt_*` functions; everything they feed into
//! (`build_entry`, `parse_index`, the frequency mapping) is plain logic.

use crate::constants::{
    DEFAULT_LOG_DIR, ENV_DEFAULT_BRANCH, ENV_REMOTE, ENV_REPO_DIR, FALLBACK_DEFAULT_BRANCH,
};
use crate::error::{Error, Result};
use crate::frequency::{self, Frequency, MenuChoice, PRESETS};
use crate::git::{self, GitLogger};
use crate::output;
use crate::repo;
use crate::schedule::{ScheduleEntry, repo_tag};
use colored::Colorize;
use dialoguer::Input;
use std::path::{Path, PathBuf};

/// Everything the user answers during `-c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupAnswers {
    pub repo_dir: PathBuf,
    pub remote: String,
    pub default_branch: String,
    pub frequency: Frequency,
    pub log_path: PathBuf,
}

/// Default log location: `~/.git-narrow-fetch/<tag>.log`.
pub fn default_log_path(tag: &str) -> PathBuf {
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_LOG_DIR)
        .join(format!("{}.log", tag))
}

/// Turns setup answers into the schedule line for `command`.
pub fn build_entry(answers: &SetupAnswers, command: &Path) -> Result<ScheduleEntry> {
    repo::ensure_repository(&answers.repo_dir)?;
    let repo_dir = std::fs::canonicalize(&answers.repo_dir)
        .map_err(|_| Error::MissingDirectory(answers.repo_dir.clone()))?;
    if git::validate_branch_name(&answers.default_branch).is_err() {
        return Err(Error::InvalidBranchName(answers.default_branch.clone()));
    }

    Ok(ScheduleEntry {
        repo_tag: repo_tag(&repo_dir),
        cron_expression: answers.frequency.cron_expression(),
        env_vars: vec![
            (ENV_REPO_DIR.to_string(), repo_dir.display().to_string()),
            (ENV_REMOTE.to_string(), answers.remote.clone()),
            (ENV_DEFAULT_BRANCH.to_string(), answers.default_branch.clone()),
        ],
        command: command.display().to_string(),
        log_path: answers.log_path.display().to_string(),
    })
}

/// Parses a 1-based menu index into a 0-based one.
pub fn parse_index(input: &str, count: usize) -> Result<usize> {
    let index: usize = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidIndex(input.trim().to_string()))?;
    if index == 0 || index > count {
        return Err(Error::InvalidSelection { index, count });
    }
    Ok(index - 1)
}

fn ask(prompt: &str, default: Option<String>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default);
    }
    input
        .interact_text()
        .map(|answer| answer.trim().to_string())
        .map_err(|e| Error::Prompt(e.to_string()))
}

/// Lists `entries` and asks which one to use.
pub fn prompt_entry_index(entries: &[ScheduleEntry]) -> Result<usize> {
    println!("{}", "Several repositories are scheduled:".cyan());
    for (i, label) in output::format_entry_choices(entries).iter().enumerate() {
        println!("  {}) {}", i + 1, label);
    }
    let answer = ask("Select a repository", None)?;
    parse_index(&answer, entries.len())
}

fn prompt_frequency() -> Result<Frequency> {
    println!("{}", "How often should it run?".cyan());
    for (i, preset) in PRESETS.iter().enumerate() {
        println!("  {}) {}", i + 1, preset);
    }
    println!("  {}) custom interval in minutes", frequency::CUSTOM_CHOICE);

    match frequency::parse_choice(&ask("Choice", Some("1".to_string()))?)? {
        MenuChoice::Preset(preset) => Ok(preset),
        MenuChoice::Custom => frequency::parse_minutes(&ask("Minutes between runs", None)?),
    }
}

/// Walks the user through the `-c` questions.
pub fn prompt_answers(
    default_dir: &Path,
    default_remote: &str,
    log: GitLogger,
) -> Result<SetupAnswers> {
    let repo_dir = PathBuf::from(ask(
        "Repository path",
        Some(default_dir.display().to_string()),
    )?);
    repo::ensure_repository(&repo_dir)?;

    let remote = ask("Remote name", Some(default_remote.to_string()))?;

    let detected = git::ls_remote(&repo_dir, &remote, log)
        .ok()
        .and_then(|listing| listing.head);
    let suggested = match detected {
        Some(head) => head,
        None => {
            eprintln!(
                "{} could not detect the default branch of '{}', suggesting '{}'",
                "warning:".yellow().bold(),
                remote,
                FALLBACK_DEFAULT_BRANCH
            );
            FALLBACK_DEFAULT_BRANCH.to_string()
        }
    };
    let default_branch = ask("Default branch", Some(suggested))?;

    let frequency = prompt_frequency()?;

    let tag = repo_tag(&std::fs::canonicalize(&repo_dir).unwrap_or_else(|_| repo_dir.clone()));
    let log_path = PathBuf::from(ask(
        "Log file",
        Some(default_log_path(&tag).display().to_string()),
    )?);

    Ok(SetupAnswers {
        repo_dir,
        remote,
        default_branch,
        frequency,
        log_path,
    })
}
