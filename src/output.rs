//! Spinner, colored output, and summary formatting.
//!
//! Output goes either to the terminal or, under `-l`, to the log file. In the
//! latter case colors are switched off and no spinner is drawn.

use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::repo::{DefaultBranch, FetchOutcome, FetchStep};
use crate::schedule::ScheduleEntry;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Destination for run output.
pub struct Reporter {
    config: Config,
    log: Option<File>,
    /// First failed write to the log; reported by [`Reporter::finish`].
    write_error: Option<io::Error>,
}

impl Reporter {
    pub fn terminal(config: Config) -> Self {
        Self {
            config,
            log: None,
            write_error: None,
        }
    }

    /// Sends all output to `file`, without colors.
    pub fn to_log(config: Config, file: File) -> Self {
        colored::control::set_override(false);
        Self {
            config,
            log: Some(file),
            write_error: None,
        }
    }

    /// Flushes the log and surfaces any write that failed along the way.
    pub fn finish(mut self) -> anyhow::Result<()> {
        if let Some(file) = &mut self.log {
            if let Err(err) = file.flush() {
                self.write_error.get_or_insert(err);
            }
        }
        match self.write_error {
            Some(err) => Err(err).context("Failed to write log file"),
            None => Ok(()),
        }
    }

    fn write_log(&mut self, text: &str) {
        if let Some(file) = &mut self.log {
            if let Err(err) = writeln!(file, "{}", text) {
                self.write_error.get_or_insert(err);
            }
        }
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Writes a line to stdout or the log. Suppressed in quiet mode.
    pub fn line(&mut self, message: &str) {
        if self.config.is_quiet() {
            return;
        }
        self.raw_line(message);
    }

    fn raw_line(&mut self, message: &str) {
        if self.is_logging() {
            self.write_log(message);
        } else {
            println!("{}", message);
        }
    }

    /// Warnings are shown even in quiet mode.
    pub fn warn(&mut self, message: &str) {
        let text = format!("{} {}", "warning:".yellow().bold(), message);
        self.always(&text);
    }

    /// Errors are shown even in quiet mode.
    pub fn error(&mut self, message: &str) {
        let text = format!("{} {}", "error:".red().bold(), message);
        self.always(&text);
    }

    fn always(&mut self, text: &str) {
        if self.is_logging() {
            self.write_log(text);
        } else {
            eprintln!("{}", text);
        }
    }

    pub fn step(&mut self, step: &FetchStep) {
        if !self.config.is_verbose() {
            return;
        }
        let text = format!("  {}...", step.to_string().dimmed());
        self.raw_line(&text);
    }
}

/// Spinner shown while fetching in a terminal.
/// Uses `Option` to avoid allocation when progress is hidden.
pub struct FetchProgress {
    spinner: Option<ProgressBar>,
}

impl FetchProgress {
    pub fn update(&self, step: &FetchStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{}...", step));
        }
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}

/// Creates the fetch spinner. Hidden in quiet or verbose mode and when logging to a file.
#[must_use]
pub fn create_fetch_progress(reporter: &Reporter) -> FetchProgress {
    let config = reporter.config();
    let spinner = if config.is_quiet() || config.is_verbose() || reporter.is_logging() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(spinner)
    };

    FetchProgress { spinner }
}

pub fn print_working_dir(reporter: &mut Reporter, path: &Path, remote: &str) {
    let text = format!(
        "{} {} {}",
        "Narrowing fetch in:".cyan(),
        path.display().to_string().white().bold(),
        format!("({})", remote).dimmed()
    );
    reporter.line(&text);
}

fn describe_default(branch: &DefaultBranch) -> String {
    match branch {
        DefaultBranch::Configured(name) => format!("{} (configured)", name),
        DefaultBranch::Detected(name) => format!("{} (remote HEAD)", name),
        DefaultBranch::Fallback(name) => format!("{} (fallback)", name),
    }
}

/// Prints what a narrowed fetch did.
pub fn print_fetch_summary(reporter: &mut Reporter, outcome: &FetchOutcome) {
    if let DefaultBranch::Fallback(name) = &outcome.default_branch {
        reporter.warn(&format!(
            "could not detect the remote's default branch, using '{}'",
            name
        ));
    }

    reporter.line(&format!(
        "{} {}",
        "Default branch:".cyan(),
        describe_default(&outcome.default_branch)
    ));

    if outcome.reset_refs > 0 {
        reporter.line(&format!(
            "{}",
            format!("Deleted {} tracking refs", outcome.reset_refs).yellow()
        ));
    }

    if outcome.fetched.is_empty() {
        reporter.line(&format!(
            "{}",
            "No local branches exist on the remote; nothing fetched".yellow().bold()
        ));
        return;
    }

    if !outcome.git_output.is_empty() {
        for line in outcome.git_output.lines() {
            reporter.line(&format!("  {}", line.dimmed()));
        }
    }

    for remote_ref in &outcome.fetched {
        reporter.line(&format!("  {} {}", "OK".green().bold(), remote_ref));
    }
    reporter.line(&format!(
        "{}: {} branches fetched",
        "Total".white().bold(),
        outcome.fetched.len()
    ));
}

pub fn print_schedule_saved(entry: &ScheduleEntry) {
    println!(
        "{} {} {}",
        "✓".green(),
        "Scheduled".white().bold(),
        entry.repo_tag.cyan()
    );
    println!("  {} {}", "schedule:".dimmed(), entry.cron_expression);
    println!("  {} {}", "log:".dimmed(), entry.log_path);
}

pub fn print_schedule_removed(repo_tag: &str, removed: bool) {
    if removed {
        println!("{} Removed schedule for {}", "✓".green(), repo_tag.cyan());
    } else {
        println!("{}", format!("No schedule found for {}", repo_tag).yellow());
    }
}

/// Menu labels for picking one of several entries.
pub fn format_entry_choices(entries: &[ScheduleEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format!("{} ({})", entry.repo_tag, entry.log_path))
        .collect()
}

pub fn print_tail(entry: &ScheduleEntry, lines: &[String]) {
    println!(
        "{} {}",
        "==>".cyan(),
        entry.log_path.to_string().white().bold()
    );
    for line in lines {
        println!("{}", line);
    }
}
