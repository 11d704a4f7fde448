use clap::Parser;
use colored::Colorize;
use git_narrow_fetch::config::{Config, FetchOptions, Verbosity};
use git_narrow_fetch::constants::{
    DEFAULT_REMOTE, ENV_DEFAULT_BRANCH, ENV_REMOTE, ENV_REPO_DIR, LOG_MAX_LINES,
    LOG_RETAIN_LINES, TAIL_LINES,
};
use git_narrow_fetch::output::{self, Reporter};
use git_narrow_fetch::schedule::{self, CrontabStore, ScheduleManager};
use git_narrow_fetch::{logfile, repo, setup};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Fetch only the remote branches you have checked out, plus the default branch.
#[derive(Parser, Debug)]
#[command(name = "git-narrow-fetch", version)]
struct Cli {
    /// Delete all tracking refs of the remote before fetching
    #[arg(short = 'r', long = "reset")]
    reset: bool,

    /// Append output to this file, rotating it when it grows too long
    #[arg(short = 'l', long = "log", value_name = "PATH")]
    log: Option<PathBuf>,

    /// Show the last lines of a scheduled repository's log
    #[arg(short = 't', long = "tail", conflicts_with_all = ["configure", "remove"])]
    tail: bool,

    /// Interactively schedule periodic narrowed fetches in crontab
    #[arg(short = 'c', long = "configure", conflicts_with = "remove")]
    configure: bool,

    /// Remove the scheduled fetch for the repository
    #[arg(long)]
    remove: bool,

    /// Repository directory (default: current directory)
    #[arg(long = "repo", env = ENV_REPO_DIR, value_name = "DIR")]
    repo_dir: Option<PathBuf>,

    /// Remote to fetch from
    #[arg(long, env = ENV_REMOTE, default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Default branch (default: detected from the remote's HEAD)
    #[arg(long = "default-branch", env = ENV_DEFAULT_BRANCH, value_name = "BRANCH")]
    default_branch: Option<String>,

    /// Print each git command
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Config { verbosity }
    }

    fn repo_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.repo_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn fetch_options(&self) -> anyhow::Result<FetchOptions> {
        Ok(FetchOptions {
            repo_dir: self.repo_dir()?,
            remote: self.remote.clone(),
            default_branch: self.default_branch.clone(),
            reset: self.reset,
        })
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config();

    if cli.tail {
        return run_tail();
    }
    if cli.configure {
        return run_configure(cli, &config);
    }
    if cli.remove {
        return run_remove(cli);
    }
    run_fetch(cli.log.as_deref(), cli.fetch_options()?, config)
}

fn run_fetch(log: Option<&Path>, options: FetchOptions, config: Config) -> anyhow::Result<()> {
    let mut reporter = match log {
        Some(path) => {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let file = logfile::start_run(path, &timestamp, LOG_MAX_LINES, LOG_RETAIN_LINES)?;
            Reporter::to_log(config, file)
        }
        None => Reporter::terminal(config),
    };

    output::print_working_dir(&mut reporter, &options.repo_dir, &options.remote);

    let progress = output::create_fetch_progress(&reporter);
    let result = repo::narrow_fetch(&options, &config, |step| {
        progress.update(step);
        reporter.step(step);
    });
    progress.finish();

    match result {
        Ok(outcome) => {
            output::print_fetch_summary(&mut reporter, &outcome);
            reporter.finish()
        }
        Err(err) => {
            if reporter.is_logging() {
                reporter.error(&format!("{:#}", err));
            }
            if let Err(log_err) = reporter.finish() {
                eprintln!("{} {:#}", "error:".red().bold(), log_err);
            }
            Err(err)
        }
    }
}

fn run_tail() -> anyhow::Result<()> {
    let manager = ScheduleManager::new(CrontabStore::from_env());
    let entry = manager.resolve_single("", setup::prompt_entry_index)?;
    let lines = logfile::tail(Path::new(&entry.log_path), TAIL_LINES)?;
    output::print_tail(&entry, &lines);
    Ok(())
}

fn run_configure(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let answers = setup::prompt_answers(&cli.repo_dir()?, &cli.remote, config.git_logger())?;
    let command = std::env::current_exe()?;
    let entry = setup::build_entry(&answers, &command)?;

    let mut manager = ScheduleManager::new(CrontabStore::from_env());
    manager.upsert(&entry)?;
    output::print_schedule_saved(&entry);
    Ok(())
}

fn run_remove(cli: &Cli) -> anyhow::Result<()> {
    let dir = cli.repo_dir()?;
    let tag = schedule::repo_tag(&std::fs::canonicalize(&dir).unwrap_or(dir));
    let mut manager = ScheduleManager::new(CrontabStore::from_env());
    let removed = manager.remove(&tag)?;
    output::print_schedule_removed(&tag, removed);
    Ok(())
}
