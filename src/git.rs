//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution, error formatting and parsing of the
//! listings the reconciler consumes.

use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// Callback invoked with the arguments of every git command before it runs.
pub type GitLogger = fn(&[&str]);

pub fn no_op_logger(_args: &[&str]) {}

pub fn verbose_logger(args: &[&str]) {
    eprintln!("  {}", format!("$ git {}", args.join(" ")).dimmed());
}

const HEADS_PREFIX: &str = "refs/heads/";
const SYMREF_PREFIX: &str = "ref: ";

/// Runs git in `repo` and returns trimmed stdout.
pub fn run_git(repo: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .context("Failed to spawn git command")?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

fn run_git_logged(repo: &Path, args: &[&str], log: GitLogger) -> anyhow::Result<String> {
    log(args);
    run_git(repo, args)
}

pub fn validate_branch_name(branch: &str) -> anyhow::Result<()> {
    if branch.is_empty()
        || branch.starts_with('-')
        || branch.contains('\0')
        || branch.chars().any(char::is_whitespace)
    {
        anyhow::bail!("Invalid branch name: {:?}", branch);
    }
    Ok(())
}

fn validate_remote_name(remote: &str) -> anyhow::Result<()> {
    if remote.is_empty()
        || remote.starts_with('-')
        || remote.contains('\0')
        || remote.chars().any(char::is_whitespace)
    {
        anyhow::bail!("Invalid remote name: {:?}", remote);
    }
    Ok(())
}

/// Branch names and symbolic HEAD advertised by a remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteListing {
    pub head: Option<String>,
    pub branches: Vec<String>,
}

/// Parses `git ls-remote --symref` output.
///
/// Only `refs/heads/*` lines become branches; tags, pull refs and the
/// peeled `HEAD` line are ignored. The `ref: refs/heads/<name>\tHEAD` line
/// supplies the default branch.
pub fn parse_ls_remote(output: &str) -> RemoteListing {
    let mut listing = RemoteListing::default();

    for line in output.lines() {
        let Some((left, right)) = line.split_once('\t') else {
            continue;
        };
        let right = right.trim();

        if let Some(target) = left.strip_prefix(SYMREF_PREFIX) {
            if right == "HEAD" {
                listing.head = target.strip_prefix(HEADS_PREFIX).map(str::to_string);
            }
            continue;
        }

        if let Some(name) = right.strip_prefix(HEADS_PREFIX) {
            if !name.is_empty() {
                listing.branches.push(name.to_string());
            }
        }
    }

    listing
}

/// Parses `git for-each-ref --format=%(refname)` output, keeping the names
/// below `prefix` with the prefix removed.
pub fn parse_ref_names(output: &str, prefix: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_work_tree(path: &Path) -> bool {
    run_git(path, &["rev-parse", "--is-inside-work-tree"])
        .map(|output| output == "true")
        .unwrap_or(false)
}

pub fn list_local_branches(repo: &Path, log: GitLogger) -> anyhow::Result<Vec<String>> {
    let output = run_git_logged(
        repo,
        &["for-each-ref", "--format=%(refname)", HEADS_PREFIX],
        log,
    )
    .context("Failed to list local branches")?;
    Ok(parse_ref_names(&output, HEADS_PREFIX))
}

pub fn ls_remote(repo: &Path, remote: &str, log: GitLogger) -> anyhow::Result<RemoteListing> {
    validate_remote_name(remote)?;
    let output = run_git_logged(repo, &["ls-remote", "--symref", remote], log)
        .with_context(|| format!("Failed to list branches of remote '{}'", remote))?;
    Ok(parse_ls_remote(&output))
}

/// Full names of every tracking ref stored for `remote`.
pub fn list_tracking_refs(
    repo: &Path,
    remote: &str,
    log: GitLogger,
) -> anyhow::Result<Vec<String>> {
    validate_remote_name(remote)?;
    let prefix = format!("refs/remotes/{}/", remote);
    let output = run_git_logged(
        repo,
        &["for-each-ref", "--format=%(refname)", prefix.as_str()],
        log,
    )
    .with_context(|| format!("Failed to list tracking refs of '{}'", remote))?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn delete_ref(repo: &Path, refname: &str, log: GitLogger) -> anyhow::Result<()> {
    run_git_logged(repo, &["update-ref", "--no-deref", "-d", refname], log)
        .with_context(|| format!("Failed to delete ref '{}'", refname))?;
    Ok(())
}

pub fn fetch_refspecs(
    repo: &Path,
    remote: &str,
    refspecs: &[String],
    log: GitLogger,
) -> anyhow::Result<String> {
    validate_remote_name(remote)?;
    let mut args = vec!["fetch", "--no-tags", remote];
    args.extend(refspecs.iter().map(String::as_str));
    run_git_logged(repo, &args, log)
        .with_context(|| format!("Failed to fetch from remote '{}'", remote))
}
