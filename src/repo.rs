// Repository validation, the narrowed fetch itself, result types

use crate::config::{Config, FetchOptions};
use crate::constants::FALLBACK_DEFAULT_BRANCH;
use crate::error::Error;
use crate::git;
use crate::reconcile::{self, BranchSet, RemoteRef};
use anyhow::Context;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStep {
    Started,
    ListingLocal,
    ListingRemote,
    Reconciling,
    ResettingRefs,
    Fetching { count: usize },
    Completed,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStep::Started => write!(f, "Starting"),
            FetchStep::ListingLocal => write!(f, "Listing local branches"),
            FetchStep::ListingRemote => write!(f, "Listing remote branches"),
            FetchStep::Reconciling => write!(f, "Selecting branches to fetch"),
            FetchStep::ResettingRefs => write!(f, "Resetting tracking refs"),
            FetchStep::Fetching { count } => write!(f, "Fetching {} branches", count),
            FetchStep::Completed => write!(f, "Completed"),
        }
    }
}

/// Where the default branch name came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultBranch {
    Configured(String),
    Detected(String),
    /// Detection failed; carries the fallback name.
    Fallback(String),
}

impl DefaultBranch {
    pub fn name(&self) -> &str {
        match self {
            DefaultBranch::Configured(name)
            | DefaultBranch::Detected(name)
            | DefaultBranch::Fallback(name) => name,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub default_branch: DefaultBranch,
    pub fetched: Vec<RemoteRef>,
    /// Tracking refs deleted by `-r`.
    pub reset_refs: usize,
    /// Trimmed output of `git fetch`, empty when nothing was fetched.
    pub git_output: String,
}

/// Fails unless `path` is an existing directory inside a git work tree.
pub fn ensure_repository(path: &Path) -> Result<(), Error> {
    if !path.is_dir() {
        return Err(Error::MissingDirectory(path.to_path_buf()));
    }
    if !git::is_work_tree(path) {
        return Err(Error::NotARepository(path.to_path_buf()));
    }
    Ok(())
}

/// Picks the default branch: explicit setting, then the remote's HEAD, then the fallback.
pub fn resolve_default_branch(
    configured: Option<&str>,
    advertised_head: Option<&str>,
) -> DefaultBranch {
    if let Some(name) = configured.filter(|name| !name.trim().is_empty()) {
        return DefaultBranch::Configured(name.trim().to_string());
    }
    match advertised_head {
        Some(head) => DefaultBranch::Detected(head.to_string()),
        None => DefaultBranch::Fallback(FALLBACK_DEFAULT_BRANCH.to_string()),
    }
}

/// Fetches only the remote branches that exist locally, plus the default branch.
pub fn narrow_fetch<F>(
    options: &FetchOptions,
    config: &Config,
    mut on_step: F,
) -> anyhow::Result<FetchOutcome>
where
    F: FnMut(&FetchStep),
{
    let path = options.repo_dir.as_path();
    let remote = options.remote.as_str();
    let log = config.git_logger();

    ensure_repository(path)?;
    let configured = options
        .default_branch
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = configured {
        if git::validate_branch_name(name).is_err() {
            return Err(Error::InvalidBranchName(name.to_string()).into());
        }
    }
    on_step(&FetchStep::Started);

    on_step(&FetchStep::ListingLocal);
    let local: BranchSet = git::list_local_branches(path, log)?.into_iter().collect();

    on_step(&FetchStep::ListingRemote);
    let listing = git::ls_remote(path, remote, log)?;
    let remote_branches: BranchSet = listing.branches.iter().map(String::as_str).collect();

    on_step(&FetchStep::Reconciling);
    let default_branch = resolve_default_branch(configured, listing.head.as_deref());
    let fetched = reconcile::reconcile(&local, &remote_branches, default_branch.name(), remote);

    // Nothing is deleted until the remote has answered.
    let mut reset_refs = 0;
    if options.reset {
        on_step(&FetchStep::ResettingRefs);
        for refname in git::list_tracking_refs(path, remote, log)? {
            git::delete_ref(path, &refname, log)?;
            reset_refs += 1;
        }
    }

    let git_output = if fetched.is_empty() {
        String::new()
    } else {
        on_step(&FetchStep::Fetching {
            count: fetched.len(),
        });
        let refspecs = reconcile::refspecs(&fetched);
        git::fetch_refspecs(path, remote, &refspecs, log)
            .with_context(|| format!("Fetching {} refs failed", refspecs.len()))?
    };

    on_step(&FetchStep::Completed);

    Ok(FetchOutcome {
        default_branch,
        fetched,
        reset_refs,
        git_output,
    })
}
