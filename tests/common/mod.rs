//! Test infrastructure for git-narrow-fetch integration tests.

#![allow(dead_code)]

use anyhow::Result;
use git_narrow_fetch::config::{Config, FetchOptions};
use git_narrow_fetch::git::run_git;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn test_config() -> Config {
    Config::default()
}

/// A temporary git repository for testing.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    remote: Option<TempDir>,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on `main`.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("work");
        std::fs::create_dir(&path)?;

        run_git(&path, &["init", "-b", "main"])?;
        run_git(&path, &["config", "user.email", "test@example.com"])?;
        run_git(&path, &["config", "user.name", "Test User"])?;

        std::fs::write(path.join("README.md"), "# Test Repo\n")?;
        run_git(&path, &["add", "README.md"])?;
        run_git(&path, &["commit", "-m", "Initial commit"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            remote: None,
        })
    }

    /// Creates a test repository whose bare `origin` has `main` plus
    /// `remote_branches`, none of which exist locally.
    pub fn with_remote(remote_branches: &[&str]) -> Result<Self> {
        let remote_dir = TempDir::new()?;
        run_git(remote_dir.path(), &["init", "--bare", "-b", "main"])?;

        let mut local = Self::new()?;
        let remote_path = remote_dir.path().to_string_lossy().into_owned();
        run_git(&local.path, &["remote", "add", "origin", remote_path.as_str()])?;
        run_git(&local.path, &["push", "-u", "origin", "main"])?;

        for branch in remote_branches {
            let target = format!("main:refs/heads/{}", branch);
            run_git(&local.path, &["push", "origin", target.as_str()])?;
        }

        local.remote = Some(remote_dir);
        Ok(local)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_path(&self) -> Option<&Path> {
        self.remote.as_ref().map(|dir| dir.path())
    }

    pub fn options(&self) -> FetchOptions {
        FetchOptions::new(&self.path)
    }

    pub fn create_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["branch", name])?;
        Ok(())
    }

    /// Short names of every tracking ref under `refs/remotes/origin/`.
    pub fn tracking_branches(&self) -> Result<Vec<String>> {
        let output = run_git(
            &self.path,
            &["for-each-ref", "--format=%(refname)", "refs/remotes/origin/"],
        )?;
        Ok(output
            .lines()
            .filter_map(|line| line.strip_prefix("refs/remotes/origin/"))
            .map(str::to_string)
            .collect())
    }

    /// Removes every tracking ref so a test starts from a clean slate.
    pub fn clear_tracking_refs(&self) -> Result<()> {
        for branch in self.tracking_branches()? {
            let refname = format!("refs/remotes/origin/{}", branch);
            run_git(
                &self.path,
                &["update-ref", "--no-deref", "-d", refname.as_str()],
            )?;
        }
        Ok(())
    }
}
