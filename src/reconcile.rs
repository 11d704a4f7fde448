//! Branch reconciliation: which remote branches are worth fetching.
//!
//! The result is `(local ∪ {default}) ∩ remote`. Nothing here touches git;
//! callers feed in listings and hand the resulting refspecs to `git fetch`.

use crate::git::validate_branch_name;
use std::collections::BTreeSet;
use std::fmt;

/// Ordered, deduplicated set of branch names.
///
/// Names are case-sensitive. Empty names and names with whitespace are
/// rejected on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSet {
    names: BTreeSet<String>,
}

impl BranchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a name, returning `false` if it was invalid or already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if validate_branch_name(&name).is_err() {
            return false;
        }
        self.names.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BranchSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// One fetchable branch of one remote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteRef {
    pub branch: String,
    pub remote: String,
}

impl RemoteRef {
    /// Forced refspec storing the branch under its tracking name.
    pub fn refspec(&self) -> String {
        format!(
            "+refs/heads/{branch}:refs/remotes/{remote}/{branch}",
            branch = self.branch,
            remote = self.remote
        )
    }

    /// Name of the tracking ref this refspec writes.
    pub fn tracking_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// Computes the refs to fetch: local branches plus `default_branch`,
/// restricted to what the remote actually has.
///
/// A default branch missing from the remote is dropped without error.
pub fn reconcile(
    local: &BranchSet,
    remote_branches: &BranchSet,
    default_branch: &str,
    remote: &str,
) -> Vec<RemoteRef> {
    let mut wanted = local.clone();
    wanted.insert(default_branch);

    wanted
        .iter()
        .filter(|name| remote_branches.contains(name))
        .map(|name| RemoteRef {
            branch: name.to_string(),
            remote: remote.to_string(),
        })
        .collect()
}

/// Refspec strings for a list of refs, in the same order.
pub fn refspecs(refs: &[RemoteRef]) -> Vec<String> {
    refs.iter().map(RemoteRef::refspec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn set(names: &[&str]) -> BranchSet {
        names.iter().copied().collect()
    }

    fn branches(refs: &[RemoteRef]) -> HashSet<String> {
        refs.iter().map(|r| r.branch.clone()).collect()
    }

    fn expected(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_local_branches_present_remotely_are_fetched() {
        let refs = reconcile(
            &set(&["main", "feature-a"]),
            &set(&["main", "feature-a", "feature-b"]),
            "main",
            "origin",
        );
        assert_eq!(branches(&refs), expected(&["main", "feature-a"]));
    }

    #[test]
    fn test_empty_local_list_fetches_only_default() {
        let refs = reconcile(&set(&[]), &set(&["main"]), "main", "origin");
        assert_eq!(branches(&refs), expected(&["main"]));
    }

    #[test]
    fn test_default_missing_remotely_is_excluded() {
        let refs = reconcile(&set(&["main"]), &set(&["other"]), "main", "origin");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_local_only_branches_are_never_fetched() {
        let refs = reconcile(
            &set(&["wip", "main"]),
            &set(&["main", "release"]),
            "release",
            "upstream",
        );
        assert_eq!(branches(&refs), expected(&["main", "release"]));
        assert!(refs.iter().all(|r| r.remote == "upstream"));
    }

    #[test]
    fn test_result_matches_set_formula_without_duplicates() {
        let local = set(&["a", "b", "c", "main"]);
        let remote = set(&["b", "c", "d", "main"]);
        let refs = reconcile(&local, &remote, "main", "origin");

        let mut want: HashSet<String> = local.iter().map(str::to_string).collect();
        want.insert("main".to_string());
        let remote_names: HashSet<String> = remote.iter().map(str::to_string).collect();
        let want: HashSet<String> = want.intersection(&remote_names).cloned().collect();

        assert_eq!(branches(&refs), want);
        assert_eq!(refs.len(), want.len());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let local = set(&["main", "x"]);
        let remote = set(&["main", "x", "y"]);
        assert_eq!(
            reconcile(&local, &remote, "main", "origin"),
            reconcile(&local, &remote, "main", "origin")
        );
    }

    #[test]
    fn test_branch_set_collapses_duplicates_and_rejects_whitespace() {
        let names = set(&["main", "main", "Main", "bad name", ""]);
        assert_eq!(names.len(), 2);
        assert!(names.contains("main"));
        assert!(names.contains("Main"));
        assert!(!names.contains("bad name"));
    }

    #[test]
    fn test_refspec_format() {
        let r = RemoteRef {
            branch: "team/feature".to_string(),
            remote: "origin".to_string(),
        };
        assert_eq!(
            r.refspec(),
            "+refs/heads/team/feature:refs/remotes/origin/team/feature"
        );
        assert_eq!(r.tracking_ref(), "refs/remotes/origin/team/feature");
        assert_eq!(r.to_string(), "origin/team/feature");
    }
}
