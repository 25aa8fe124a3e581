//! The boundary between the wizards and git itself.
//!
//! Commands never shell out directly. They enumerate repositories and
//! references through [`GitProvider`] to populate pick steps, and hand the
//! final operation to it once a confirm step has been accepted.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::error::GitResult;
use super::models::{Branch, Commit, Remote, RepoStatus, Repository, Tag, Worktree};
use super::reference::GitReference;

/// Options for [`GitProvider::push_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub force: bool,
    /// Publish the branch to this remote (`--set-upstream`).
    pub publish: Option<String>,
    /// Push only this reference instead of the current branch.
    pub reference: Option<GitReference>,
}

/// Options for [`GitProvider::pull_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub rebase: bool,
}

/// Options for [`GitProvider::switch_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchOptions {
    /// Create this local branch at the reference before switching.
    pub create_branch: Option<String>,
}

/// Options for [`GitProvider::delete_branches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteBranchOptions {
    pub force: bool,
    /// Also delete the upstream branch on its remote.
    pub remote: bool,
}

/// Options for [`GitProvider::cherry_pick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CherryPickOptions {
    pub edit: bool,
    pub no_commit: bool,
}

/// Options for [`GitProvider::create_worktree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeCreateOptions {
    pub commitish: Option<String>,
    /// `-b <name>`
    pub create_branch: Option<String>,
    pub detach: bool,
    pub force: bool,
}

/// Options for [`GitProvider::delete_worktree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorktreeDeleteOptions {
    pub force: bool,
}

/// Repository enumeration plus the operations commands execute.
pub trait GitProvider {
    /// Repositories the wizards may act on.
    fn open_repositories(&self) -> Vec<Repository>;

    /// The main repository that owns a (possibly linked) working tree.
    fn common_repository(&self, repo: &Repository) -> GitResult<Option<Repository>>;

    /// A branch by name, or the current branch when `name` is `None`.
    fn branch(&self, repo: &Repository, name: Option<&str>) -> GitResult<Option<Branch>>;

    /// Local branches followed by remote-tracking branches.
    fn branches(&self, repo: &Repository) -> GitResult<Vec<Branch>>;

    fn tags(&self, repo: &Repository) -> GitResult<Vec<Tag>>;

    fn remotes(&self, repo: &Repository) -> GitResult<Vec<Remote>>;

    fn status(&self, repo: &Repository) -> GitResult<Option<RepoStatus>>;

    /// When the repository was last fetched.
    fn last_fetched(&self, repo: &Repository) -> GitResult<Option<DateTime<Utc>>>;

    /// Commits in `range`, newest first.
    fn log(&self, repo: &Repository, range: &str, limit: usize) -> GitResult<Vec<Commit>>;

    /// Local and remote branches containing `sha`.
    fn commit_branches(&self, repo: &Repository, sha: &str) -> GitResult<Vec<String>>;

    /// Resolve free text (a sha or rev expression) to a commit.
    fn resolve_revision(&self, repo: &Repository, text: &str) -> GitResult<Option<Commit>>;

    fn worktrees(&self, repo: &Repository) -> GitResult<Vec<Worktree>>;

    /// Whether the working tree at `path` has uncommitted changes.
    fn has_changes(&self, path: &Path) -> GitResult<bool>;

    /// Uncommitted changes of the working tree at `path` as a binary patch
    /// against `HEAD`; with `staged`, only what is in the index. Empty when
    /// there is nothing to copy.
    fn diff(&self, path: &Path, staged: bool) -> GitResult<String>;

    /// `git check-ref-format --branch`
    fn validate_branch_name(&self, repo: &Repository, name: &str) -> GitResult<bool>;

    /// Whether the installed git understands `--force-if-includes`.
    fn supports_force_if_includes(&self, repo: &Repository) -> bool;

    fn fetch(&self, repo: &Repository) -> GitResult<()>;

    /// Fetch a single branch; with `pull` the local branch is updated too.
    fn fetch_branch(&self, repo: &Repository, branch: &GitReference, pull: bool)
        -> GitResult<()>;

    fn push_all(&self, repos: &[Repository], options: &PushOptions) -> GitResult<()>;

    fn pull_all(&self, repos: &[Repository], options: &PullOptions) -> GitResult<()>;

    fn switch_to(
        &self,
        repos: &[Repository],
        reference: &GitReference,
        options: &SwitchOptions,
    ) -> GitResult<()>;

    /// `git merge --ff-only <reference>`
    fn merge_fast_forward(&self, repo: &Repository, reference: &GitReference) -> GitResult<()>;

    fn create_branch(
        &self,
        repo: &Repository,
        name: &str,
        start_point: &GitReference,
    ) -> GitResult<()>;

    fn rename_branch(&self, repo: &Repository, from: &str, to: &str) -> GitResult<()>;

    fn delete_branches(
        &self,
        repo: &Repository,
        references: &[GitReference],
        options: &DeleteBranchOptions,
    ) -> GitResult<()>;

    /// Apply `shas` in the given order.
    fn cherry_pick(
        &self,
        repo: &Repository,
        shas: &[String],
        options: &CherryPickOptions,
    ) -> GitResult<()>;

    fn create_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeCreateOptions,
    ) -> GitResult<Worktree>;

    fn delete_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeDeleteOptions,
    ) -> GitResult<()>;

    /// Apply `patch` to the working tree at `path`, falling back to a
    /// three-way merge.
    fn apply_patch(&self, path: &Path, patch: &str) -> GitResult<()>;
}
