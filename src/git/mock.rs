//! In-memory git provider for testing.
//!
//! `MockGit` answers queries from data configured up front and records every
//! operation it is asked to perform, so tests can assert on exactly what a
//! wizard executed.
//!
//! # Example
//!
//! ```
//! use gitstep::git::{Branch, GitProvider, MockGit, Repository, Upstream};
//!
//! let git = MockGit::new()
//!     .with_repo("/work/app")
//!     .with_branch(Branch::local("/work/app", "main").as_current());
//!
//! let repo = Repository::new("/work/app");
//! let current = git.branch(&repo, None).unwrap();
//! assert_eq!(current.map(|b| b.name), Some("main".to_string()));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::error::{GitError, GitResult};
use super::models::{Branch, Commit, Remote, RepoStatus, Repository, Tag, Worktree};
use super::provider::{
    CherryPickOptions, DeleteBranchOptions, GitProvider, PullOptions, PushOptions,
    SwitchOptions, WorktreeCreateOptions, WorktreeDeleteOptions,
};
use super::reference::GitReference;

/// An operation recorded by [`MockGit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Fetch {
        repo: PathBuf,
    },
    FetchBranch {
        repo: PathBuf,
        branch: String,
        pull: bool,
    },
    Push {
        repos: Vec<PathBuf>,
        options: PushOptions,
    },
    Pull {
        repos: Vec<PathBuf>,
        options: PullOptions,
    },
    Switch {
        repos: Vec<PathBuf>,
        reference: String,
        options: SwitchOptions,
    },
    MergeFastForward {
        repo: PathBuf,
        reference: String,
    },
    CreateBranch {
        repo: PathBuf,
        name: String,
        start_point: String,
    },
    RenameBranch {
        repo: PathBuf,
        from: String,
        to: String,
    },
    DeleteBranches {
        repo: PathBuf,
        names: Vec<String>,
        options: DeleteBranchOptions,
    },
    CherryPick {
        repo: PathBuf,
        shas: Vec<String>,
        options: CherryPickOptions,
    },
    CreateWorktree {
        repo: PathBuf,
        path: PathBuf,
        options: WorktreeCreateOptions,
    },
    DeleteWorktree {
        repo: PathBuf,
        path: PathBuf,
        options: WorktreeDeleteOptions,
    },
    ApplyPatch {
        path: PathBuf,
        patch: String,
    },
}

/// Scriptable in-memory [`GitProvider`].
#[derive(Debug, Default)]
pub struct MockGit {
    repos: Vec<Repository>,
    common: HashMap<PathBuf, Repository>,
    branches: RefCell<HashMap<PathBuf, Vec<Branch>>>,
    tags: HashMap<PathBuf, Vec<Tag>>,
    remotes: HashMap<PathBuf, Vec<Remote>>,
    statuses: RefCell<HashMap<PathBuf, RepoStatus>>,
    statuses_after_fetch: RefCell<HashMap<PathBuf, RepoStatus>>,
    logs: HashMap<PathBuf, Vec<Commit>>,
    worktrees: RefCell<HashMap<PathBuf, Vec<Worktree>>>,
    dirty: HashSet<PathBuf>,
    patches: HashMap<(PathBuf, bool), String>,
    last_fetched: Option<DateTime<Utc>>,
    force_if_includes: bool,
    worktree_create_failures: RefCell<VecDeque<GitError>>,
    worktree_delete_failures: RefCell<VecDeque<GitError>>,
    operation_failures: RefCell<VecDeque<GitError>>,
    calls: RefCell<Vec<GitCall>>,
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open repository.
    pub fn with_repo(mut self, path: impl Into<PathBuf>) -> Self {
        self.repos.push(Repository::new(path));
        self
    }

    /// Report `main` as the common repository of `linked`.
    pub fn with_common_repo(mut self, linked: impl Into<PathBuf>, main: Repository) -> Self {
        self.common.insert(linked.into(), main);
        self
    }

    pub fn with_branch(self, branch: Branch) -> Self {
        self.branches
            .borrow_mut()
            .entry(branch.repo_path.clone())
            .or_default()
            .push(branch);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.entry(tag.repo_path.clone()).or_default().push(tag);
        self
    }

    pub fn with_remote(mut self, repo: impl Into<PathBuf>, remote: Remote) -> Self {
        self.remotes.entry(repo.into()).or_default().push(remote);
        self
    }

    pub fn with_status(self, repo: impl Into<PathBuf>, status: RepoStatus) -> Self {
        self.statuses.borrow_mut().insert(repo.into(), status);
        self
    }

    /// Replace the repository status once [`GitProvider::fetch`] runs.
    pub fn with_status_after_fetch(self, repo: impl Into<PathBuf>, status: RepoStatus) -> Self {
        self.statuses_after_fetch
            .borrow_mut()
            .insert(repo.into(), status);
        self
    }

    /// Commits returned by every log query for the repository, newest first.
    pub fn with_log(mut self, repo: impl Into<PathBuf>, commits: Vec<Commit>) -> Self {
        self.logs.insert(repo.into(), commits);
        self
    }

    pub fn with_worktree(self, worktree: Worktree) -> Self {
        self.worktrees
            .borrow_mut()
            .entry(worktree.repo_path.clone())
            .or_default()
            .push(worktree);
        self
    }

    /// Mark a working tree as having uncommitted changes.
    pub fn with_changes(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirty.insert(path.into());
        self
    }

    /// The patch `diff` returns for a working tree; `staged` selects the
    /// index-only variant.
    pub fn with_patch(
        mut self,
        path: impl Into<PathBuf>,
        staged: bool,
        patch: impl Into<String>,
    ) -> Self {
        self.patches.insert((path.into(), staged), patch.into());
        self
    }

    pub fn with_last_fetched(mut self, at: DateTime<Utc>) -> Self {
        self.last_fetched = Some(at);
        self
    }

    pub fn with_force_if_includes(mut self, supported: bool) -> Self {
        self.force_if_includes = supported;
        self
    }

    /// Fail the next worktree creation with `error`.
    pub fn fail_next_worktree_create(self, error: GitError) -> Self {
        self.worktree_create_failures.borrow_mut().push_back(error);
        self
    }

    /// Fail the next worktree deletion with `error`.
    pub fn fail_next_worktree_delete(self, error: GitError) -> Self {
        self.worktree_delete_failures.borrow_mut().push_back(error);
        self
    }

    /// Fail the next push, pull, switch, branch, cherry-pick or apply
    /// operation.
    pub fn fail_next_operation(self, error: GitError) -> Self {
        self.operation_failures.borrow_mut().push_back(error);
        self
    }

    /// Every operation performed so far, in order.
    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: GitCall) -> GitResult<()> {
        tracing::debug!("MockGit: {:?}", call);
        self.calls.borrow_mut().push(call);
        match self.operation_failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn paths(repos: &[Repository]) -> Vec<PathBuf> {
    repos.iter().map(|r| r.path.clone()).collect()
}

impl GitProvider for MockGit {
    fn open_repositories(&self) -> Vec<Repository> {
        self.repos.clone()
    }

    fn common_repository(&self, repo: &Repository) -> GitResult<Option<Repository>> {
        Ok(self.common.get(&repo.path).cloned())
    }

    fn branch(&self, repo: &Repository, name: Option<&str>) -> GitResult<Option<Branch>> {
        let branches = self.branches(repo)?;
        Ok(match name {
            Some(name) => branches.into_iter().find(|b| b.name == name),
            None => branches.into_iter().find(|b| b.current),
        })
    }

    fn branches(&self, repo: &Repository) -> GitResult<Vec<Branch>> {
        let mut branches = self
            .branches
            .borrow()
            .get(&repo.path)
            .cloned()
            .unwrap_or_default();
        branches.sort_by_key(|b| b.remote);
        Ok(branches)
    }

    fn tags(&self, repo: &Repository) -> GitResult<Vec<Tag>> {
        Ok(self.tags.get(&repo.path).cloned().unwrap_or_default())
    }

    fn remotes(&self, repo: &Repository) -> GitResult<Vec<Remote>> {
        Ok(self.remotes.get(&repo.path).cloned().unwrap_or_default())
    }

    fn status(&self, repo: &Repository) -> GitResult<Option<RepoStatus>> {
        if let Some(status) = self.statuses.borrow().get(&repo.path) {
            return Ok(Some(status.clone()));
        }
        let current = self.branch(repo, None)?;
        Ok(current.map(|b| RepoStatus {
            branch: Some(b.name),
            upstream: b.upstream,
            state: b.state,
            has_changes: self.dirty.contains(&repo.path),
        }))
    }

    fn last_fetched(&self, _repo: &Repository) -> GitResult<Option<DateTime<Utc>>> {
        Ok(self.last_fetched)
    }

    fn log(&self, repo: &Repository, _range: &str, limit: usize) -> GitResult<Vec<Commit>> {
        Ok(self
            .logs
            .get(&repo.path)
            .map(|commits| commits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn commit_branches(&self, repo: &Repository, sha: &str) -> GitResult<Vec<String>> {
        Ok(self
            .branches
            .borrow()
            .get(&repo.path)
            .map(|branches| {
                branches
                    .iter()
                    .filter(|b| b.sha.as_deref() == Some(sha))
                    .map(|b| b.name.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn resolve_revision(&self, repo: &Repository, text: &str) -> GitResult<Option<Commit>> {
        let text = text.trim();
        Ok(self
            .logs
            .get(&repo.path)
            .and_then(|commits| commits.iter().find(|c| c.sha.starts_with(text)))
            .cloned())
    }

    fn worktrees(&self, repo: &Repository) -> GitResult<Vec<Worktree>> {
        Ok(self
            .worktrees
            .borrow()
            .get(&repo.path)
            .cloned()
            .unwrap_or_default())
    }

    fn has_changes(&self, path: &Path) -> GitResult<bool> {
        Ok(self.dirty.contains(path))
    }

    fn diff(&self, path: &Path, staged: bool) -> GitResult<String> {
        Ok(self
            .patches
            .get(&(path.to_path_buf(), staged))
            .cloned()
            .unwrap_or_default())
    }

    fn validate_branch_name(&self, _repo: &Repository, name: &str) -> GitResult<bool> {
        let invalid = name.is_empty()
            || name.contains(char::is_whitespace)
            || name.contains("..")
            || name.starts_with('-')
            || name.ends_with('/')
            || name.ends_with(".lock");
        Ok(!invalid)
    }

    fn supports_force_if_includes(&self, _repo: &Repository) -> bool {
        self.force_if_includes
    }

    fn fetch(&self, repo: &Repository) -> GitResult<()> {
        self.calls.borrow_mut().push(GitCall::Fetch {
            repo: repo.path.clone(),
        });
        if let Some(status) = self.statuses_after_fetch.borrow_mut().remove(&repo.path) {
            self.statuses.borrow_mut().insert(repo.path.clone(), status);
        }
        Ok(())
    }

    fn fetch_branch(
        &self,
        repo: &Repository,
        branch: &GitReference,
        pull: bool,
    ) -> GitResult<()> {
        self.record(GitCall::FetchBranch {
            repo: repo.path.clone(),
            branch: branch.ref_name().to_string(),
            pull,
        })
    }

    fn push_all(&self, repos: &[Repository], options: &PushOptions) -> GitResult<()> {
        self.record(GitCall::Push {
            repos: paths(repos),
            options: options.clone(),
        })
    }

    fn pull_all(&self, repos: &[Repository], options: &PullOptions) -> GitResult<()> {
        self.record(GitCall::Pull {
            repos: paths(repos),
            options: *options,
        })
    }

    fn switch_to(
        &self,
        repos: &[Repository],
        reference: &GitReference,
        options: &SwitchOptions,
    ) -> GitResult<()> {
        self.record(GitCall::Switch {
            repos: paths(repos),
            reference: reference.ref_name().to_string(),
            options: options.clone(),
        })
    }

    fn merge_fast_forward(&self, repo: &Repository, reference: &GitReference) -> GitResult<()> {
        self.record(GitCall::MergeFastForward {
            repo: repo.path.clone(),
            reference: reference.ref_name().to_string(),
        })
    }

    fn create_branch(
        &self,
        repo: &Repository,
        name: &str,
        start_point: &GitReference,
    ) -> GitResult<()> {
        self.record(GitCall::CreateBranch {
            repo: repo.path.clone(),
            name: name.to_string(),
            start_point: start_point.ref_name().to_string(),
        })?;
        self.branches
            .borrow_mut()
            .entry(repo.path.clone())
            .or_default()
            .push(Branch::local(&repo.path, name));
        Ok(())
    }

    fn rename_branch(&self, repo: &Repository, from: &str, to: &str) -> GitResult<()> {
        self.record(GitCall::RenameBranch {
            repo: repo.path.clone(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn delete_branches(
        &self,
        repo: &Repository,
        references: &[GitReference],
        options: &DeleteBranchOptions,
    ) -> GitResult<()> {
        self.record(GitCall::DeleteBranches {
            repo: repo.path.clone(),
            names: references.iter().map(|r| r.ref_name().to_string()).collect(),
            options: *options,
        })
    }

    fn cherry_pick(
        &self,
        repo: &Repository,
        shas: &[String],
        options: &CherryPickOptions,
    ) -> GitResult<()> {
        self.record(GitCall::CherryPick {
            repo: repo.path.clone(),
            shas: shas.to_vec(),
            options: *options,
        })
    }

    fn create_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeCreateOptions,
    ) -> GitResult<Worktree> {
        self.calls.borrow_mut().push(GitCall::CreateWorktree {
            repo: repo.path.clone(),
            path: path.to_path_buf(),
            options: options.clone(),
        });
        if let Some(error) = self.worktree_create_failures.borrow_mut().pop_front() {
            return Err(error);
        }

        let mut worktree = Worktree::new(&repo.path, path);
        worktree.branch = options
            .create_branch
            .clone()
            .or_else(|| options.commitish.clone());
        self.worktrees
            .borrow_mut()
            .entry(repo.path.clone())
            .or_default()
            .push(worktree.clone());
        Ok(worktree)
    }

    fn delete_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeDeleteOptions,
    ) -> GitResult<()> {
        self.calls.borrow_mut().push(GitCall::DeleteWorktree {
            repo: repo.path.clone(),
            path: path.to_path_buf(),
            options: *options,
        });
        if let Some(error) = self.worktree_delete_failures.borrow_mut().pop_front() {
            return Err(error);
        }
        if let Some(worktrees) = self.worktrees.borrow_mut().get_mut(&repo.path) {
            worktrees.retain(|wt| wt.path != path);
        }
        Ok(())
    }

    fn apply_patch(&self, path: &Path, patch: &str) -> GitResult<()> {
        self.record(GitCall::ApplyPatch {
            path: path.to_path_buf(),
            patch: patch.to_string(),
        })
    }
}
