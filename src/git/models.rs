//! Domain model for repositories and the objects listed in pickers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::reference::{BranchReference, GitReference, RevisionReference, TagReference};

/// An open repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    /// Working tree root.
    pub path: PathBuf,
    /// Display name (the folder name unless overridden).
    pub name: String,
}

impl Repository {
    /// Create a repository named after its folder.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Create a repository with an explicit display name.
    pub fn named(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// Ahead/behind counts relative to an upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingState {
    pub ahead: u32,
    pub behind: u32,
}

impl TrackingState {
    pub fn new(ahead: u32, behind: u32) -> Self {
        Self { ahead, behind }
    }
}

/// The upstream a local branch tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Short name, e.g. `origin/main`.
    pub name: String,
    /// The upstream ref no longer exists on the remote.
    pub missing: bool,
}

impl Upstream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            missing: false,
        }
    }

    pub fn gone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            missing: true,
        }
    }

    /// Remote part of the upstream name (`origin` for `origin/main`).
    pub fn remote_name(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    /// Branch part of the upstream name (`main` for `origin/main`).
    pub fn branch_name(&self) -> &str {
        self.name
            .split_once('/')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.name)
    }
}

/// A local or remote-tracking branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub repo_path: PathBuf,
    /// Short name (`main`, `origin/feature`).
    pub name: String,
    pub remote: bool,
    /// Checked out in the repository's working tree.
    pub current: bool,
    pub upstream: Option<Upstream>,
    pub state: TrackingState,
    pub sha: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Path of a linked worktree that has this branch checked out.
    pub worktree_path: Option<PathBuf>,
}

impl Branch {
    /// A local branch with no upstream.
    pub fn local(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            name: name.into(),
            remote: false,
            current: false,
            upstream: None,
            state: TrackingState::default(),
            sha: None,
            date: None,
            worktree_path: None,
        }
    }

    /// A remote-tracking branch such as `origin/main`.
    pub fn remote(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            remote: true,
            ..Self::local(repo_path, name)
        }
    }

    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn with_state(mut self, ahead: u32, behind: u32) -> Self {
        self.state = TrackingState::new(ahead, behind);
        self
    }

    pub fn as_current(mut self) -> Self {
        self.current = true;
        self
    }

    pub fn with_worktree(mut self, path: impl Into<PathBuf>) -> Self {
        self.worktree_path = Some(path.into());
        self
    }

    /// The remote this branch belongs to or tracks.
    pub fn remote_name(&self) -> Option<&str> {
        if self.remote {
            return self.name.split('/').next();
        }
        self.upstream.as_ref().map(Upstream::remote_name)
    }

    /// Name with the remote prefix removed (`feature` for `origin/feature`).
    pub fn name_without_remote(&self) -> &str {
        if self.remote {
            if let Some((_, rest)) = self.name.split_once('/') {
                return rest;
            }
        }
        &self.name
    }

    /// Reference handle for this branch.
    pub fn reference(&self) -> GitReference {
        GitReference::Branch(BranchReference {
            repo_path: self.repo_path.clone(),
            name: self.name.clone(),
            remote: self.remote,
            upstream: self.upstream.clone(),
            sha: self.sha.clone(),
        })
    }
}

/// A tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub repo_path: PathBuf,
    pub name: String,
    pub sha: Option<String>,
}

impl Tag {
    pub fn new(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            name: name.into(),
            sha: None,
        }
    }

    pub fn reference(&self) -> GitReference {
        GitReference::Tag(TagReference {
            repo_path: self.repo_path.clone(),
            name: self.name.clone(),
            sha: self.sha.clone(),
        })
    }
}

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A commit in a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub repo_path: PathBuf,
    pub sha: String,
    pub summary: String,
    pub author: String,
    pub date: Option<DateTime<Utc>>,
}

impl Commit {
    pub fn new(
        repo_path: impl Into<PathBuf>,
        sha: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            repo_path: repo_path.into(),
            sha: sha.into(),
            summary: summary.into(),
            author: String::new(),
            date: None,
        }
    }

    pub fn short_sha(&self) -> &str {
        shorten_sha(&self.sha)
    }

    pub fn reference(&self) -> GitReference {
        GitReference::Revision(RevisionReference {
            repo_path: self.repo_path.clone(),
            sha: self.sha.clone(),
            message: Some(self.summary.clone()),
            date: self.date,
        })
    }
}

/// A working tree attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    pub repo_path: PathBuf,
    pub path: PathBuf,
    /// Checked-out branch, `None` when detached.
    pub branch: Option<String>,
    pub sha: Option<String>,
    /// The repository's main working tree.
    pub main: bool,
    /// The worktree the process is running in.
    pub opened: bool,
}

impl Worktree {
    pub fn new(repo_path: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            path: path.into(),
            branch: None,
            sha: None,
            main: false,
            opened: false,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn as_main(mut self) -> Self {
        self.main = true;
        self
    }

    /// Folder name of the worktree.
    pub fn name(&self) -> String {
        folder_name(&self.path)
    }
}

/// Working tree status of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Current branch, `None` when detached.
    pub branch: Option<String>,
    pub upstream: Option<Upstream>,
    pub state: TrackingState,
    pub has_changes: bool,
}

/// First seven characters of a sha.
pub fn shorten_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

pub(crate) fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
