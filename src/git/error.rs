//! Typed failures raised by the git provider.

use std::path::PathBuf;
use thiserror::Error;

/// Why `git worktree add` refused to create a worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeCreateErrorReason {
    /// The branch is already checked out in another worktree.
    AlreadyCheckedOut,
    /// The target folder already exists and is not empty.
    AlreadyExists,
    Other,
}

/// Why `git worktree remove` refused to delete a worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeDeleteErrorReason {
    /// The worktree has uncommitted or untracked changes.
    HasChanges,
    /// The path is the repository's main working tree.
    MainWorkingTree,
    Other,
}

/// Why `git apply` could not copy a patch cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPatchErrorReason {
    /// The patch was applied, leaving conflict markers behind.
    AppliedWithConflicts,
    /// Applying would overwrite local changes in the target.
    WouldOverwrite,
    Other,
}

/// Errors from git queries and operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A git invocation exited unsuccessfully.
    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    /// The path is not inside a git repository.
    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// Worktree creation failed.
    #[error("Unable to create worktree: {message}")]
    WorktreeCreate {
        reason: WorktreeCreateErrorReason,
        message: String,
    },

    /// Worktree deletion failed.
    #[error("Unable to delete worktree: {message}")]
    WorktreeDelete {
        reason: WorktreeDeleteErrorReason,
        message: String,
    },

    /// Applying a patch failed or left conflicts.
    #[error("Unable to apply changes: {message}")]
    ApplyPatch {
        reason: ApplyPatchErrorReason,
        message: String,
    },

    /// IO error while spawning git.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// The reason code, if this is a worktree creation failure.
    pub fn worktree_create_reason(&self) -> Option<WorktreeCreateErrorReason> {
        match self {
            Self::WorktreeCreate { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// The reason code, if this is a worktree deletion failure.
    pub fn worktree_delete_reason(&self) -> Option<WorktreeDeleteErrorReason> {
        match self {
            Self::WorktreeDelete { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn apply_patch_reason(&self) -> Option<ApplyPatchErrorReason> {
        match self {
            Self::ApplyPatch { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Result type alias for git provider calls.
pub type GitResult<T> = std::result::Result<T, GitError>;
