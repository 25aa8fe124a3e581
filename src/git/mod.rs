//! Git boundary: domain model, references and the provider trait.
//!
//! - [`GitProvider`] is what commands enumerate and execute through
//! - [`GitCli`] implements it by running `git`
//! - [`MockGit`] implements it in memory for tests

pub mod cli;
pub mod error;
pub mod mock;
pub mod models;
pub mod provider;
pub mod reference;

pub use cli::GitCli;
pub use error::{
    ApplyPatchErrorReason, GitError, GitResult, WorktreeCreateErrorReason,
    WorktreeDeleteErrorReason,
};
pub use mock::{GitCall, MockGit};
pub use models::{
    shorten_sha, Branch, Commit, Remote, RepoStatus, Repository, Tag, TrackingState, Upstream,
    Worktree,
};
pub use provider::{
    CherryPickOptions, DeleteBranchOptions, GitProvider, PullOptions, PushOptions,
    SwitchOptions, WorktreeCreateOptions, WorktreeDeleteOptions,
};
pub use reference::{
    name_without_remote, references_label, revision_range, BranchReference, GitReference,
    RevisionReference, TagReference,
};
