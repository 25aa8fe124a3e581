//! Configuration schema definitions for gitstep.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WizardConfig {
    /// Skip-confirm keys, e.g. `push:command` or `branch-create:menu`.
    ///
    /// The confirm step of a matching command is skipped unless the caller
    /// explicitly asks for it.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip_confirmations: Vec<String>,

    /// Git behaviour.
    pub git: GitSettings,

    /// Worktree behaviour.
    pub worktrees: WorktreeSettings,

    /// Commit picker behaviour.
    pub commits: CommitSettings,
}

/// Git behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitSettings {
    /// Force pushes use `--force-with-lease`.
    pub use_force_push_with_lease: bool,
    /// Lease force pushes add `--force-if-includes` when git supports it.
    pub use_force_push_if_includes: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            use_force_push_with_lease: true,
            use_force_push_if_includes: true,
        }
    }
}

/// When a newly created worktree is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenAfterCreate {
    Always,
    AlwaysNewWindow,
    OnlyWhenEmpty,
    #[default]
    Prompt,
    Never,
}

/// Worktree settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorktreeSettings {
    pub open_after_create: OpenAfterCreate,
    /// Root folder offered for new worktrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_location: Option<PathBuf>,
}

/// Commit picker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitSettings {
    /// Commits loaded per page.
    pub page_size: usize,
}

impl Default for CommitSettings {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}
