//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct. Arguments to a git command
//! become the initial state of its wizard; see [`resolve`](super::resolve).

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// gitstep - Step-by-step interactive wizards for everyday git commands.
#[derive(Debug, Parser)]
#[command(name = "gitstep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository to work on; repeat for several (default: the one containing the current directory)
    #[arg(short, long = "repo", value_name = "PATH", global = true)]
    pub repos: Vec<PathBuf>,

    /// Path to config file (merged over user and project config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Accept defaults without prompting
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Skip confirmation steps where the command allows it
    #[arg(long, global = true)]
    pub no_confirm: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands. Without one the command palette is shown.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create, prune, rename, or delete branches
    Branch(BranchOpts),

    /// Apply commits from another branch onto the current branch
    #[command(alias = "cherry")]
    CherryPick(CherryPickOpts),

    /// Fetch and integrate changes from a remote
    Pull(PullOpts),

    /// Push the current branch to a remote
    Push(PushOpts),

    /// Switch to a branch, tag or commit
    #[command(alias = "checkout")]
    Switch(SwitchOpts),

    /// Create, open, or delete worktrees
    Worktree(WorktreeOpts),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `branch` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BranchOpts {
    #[command(subcommand)]
    pub action: Option<BranchAction>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum BranchAction {
    /// Create a new branch
    Create {
        /// Name of the new branch
        name: Option<String>,

        /// Branch, tag or commit to start from
        #[arg(long, value_name = "REF")]
        from: Option<String>,

        /// Switch to the branch once created
        #[arg(short, long)]
        switch: bool,
    },

    /// Delete branches
    Delete {
        /// Branches to delete
        branches: Vec<String>,

        /// Delete even when not fully merged
        #[arg(short, long)]
        force: bool,

        /// Also delete the upstream branches
        #[arg(long)]
        remotes: bool,
    },

    /// Delete local branches whose upstream is gone
    Prune,

    /// Rename a branch
    Rename {
        /// Branch to rename
        branch: Option<String>,

        /// New name
        new_name: Option<String>,
    },
}

/// Arguments for the `cherry-pick` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CherryPickOpts {
    /// Commits to apply, or a branch to choose commits from
    #[arg(value_name = "REV")]
    pub revisions: Vec<String>,

    /// Edit the commit messages
    #[arg(short, long)]
    pub edit: bool,

    /// Apply without committing
    #[arg(short = 'n', long)]
    pub no_commit: bool,
}

/// Arguments for the `pull` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PullOpts {
    /// Pull this branch; a branch that is not checked out is fetched
    pub branch: Option<String>,

    /// Rebase instead of merging
    #[arg(long)]
    pub rebase: bool,
}

/// Arguments for the `push` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PushOpts {
    /// Push only this branch
    pub branch: Option<String>,

    /// Force push
    #[arg(short, long)]
    pub force: bool,

    /// Publish the branch to this remote
    #[arg(short = 'u', long = "set-upstream", value_name = "REMOTE")]
    pub publish: Option<String>,
}

/// Arguments for the `switch` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SwitchOpts {
    /// Branch, tag or commit to switch to
    #[arg(value_name = "REF")]
    pub reference: Option<String>,

    /// Create a new branch at REF and switch to it
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,
}

/// Arguments for the `worktree` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct WorktreeOpts {
    #[command(subcommand)]
    pub action: Option<WorktreeAction>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum WorktreeAction {
    /// Create a worktree
    Create {
        /// Branch, tag or commit to check out
        #[arg(value_name = "REF")]
        reference: Option<String>,

        /// Create a new branch for the worktree
        #[arg(short = 'b', long = "branch", value_name = "NAME")]
        create_branch: Option<String>,

        /// Folder that holds new worktrees
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Check out detached
        #[arg(long)]
        detach: bool,

        /// Create even when the branch is checked out elsewhere
        #[arg(short, long)]
        force: bool,
    },

    /// Delete worktrees
    Delete {
        /// Worktree folders to delete
        paths: Vec<PathBuf>,

        /// Delete even with uncommitted changes
        #[arg(short, long)]
        force: bool,
    },

    /// Open a worktree
    Open {
        /// Worktree folder to open
        path: Option<PathBuf>,

        /// Open in a new window
        #[arg(long)]
        new_window: bool,
    },

    /// Copy uncommitted changes to another worktree
    CopyChanges {
        /// Worktree folder to copy the changes to
        target: Option<PathBuf>,

        /// Worktree folder to copy the changes from
        #[arg(long, value_name = "PATH")]
        from: Option<PathBuf>,

        /// Copy only staged changes
        #[arg(long, conflicts_with = "working")]
        staged: bool,

        /// Copy all uncommitted changes, staged or not
        #[arg(long)]
        working: bool,
    },
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_opens_the_palette() {
        let cli = Cli::try_parse_from(["gitstep"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn checkout_is_an_alias_for_switch() {
        let cli = Cli::try_parse_from(["gitstep", "checkout", "main", "-c", "topic"]).unwrap();
        match cli.command {
            Some(Commands::Switch(opts)) => {
                assert_eq!(opts.reference.as_deref(), Some("main"));
                assert_eq!(opts.create.as_deref(), Some("topic"));
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn repos_are_repeatable_and_global() {
        let cli = Cli::try_parse_from(["gitstep", "push", "--repo", "/a", "-r", "/b"]).unwrap();
        assert_eq!(cli.repos, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn branch_delete_flags() {
        let cli = Cli::try_parse_from([
            "gitstep", "branch", "delete", "old", "stale", "--force", "--remotes",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Branch(BranchOpts {
                action:
                    Some(BranchAction::Delete {
                        branches,
                        force,
                        remotes,
                    }),
            })) => {
                assert_eq!(branches, vec!["old", "stale"]);
                assert!(force && remotes);
            }
            other => panic!("expected branch delete, got {:?}", other),
        }
    }

    #[test]
    fn worktree_create_takes_a_new_branch() {
        let cli =
            Cli::try_parse_from(["gitstep", "worktree", "create", "origin/x", "-b", "x"]).unwrap();
        match cli.command {
            Some(Commands::Worktree(WorktreeOpts {
                action:
                    Some(WorktreeAction::Create {
                        reference,
                        create_branch,
                        ..
                    }),
            })) => {
                assert_eq!(reference.as_deref(), Some("origin/x"));
                assert_eq!(create_branch.as_deref(), Some("x"));
            }
            other => panic!("expected worktree create, got {:?}", other),
        }
    }

    #[test]
    fn worktree_copy_changes_kinds_conflict() {
        let cli = Cli::try_parse_from(["gitstep", "worktree", "copy-changes", "../wt", "--staged"])
            .unwrap();
        match cli.command {
            Some(Commands::Worktree(WorktreeOpts {
                action: Some(WorktreeAction::CopyChanges { target, staged, working, .. }),
            })) => {
                assert_eq!(target, Some(PathBuf::from("../wt")));
                assert!(staged && !working);
            }
            other => panic!("expected worktree copy-changes, got {:?}", other),
        }

        assert!(Cli::try_parse_from([
            "gitstep",
            "worktree",
            "copy-changes",
            "--staged",
            "--working"
        ])
        .is_err());
    }

    #[test]
    fn cherry_alias_collects_revisions() {
        let cli = Cli::try_parse_from(["gitstep", "cherry", "abc123", "def456", "-n"]).unwrap();
        match cli.command {
            Some(Commands::CherryPick(opts)) => {
                assert_eq!(opts.revisions, vec!["abc123", "def456"]);
                assert!(opts.no_commit);
            }
            other => panic!("expected cherry-pick, got {:?}", other),
        }
    }
}
