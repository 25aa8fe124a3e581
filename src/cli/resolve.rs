//! Turning command-line arguments into a wizard's initial state.
//!
//! Names are resolved against the first open repository (local branch, then
//! remote branch, then tag, then revision). Whatever is resolved counts as
//! answered, so the wizard starts past those steps.

use std::path::{Path, PathBuf};

use crate::commands::common::find_reference;
use crate::commands::{
    BranchArgs, BranchState, BranchSubcommandState, ChangesKind, CherryPickArgs, CherryPickFlags,
    CherryPickState, CopyChangesState, CreateBranchFlags, CreateBranchState, CreateWorktreeFlags,
    CreateWorktreeState, DeleteBranchFlags, DeleteBranchState, DeleteWorktreeState,
    OpenWorktreeState, PullArgs, PullFlags, PullState, PushArgs, PushFlags, PushState,
    RenameBranchState, SwitchArgs, SwitchState, WorktreeArgs, WorktreeState,
    WorktreeSubcommandState,
};
use crate::engine::CommandArgs;
use crate::error::{GitstepError, Result};
use crate::git::{GitError, GitProvider, GitReference, Repository, Worktree};
use crate::ui::OpenLocation;

use super::args::{
    BranchAction, BranchOpts, CherryPickOpts, Commands, PullOpts, PushOpts, SwitchOpts,
    WorktreeAction, WorktreeOpts,
};

/// Resolves CLI arguments through a [`GitProvider`].
pub struct ArgsResolver<'a> {
    git: &'a dyn GitProvider,
    repos: Vec<Repository>,
    cwd: PathBuf,
    confirm: Option<bool>,
}

impl<'a> ArgsResolver<'a> {
    pub fn new(git: &'a dyn GitProvider, cwd: &Path, no_confirm: bool) -> Self {
        Self {
            git,
            repos: git.open_repositories(),
            cwd: cwd.to_path_buf(),
            confirm: no_confirm.then_some(false),
        }
    }

    /// Initial arguments for `command`; `None` opens the palette.
    pub fn resolve(&self, command: Option<&Commands>) -> Result<Option<CommandArgs>> {
        let args = match command {
            None | Some(Commands::Completions(_)) => return Ok(None),
            Some(Commands::Branch(opts)) => self.branch(opts)?,
            Some(Commands::CherryPick(opts)) => self.cherry_pick(opts)?,
            Some(Commands::Pull(opts)) => self.pull(opts)?,
            Some(Commands::Push(opts)) => self.push(opts)?,
            Some(Commands::Switch(opts)) => self.switch(opts)?,
            Some(Commands::Worktree(opts)) => self.worktree(opts)?,
        };
        tracing::debug!("Starting {} from the command line", args.kind().label());
        Ok(Some(args))
    }

    fn primary(&self) -> Result<&Repository> {
        self.repos.first().ok_or_else(|| {
            GitstepError::from(GitError::NotARepository {
                path: self.cwd.clone(),
            })
        })
    }

    fn reference(&self, name: &str) -> Result<GitReference> {
        find_reference(self.git, self.primary()?, name)?.ok_or_else(|| {
            GitstepError::InvalidReference {
                name: name.to_string(),
            }
        })
    }

    fn optional_reference(&self, name: Option<&str>) -> Result<Option<GitReference>> {
        name.map(|n| self.reference(n)).transpose()
    }

    /// The primary repository, once something was resolved in it.
    fn repo_if(&self, resolved: bool) -> Result<Option<Repository>> {
        Ok(if resolved {
            Some(self.primary()?.clone())
        } else {
            None
        })
    }

    fn worktree(&self, opts: &WorktreeOpts) -> Result<CommandArgs> {
        let subcommand = match &opts.action {
            None => None,
            Some(WorktreeAction::Create {
                reference,
                create_branch,
                path,
                detach,
                force,
            }) => Some(WorktreeSubcommandState::Create(CreateWorktreeState {
                path: path.as_ref().map(|p| self.absolute(p)),
                reference: self.optional_reference(reference.as_deref())?,
                create_branch: create_branch.clone(),
                flags: CreateWorktreeFlags {
                    new_branch: create_branch.is_some(),
                    direct: false,
                    detach: *detach,
                    force: *force,
                },
            })),
            Some(WorktreeAction::Delete { paths, force }) => {
                let paths = paths
                    .iter()
                    .map(|p| self.find_worktree(p).map(|w| w.path))
                    .collect::<Result<Vec<_>>>()?;
                Some(WorktreeSubcommandState::Delete(DeleteWorktreeState {
                    paths,
                    force: *force,
                }))
            }
            Some(WorktreeAction::Open { path, new_window }) => {
                Some(WorktreeSubcommandState::Open(OpenWorktreeState {
                    worktree: path.as_ref().map(|p| self.find_worktree(p)).transpose()?,
                    location: new_window.then_some(OpenLocation::NewWindow),
                    ..Default::default()
                }))
            }
            Some(WorktreeAction::CopyChanges {
                target,
                from,
                staged,
                working,
            }) => {
                let changes = if *staged {
                    Some(ChangesKind::Staged)
                } else if *working {
                    Some(ChangesKind::Working)
                } else {
                    None
                };
                Some(WorktreeSubcommandState::CopyChanges(CopyChangesState {
                    source: from.as_ref().map(|p| self.find_worktree(p)).transpose()?,
                    changes,
                    target: target.as_ref().map(|p| self.find_worktree(p)).transpose()?,
                }))
            }
        };

        let resolved = match &subcommand {
            Some(WorktreeSubcommandState::Create(create)) => create.reference.is_some(),
            Some(WorktreeSubcommandState::Delete(delete)) => !delete.paths.is_empty(),
            Some(WorktreeSubcommandState::Open(open)) => open.worktree.is_some(),
            Some(WorktreeSubcommandState::CopyChanges(copy)) => copy.target.is_some(),
            None => false,
        };
        Ok(CommandArgs::Worktree(WorktreeArgs {
            confirm: self.confirm,
            state: WorktreeState {
                repo: self.repo_if(resolved)?,
                subcommand,
            },
        }))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn find_worktree(&self, path: &Path) -> Result<Worktree> {
        let path = self.absolute(path);
        self.git
            .worktrees(self.primary()?)?
            .into_iter()
            .find(|w| w.path == path)
            .ok_or(GitstepError::UnknownWorktree { path })
    }

    fn branch(&self, opts: &BranchOpts) -> Result<CommandArgs> {
        let subcommand = match &opts.action {
            None => None,
            Some(BranchAction::Create { name, from, switch }) => {
                Some(BranchSubcommandState::Create(CreateBranchState {
                    reference: self.optional_reference(from.as_deref())?,
                    name: name.clone(),
                    suggest_name_only: false,
                    flags: CreateBranchFlags {
                        switch: *switch,
                        worktree: false,
                    },
                }))
            }
            Some(BranchAction::Delete {
                branches,
                force,
                remotes,
            }) => Some(BranchSubcommandState::Delete(DeleteBranchState {
                references: branches
                    .iter()
                    .map(|b| self.reference(b))
                    .collect::<Result<Vec<_>>>()?,
                flags: DeleteBranchFlags {
                    force: *force,
                    remotes: *remotes,
                },
            })),
            Some(BranchAction::Prune) => Some(BranchSubcommandState::Prune(Default::default())),
            Some(BranchAction::Rename { branch, new_name }) => {
                Some(BranchSubcommandState::Rename(RenameBranchState {
                    reference: self.optional_reference(branch.as_deref())?,
                    name: new_name.clone(),
                }))
            }
        };

        let resolved = match &subcommand {
            Some(BranchSubcommandState::Create(create)) => create.reference.is_some(),
            Some(BranchSubcommandState::Delete(delete)) => !delete.references.is_empty(),
            Some(BranchSubcommandState::Rename(rename)) => rename.reference.is_some(),
            _ => false,
        };
        Ok(CommandArgs::Branch(BranchArgs {
            confirm: self.confirm,
            state: BranchState {
                repo: self.repo_if(resolved)?,
                subcommand,
            },
        }))
    }

    fn cherry_pick(&self, opts: &CherryPickOpts) -> Result<CommandArgs> {
        let references = opts
            .revisions
            .iter()
            .map(|r| self.reference(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(CommandArgs::CherryPick(CherryPickArgs {
            confirm: self.confirm,
            state: CherryPickState {
                repo: self.repo_if(!references.is_empty())?,
                references,
                flags: CherryPickFlags {
                    edit: opts.edit,
                    no_commit: opts.no_commit,
                },
            },
        }))
    }

    fn pull(&self, opts: &PullOpts) -> Result<CommandArgs> {
        let reference = self.optional_reference(opts.branch.as_deref())?;
        Ok(CommandArgs::Pull(PullArgs {
            confirm: self.confirm,
            state: PullState {
                repos: self.repo_if(reference.is_some())?.into_iter().collect(),
                reference,
                flags: PullFlags {
                    rebase: opts.rebase,
                },
            },
        }))
    }

    fn push(&self, opts: &PushOpts) -> Result<CommandArgs> {
        let reference = self.optional_reference(opts.branch.as_deref())?;
        Ok(CommandArgs::Push(PushArgs {
            confirm: self.confirm,
            state: PushState {
                repos: self.repo_if(reference.is_some())?.into_iter().collect(),
                reference,
                flags: PushFlags {
                    force: opts.force,
                    publish: opts.publish.clone(),
                },
            },
        }))
    }

    /// `switch REF --create NAME` is `branch create --switch`.
    fn switch(&self, opts: &SwitchOpts) -> Result<CommandArgs> {
        let reference = self.optional_reference(opts.reference.as_deref())?;

        if let Some(name) = &opts.create {
            return Ok(CommandArgs::Branch(BranchArgs {
                confirm: self.confirm,
                state: BranchState {
                    repo: Some(self.primary()?.clone()),
                    subcommand: Some(BranchSubcommandState::Create(CreateBranchState {
                        reference,
                        name: Some(name.clone()),
                        suggest_name_only: false,
                        flags: CreateBranchFlags {
                            switch: true,
                            worktree: false,
                        },
                    })),
                },
            }));
        }

        let repos = if reference.is_some() {
            self.repos.clone()
        } else {
            Vec::new()
        };
        Ok(CommandArgs::Switch(SwitchArgs {
            confirm: self.confirm,
            state: SwitchState {
                repos,
                reference,
                ..Default::default()
            },
        }))
    }
}
