//! `worktree`: create, delete and open linked worktrees, and copy
//! uncommitted changes between them.
//!
//! Positions: 1 subcommand, 2 repository, 3 onward the subcommand's own
//! picks (copy-changes asks for a source, the kind of changes and a target).
//! Worktree steps always run against the common (main) repository, so a
//! linked worktree lists the same worktrees as its main one.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::OpenAfterCreate;
use crate::engine::{
    invariant_violation, CommandKind, CounterSeed, PickedVia, Progress, QuickCommand, Services,
    SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{
    name_without_remote, ApplyPatchErrorReason, GitProvider, GitReference, Repository, Worktree,
    WorktreeCreateErrorReason, WorktreeCreateOptions, WorktreeDeleteErrorReason,
    WorktreeDeleteOptions,
};
use crate::steps::{
    create_confirm_step, create_custom_step, create_pick_step, flags_item, pick_step_result,
    show_custom, show_pick, ConfirmOptions, Directive, PickEntry, PickItem, PickStep,
    PickStepConfig, Selection, StepResult,
};
use crate::ui::{pluralize, FolderRequest, OpenLocation, UserInterface};

use super::common::{
    append_repos_to_title, first_item, input_branch_name, pick_branch_or_tag, pick_repository,
    pick_worktree, pick_worktrees, Pass, ReferencePickOptions,
};

const MENU_TITLE: &str = "Worktrees";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeSubcommand {
    Create,
    Delete,
    Open,
    CopyChanges,
}

impl WorktreeSubcommand {
    /// Menu order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Create, Self::Delete, Self::CopyChanges];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Open => "open",
            Self::CopyChanges => "copy-changes",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Create => "creates a new worktree",
            Self::Delete => "deletes the specified worktrees",
            Self::Open => "opens the specified worktree",
            Self::CopyChanges => "copies uncommitted changes from one worktree to another",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Create => "Create Worktree",
            Self::Delete => "Delete Worktree",
            Self::Open => "Open Worktree",
            Self::CopyChanges => "Copy Changes to Worktree",
        }
    }

    fn initial_state(self) -> WorktreeSubcommandState {
        match self {
            Self::Create => WorktreeSubcommandState::Create(CreateWorktreeState::default()),
            Self::Delete => WorktreeSubcommandState::Delete(DeleteWorktreeState::default()),
            Self::Open => WorktreeSubcommandState::Open(OpenWorktreeState::default()),
            Self::CopyChanges => {
                WorktreeSubcommandState::CopyChanges(CopyChangesState::default())
            }
        }
    }
}

/// Which uncommitted changes are copied out of the source worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangesKind {
    /// Everything uncommitted, staged or not.
    Working,
    /// Only what has been added to the index.
    Staged,
}

impl ChangesKind {
    pub const ALL: [Self; 2] = [Self::Working, Self::Staged];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Working => "Working Changes",
            Self::Staged => "Staged Changes",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Working => "working changes",
            Self::Staged => "staged changes",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Working => "all uncommitted changes",
            Self::Staged => "only changes added to the index",
        }
    }
}

/// Flags chosen on the create confirm step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateWorktreeFlags {
    /// `-b`: create a new branch for the worktree.
    pub new_branch: bool,
    /// Use the chosen folder as the worktree itself rather than as a root.
    pub direct: bool,
    pub detach: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CreateWorktreeState {
    /// Root folder receiving a per-branch subfolder; with `direct`, the
    /// worktree folder itself.
    pub path: Option<PathBuf>,
    pub reference: Option<GitReference>,
    /// Name of the branch `-b` creates.
    pub create_branch: Option<String>,
    pub flags: CreateWorktreeFlags,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteWorktreeState {
    pub paths: Vec<PathBuf>,
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OpenWorktreeState {
    pub worktree: Option<Worktree>,
    pub location: Option<OpenLocation>,
    /// Offer only ways of opening the worktree, not revealing it.
    pub open_only: bool,
    pub disallow_back: bool,
    pub confirm_title: Option<String>,
    pub confirm_placeholder: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CopyChangesState {
    pub source: Option<Worktree>,
    pub changes: Option<ChangesKind>,
    pub target: Option<Worktree>,
}

#[derive(Debug, Clone)]
pub enum WorktreeSubcommandState {
    Create(CreateWorktreeState),
    Delete(DeleteWorktreeState),
    Open(OpenWorktreeState),
    CopyChanges(CopyChangesState),
}

impl WorktreeSubcommandState {
    pub fn kind(&self) -> WorktreeSubcommand {
        match self {
            Self::Create(_) => WorktreeSubcommand::Create,
            Self::Delete(_) => WorktreeSubcommand::Delete,
            Self::Open(_) => WorktreeSubcommand::Open,
            Self::CopyChanges(_) => WorktreeSubcommand::CopyChanges,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorktreeState {
    pub repo: Option<Repository>,
    pub subcommand: Option<WorktreeSubcommandState>,
}

#[derive(Debug, Clone, Default)]
pub struct WorktreeArgs {
    pub confirm: Option<bool>,
    pub state: WorktreeState,
}

/// Folders the user chose on the create confirm step.
#[derive(Debug, Default)]
struct FolderChoice {
    root: Option<PathBuf>,
    specific: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum CreateChoice {
    Create {
        root: PathBuf,
        flags: CreateWorktreeFlags,
    },
    ChangeRoot,
    ChooseFolder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckedOutRecovery {
    NewBranch,
    Force,
}

pub struct WorktreeCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<WorktreeState>,
    /// Set while a corrective retry runs without its confirm step.
    skip_confirm_override: Option<bool>,
    folders: FolderChoice,
}

impl WorktreeCommand {
    pub fn new(services: Rc<Services>, args: WorktreeArgs, via: PickedVia) -> Self {
        let state = &args.state;
        let seed = CounterSeed::new().field(&state.subcommand);
        let seed = match &state.subcommand {
            Some(WorktreeSubcommandState::Create(create)) => {
                seed.field(&create.path).field(&create.reference)
            }
            Some(WorktreeSubcommandState::Delete(delete)) => seed.field(&delete.paths),
            Some(WorktreeSubcommandState::Open(open)) => seed.field(&open.worktree),
            Some(WorktreeSubcommandState::CopyChanges(copy)) => seed
                .field(&copy.source)
                .field(&copy.changes)
                .field(&copy.target),
            None => seed,
        };
        let counter = seed.field(&state.repo).value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
            skip_confirm_override: None,
            folders: FolderChoice::default(),
        }
    }

    fn subcommand(&self) -> Option<WorktreeSubcommand> {
        self.state.subcommand.as_ref().map(WorktreeSubcommandState::kind)
    }

    fn default_root(&self, repo: &Repository) -> PathBuf {
        self.services
            .config
            .worktrees
            .default_location
            .clone()
            .unwrap_or_else(|| {
                repo.path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| repo.path.clone())
            })
    }

    fn create_pass(
        &mut self,
        ui: &mut dyn UserInterface,
        repo: &Repository,
        open_count: usize,
        tracker: &SkipTracker,
    ) -> Result<Pass> {
        let git = Rc::clone(&self.services.git);
        let title = self.title();
        let confirm = self.confirm(self.state.progress.confirm);
        let default_root = self.default_root(repo);
        let open_after = self.services.config.worktrees.open_after_create;

        let StepState { progress, data } = &mut self.state;
        let Some(WorktreeSubcommandState::Create(create)) = data.subcommand.as_mut() else {
            invariant_violation("worktree create pass without create state");
        };
        if create.path.is_none() {
            create.path = Some(default_root);
        }

        if progress.needs(3, create.reference.is_some()) {
            let current = git.branch(repo, None)?.map(|b| b.name);
            let picked = create
                .reference
                .as_ref()
                .map(|r| r.ref_name().to_string())
                .or(current);
            let value = create
                .reference
                .as_ref()
                .filter(|r| r.is_revision())
                .map(|r| r.ref_name().to_string());
            let options = ReferencePickOptions {
                placeholder: "Choose a branch or tag to create the new worktree for",
                picked: picked.as_deref(),
                value,
                ..Default::default()
            };
            match pick_branch_or_tag(ui, progress, &git, repo, &title, options)? {
                StepResult::Value(reference) => {
                    create.reference = Some(reference);
                    create.create_branch = None;
                    create.flags = CreateWorktreeFlags::default();
                }
                StepResult::Break => {
                    // Leaving create forgets the folder chosen for it.
                    create.path = None;
                    self.folders = FolderChoice::default();
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(reference) = create.reference.clone() else {
            invariant_violation("worktree create reached confirmation without a reference");
        };

        // A remote branch can only be checked out through a new local branch.
        if reference.is_remote_branch() && create.create_branch.is_none() {
            let local = name_without_remote(&reference);
            let local_exists = git.branch(repo, Some(&local))?.is_some_and(|b| !b.remote);
            create.create_branch = Some(if local_exists {
                reference.name().to_string()
            } else {
                local
            });
            create.flags.new_branch = true;
        }

        if confirm {
            let folders = &self.folders;
            let selection = show_pick(ui, || {
                Ok(build_create_confirm(create, repo, folders, &title, open_count))
            })?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(CreateChoice::Create { root, flags }) => {
                    create.path = Some(root);
                    create.flags = flags;
                }
                StepResult::Value(choice) => {
                    // The folder chooser is a detour from the confirm step.
                    progress.back();
                    let specific = choice == CreateChoice::ChooseFolder;
                    if let Some(path) = choose_folder(ui, specific, create.path.clone())? {
                        create.path = Some(path.clone());
                        self.folders = if specific {
                            FolderChoice {
                                root: None,
                                specific: Some(path),
                            }
                        } else {
                            FolderChoice {
                                root: Some(path),
                                specific: None,
                            }
                        };
                    }
                    return Ok(Pass::Continue);
                }
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }
        self.skip_confirm_override = None;
        progress.confirm = None;

        if create.flags.new_branch {
            let mut suggestion = None;
            if let Some(name) = &create.create_branch {
                let taken = git.branch(repo, Some(name))?.is_some_and(|b| !b.remote);
                if taken || !git.validate_branch_name(repo, name)? {
                    suggestion = create.create_branch.take();
                }
            }
            if create.create_branch.is_none() {
                let value = suggestion.or_else(|| Some(name_without_remote(&reference)));
                let input_title = format!("{} and New Branch from {}", title, reference.label());
                match input_branch_name(ui, progress, &git, repo, &input_title, value)? {
                    StepResult::Value(name) => create.create_branch = Some(name),
                    StepResult::Break => {
                        create.flags = CreateWorktreeFlags::default();
                        return Ok(Pass::Continue);
                    }
                    StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
                }
            }
        }

        let root = create.path.clone().unwrap_or_else(|| repo.path.clone());
        let target = if create.flags.direct {
            root
        } else {
            root.join(create.create_branch.as_deref().unwrap_or(reference.name()))
        };
        let options = WorktreeCreateOptions {
            commitish: Some(reference.ref_name().to_string()),
            create_branch: create
                .create_branch
                .clone()
                .filter(|_| create.flags.new_branch),
            detach: create.flags.detach,
            force: create.flags.force,
        };

        let mut spinner = ui.start_spinner(&format!("Creating worktree in {}", target.display()));
        let worktree = match git.create_worktree(repo, &target, &options) {
            Ok(worktree) => {
                spinner.finish_success(&format!("Created worktree in {}", target.display()));
                worktree
            }
            Err(e) => {
                tracing::warn!("Creating worktree in {} failed: {}", target.display(), e);
                spinner.finish_error(&format!("Unable to create worktree in {}", target.display()));
                match e.worktree_create_reason() {
                    Some(WorktreeCreateErrorReason::AlreadyCheckedOut) if !create.flags.force => {
                        let reason = format!(
                            "Unable to create a new worktree because {} is already checked out",
                            reference.label()
                        );
                        let choices = vec![
                            PickEntry::item("Create New Branch", CheckedOutRecovery::NewBranch),
                            PickEntry::item("Force Create", CheckedOutRecovery::Force),
                        ];
                        match recover(ui, &title, &reason, choices)? {
                            Some(CheckedOutRecovery::NewBranch) => create.flags.new_branch = true,
                            Some(CheckedOutRecovery::Force) => create.flags.force = true,
                            None => {
                                progress.end();
                                return Ok(Pass::Continue);
                            }
                        }
                        progress.confirm = Some(false);
                        self.skip_confirm_override = Some(true);
                        return Ok(Pass::Continue);
                    }
                    Some(WorktreeCreateErrorReason::AlreadyExists) => ui.error(&format!(
                        "Unable to create a new worktree in '{}' because the folder already exists and is not empty",
                        target.display()
                    )),
                    _ => ui.error(&e.to_string()),
                }
                progress.end();
                return Ok(Pass::Continue);
            }
        };
        progress.end();

        open_after_create(ui, git.as_ref(), repo, &worktree, open_after, open_count)?;
        Ok(Pass::Continue)
    }

    fn delete_pass(
        &mut self,
        ui: &mut dyn UserInterface,
        repo: &Repository,
        open_count: usize,
        tracker: &SkipTracker,
    ) -> Result<Pass> {
        let git = Rc::clone(&self.services.git);
        let title = self.title();
        let confirm = self.confirm(self.state.progress.confirm);

        let StepState { progress, data } = &mut self.state;
        let Some(WorktreeSubcommandState::Delete(delete)) = data.subcommand.as_mut() else {
            invariant_violation("worktree delete pass without delete state");
        };

        if progress.needs(3, !delete.paths.is_empty()) {
            match pick_worktrees(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                "Choose worktrees to delete",
                |w| !(w.main && w.opened),
                &delete.paths,
            )? {
                StepResult::Value(worktrees) => {
                    delete.paths = worktrees.into_iter().map(|w| w.path).collect();
                }
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        if confirm {
            let selection =
                show_pick(ui, || Ok(build_delete_confirm(delete, repo, &title, open_count)))?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(force) => delete.force = force,
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        progress.end();
        let mut force = delete.force;
        for path in &delete.paths {
            if !delete_worktree(ui, git.as_ref(), repo, path, &mut force)? {
                break;
            }
        }
        Ok(Pass::Continue)
    }

    fn open_pass(
        &mut self,
        ui: &mut dyn UserInterface,
        repo: &Repository,
        open_count: usize,
        tracker: &SkipTracker,
    ) -> Result<Pass> {
        let git = Rc::clone(&self.services.git);
        let title = self.title();
        let confirm = self.confirm(self.state.progress.confirm);

        let StepState { progress, data } = &mut self.state;
        let Some(WorktreeSubcommandState::Open(open)) = data.subcommand.as_mut() else {
            invariant_violation("worktree open pass without open state");
        };

        if progress.needs(3, open.worktree.is_some()) {
            let picked = open.worktree.as_ref().map(|w| w.path.clone());
            match pick_worktree(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                "Choose a worktree to open",
                |w| !w.opened,
                picked.as_deref(),
            )? {
                StepResult::Value(worktree) => open.worktree = Some(worktree),
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(worktree) = open.worktree.clone() else {
            invariant_violation("worktree open reached confirmation without a worktree");
        };

        if confirm {
            let selection =
                show_pick(ui, || Ok(build_open_confirm(open, &worktree, repo, open_count)))?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(location) => open.location = Some(location),
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        progress.end();
        open_worktree(
            ui,
            &worktree,
            open.location.unwrap_or(OpenLocation::CurrentWindow),
        )?;
        Ok(Pass::Continue)
    }

    fn copy_changes_pass(
        &mut self,
        ui: &mut dyn UserInterface,
        repo: &Repository,
        open_count: usize,
        tracker: &SkipTracker,
    ) -> Result<Pass> {
        let git = Rc::clone(&self.services.git);
        let title = self.title();
        let confirm = self.confirm(self.state.progress.confirm);

        let StepState { progress, data } = &mut self.state;
        let Some(WorktreeSubcommandState::CopyChanges(copy)) = data.subcommand.as_mut() else {
            invariant_violation("worktree copy-changes pass without copy-changes state");
        };

        if progress.needs(3, copy.source.is_some()) {
            let picked = match &copy.source {
                Some(source) => Some(source.path.clone()),
                None => git
                    .worktrees(repo)?
                    .into_iter()
                    .find(|w| w.opened)
                    .map(|w| w.path),
            };
            match pick_worktree(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                "Choose a worktree to copy changes from",
                |_| true,
                picked.as_deref(),
            )? {
                StepResult::Value(source) => {
                    if copy.target.as_ref().is_some_and(|t| t.path == source.path) {
                        copy.target = None;
                    }
                    copy.source = Some(source);
                }
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(source) = copy.source.clone() else {
            invariant_violation("worktree copy-changes reached changes without a source");
        };

        if progress.needs(4, copy.changes.is_some()) {
            match pick_changes_kind(ui, progress, &title, &source, copy.changes)? {
                StepResult::Value(kind) => copy.changes = Some(kind),
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(kind) = copy.changes else {
            invariant_violation("worktree copy-changes reached target without changes");
        };

        if progress.needs(5, copy.target.is_some()) {
            let picked = copy.target.as_ref().map(|w| w.path.clone());
            let placeholder = format!("Choose a worktree to copy your {} to", kind.noun());
            match pick_worktree(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                &placeholder,
                |w| w.path != source.path,
                picked.as_deref(),
            )? {
                StepResult::Value(target) => copy.target = Some(target),
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(target) = copy.target.clone() else {
            invariant_violation("worktree copy-changes reached confirmation without a target");
        };

        let patch = git.diff(&source.path, kind == ChangesKind::Staged)?;
        if patch.trim().is_empty() {
            ui.error(&format!("No {} to copy from {}", kind.noun(), source.name()));
            progress.end();
            return Ok(Pass::Continue);
        }

        if confirm {
            let selection = show_pick(ui, || {
                Ok(build_copy_changes_confirm(
                    kind, &patch, &target, repo, &title, open_count,
                ))
            })?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(()) => {}
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        progress.end();
        let mut spinner = ui.start_spinner(&format!(
            "Copying {} to worktree {}",
            kind.noun(),
            target.name()
        ));
        match git.apply_patch(&target.path, &patch) {
            Ok(()) => spinner.finish_success(&format!(
                "Copied {} to worktree {}",
                kind.noun(),
                target.name()
            )),
            Err(e) => {
                tracing::warn!("Copying changes to {} failed: {}", target.path.display(), e);
                match e.apply_patch_reason() {
                    Some(ApplyPatchErrorReason::AppliedWithConflicts) => {
                        spinner.finish_success(&format!(
                            "Copied {} to worktree {}",
                            kind.noun(),
                            target.name()
                        ));
                        ui.warning("Changes were copied with conflicts");
                    }
                    Some(ApplyPatchErrorReason::WouldOverwrite) => {
                        spinner.finish_error(&format!(
                            "Unable to copy changes to worktree {}",
                            target.name()
                        ));
                        ui.error(
                            "Unable to copy changes as some local changes would be overwritten",
                        );
                        return Ok(Pass::Continue);
                    }
                    _ => {
                        spinner.finish_error(&format!(
                            "Unable to copy changes to worktree {}",
                            target.name()
                        ));
                        ui.error(&e.to_string());
                        return Ok(Pass::Continue);
                    }
                }
            }
        }

        prompt_open(ui, repo, &target, open_count)?;
        Ok(Pass::Continue)
    }
}

fn pick_subcommand(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    title: &str,
    current: Option<WorktreeSubcommand>,
) -> Result<StepResult<WorktreeSubcommand>> {
    let selection = show_pick(ui, || {
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some("Choose a worktree command".into()),
            items: WorktreeSubcommand::ALL
                .iter()
                .map(|s| {
                    PickItem::new(s.as_str(), *s)
                        .description(s.description())
                        .picked(current == Some(*s))
                        .into()
                })
                .collect(),
            ..Default::default()
        }))
    })?;
    Ok(first_item(pick_step_result(progress, selection)))
}

fn pick_changes_kind(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    title: &str,
    source: &Worktree,
    current: Option<ChangesKind>,
) -> Result<StepResult<ChangesKind>> {
    let selection = show_pick(ui, || {
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(format!("Choose which changes to copy from {}", source.name())),
            items: ChangesKind::ALL
                .iter()
                .map(|kind| {
                    PickItem::new(kind.label(), *kind)
                        .description(kind.description())
                        .picked(current == Some(*kind))
                        .into()
                })
                .collect(),
            ..Default::default()
        }))
    })?;
    Ok(first_item(pick_step_result(progress, selection)))
}

fn build_copy_changes_confirm(
    kind: ChangesKind,
    patch: &str,
    target: &Worktree,
    repo: &Repository,
    title: &str,
    open_count: usize,
) -> PickStep<()> {
    let files = patch.lines().filter(|l| l.starts_with("diff --git ")).count();
    let count = if files > 0 {
        format!(" ({})", pluralize("file", files))
    } else {
        String::new()
    };
    let name = target.name();
    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}  ·  {}", title, name),
            std::slice::from_ref(repo),
            open_count,
            "",
        ),
        vec![PickItem::new(format!("Copy {} to Worktree", kind.label()), ())
            .detail(format!("Will copy {}{} to worktree '{}'", kind.noun(), count, name))
            .into()],
        None,
        ConfirmOptions::default(),
    )
}

/// Where worktrees go when the user points at `picked`: a sibling
/// `<repo>.worktrees` folder, unless `picked` already is such a folder.
fn recommended_root(repo: &Repository, picked: &Path) -> PathBuf {
    let trailer = format!("{}.worktrees", repo.name);
    if picked.starts_with(&repo.path) {
        return repo
            .path
            .parent()
            .unwrap_or(&repo.path)
            .join(trailer);
    }
    if picked.file_name() == Some(OsStr::new(&trailer)) {
        return picked.to_path_buf();
    }
    picked.join(trailer)
}

fn flags_description(flags: CreateWorktreeFlags) -> Option<String> {
    let mut parts = Vec::new();
    if flags.new_branch {
        parts.push("-b");
    }
    if flags.direct {
        parts.push("--direct");
    }
    if flags.force {
        parts.push("--force");
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn create_item(
    current: &CreateWorktreeFlags,
    flags: CreateWorktreeFlags,
    root: &Path,
    label: &str,
    detail: String,
) -> PickEntry<CreateChoice> {
    let mut item = PickItem::new(
        label,
        CreateChoice::Create {
            root: root.to_path_buf(),
            flags,
        },
    )
    .detail(detail)
    .picked(*current == flags);
    if let Some(description) = flags_description(flags) {
        item = item.description(description);
    }
    item.into()
}

fn build_create_confirm(
    create: &CreateWorktreeState,
    repo: &Repository,
    folders: &FolderChoice,
    title: &str,
    open_count: usize,
) -> PickStep<CreateChoice> {
    let picked = folders
        .specific
        .as_deref()
        .or(create.path.as_deref())
        .unwrap_or(&repo.path);
    let direct = folders.specific.is_some() && picked != repo.path.as_path();
    let reference = create.reference.as_ref();
    let plain = if reference.is_some_and(GitReference::is_branch) {
        "Create Worktree for Branch"
    } else {
        title
    };
    let named = if reference.is_some_and(GitReference::is_remote_branch) {
        "Create Worktree for New Local Branch Named..."
    } else {
        "Create Worktree for New Branch Named..."
    };
    let current = &create.flags;
    let base = CreateWorktreeFlags {
        force: current.force,
        ..Default::default()
    };

    let mut entries = Vec::new();
    if direct {
        let flags = CreateWorktreeFlags {
            direct: true,
            ..base
        };
        let detail = format!("Will create worktree directly in {}", picked.display());
        if create.create_branch.is_none() {
            entries.push(create_item(current, flags, picked, plain, detail.clone()));
        }
        let flags = CreateWorktreeFlags {
            new_branch: true,
            ..flags
        };
        entries.push(create_item(current, flags, picked, named, detail));
    } else {
        let root = recommended_root(repo, picked);
        if create.create_branch.is_none() {
            let name = reference.map(|r| r.name()).unwrap_or_default();
            entries.push(create_item(
                current,
                base,
                &root,
                plain,
                format!("Will create worktree in {}", root.join(name).display()),
            ));
        }
        let name = create.create_branch.as_deref().unwrap_or("<new-branch-name>");
        let flags = CreateWorktreeFlags {
            new_branch: true,
            ..base
        };
        entries.push(create_item(
            current,
            flags,
            &root,
            named,
            format!("Will create worktree in {}", root.join(name).display()),
        ));
        entries.push(PickEntry::Separator(None));
        entries.push(
            PickItem::new("Change Root Folder...", CreateChoice::ChangeRoot)
                .description(picked.display().to_string())
                .into(),
        );
    }
    if direct {
        entries.push(PickEntry::Separator(None));
    }
    entries.push(PickItem::new("Choose a Specific Folder...", CreateChoice::ChooseFolder).into());

    let subject = create
        .create_branch
        .as_deref()
        .or(reference.map(|r| r.name()))
        .unwrap_or_default();
    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}  ·  {}", title, subject),
            std::slice::from_ref(repo),
            open_count,
            "",
        ),
        entries,
        None,
        ConfirmOptions::default(),
    )
}

fn choose_folder(
    ui: &mut dyn UserInterface,
    specific: bool,
    default_path: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    let request = FolderRequest {
        title: if specific {
            "Choose a Specific Folder for this Worktree".into()
        } else {
            "Choose a Different Root Folder for this Worktree".into()
        },
        default_path,
    };
    let step = create_custom_step(request.title.clone(), move |ui| {
        Ok(match ui.choose_folder(&request)? {
            Some(path) => Selection::Value(path),
            None => Selection::Directive(Directive::Back),
        })
    });
    Ok(match show_custom(ui, step)? {
        Selection::Value(path) => Some(path),
        _ => None,
    })
}

/// Ask how to proceed after git refused. `None` when the user cancels.
fn recover<T: Clone>(
    ui: &mut dyn UserInterface,
    title: &str,
    reason: &str,
    choices: Vec<PickEntry<T>>,
) -> Result<Option<T>> {
    let selection = show_pick(ui, || {
        Ok(create_confirm_step(
            title,
            choices.clone(),
            None,
            ConfirmOptions {
                placeholder: Some(reason.to_string()),
                disallow_back: true,
                ..Default::default()
            },
        ))
    })?;
    Ok(match selection {
        Selection::Value(picked) => picked.into_first(),
        _ => None,
    })
}

fn build_delete_confirm(
    delete: &DeleteWorktreeState,
    repo: &Repository,
    title: &str,
    open_count: usize,
) -> PickStep<bool> {
    let target = match delete.paths.as_slice() {
        [path] => format!("worktree in {}", path.display()),
        paths => pluralize("worktree", paths.len()),
    };
    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}", title),
            std::slice::from_ref(repo),
            open_count,
            "",
        ),
        vec![
            flags_item(
                &delete.force,
                false,
                title,
                None,
                Some(format!("Will delete {}", target)),
            ),
            flags_item(
                &delete.force,
                true,
                format!("Force {}", title),
                Some("including ANY UNCOMMITTED changes".into()),
                Some(format!("Will forcibly delete {}", target)),
            ),
        ],
        None,
        ConfirmOptions::default(),
    )
}

/// Before a forced delete, warn when the worktree has uncommitted changes.
/// False when the user cancels.
fn confirm_losing_changes(
    ui: &mut dyn UserInterface,
    git: &dyn GitProvider,
    path: &Path,
) -> Result<bool> {
    if !git.has_changes(path)? {
        return Ok(true);
    }
    let reason = format!(
        "The worktree in '{}' has uncommitted changes. Deleting it will permanently lose them",
        path.display()
    );
    let choices = vec![PickEntry::item("Force Delete", ())];
    Ok(recover(ui, "Delete Worktree", &reason, choices)?.is_some())
}

/// Delete one worktree, offering a forced retry when git refuses.
///
/// Returns false when the user declined and nothing further should be
/// deleted. A forced retry stays forced for the remaining paths.
fn delete_worktree(
    ui: &mut dyn UserInterface,
    git: &dyn GitProvider,
    repo: &Repository,
    path: &Path,
    force: &mut bool,
) -> Result<bool> {
    if *force && !confirm_losing_changes(ui, git, path)? {
        return Ok(false);
    }
    loop {
        let mut spinner = ui.start_spinner(&format!("Deleting worktree {}", path.display()));
        let error = match git.delete_worktree(repo, path, &WorktreeDeleteOptions { force: *force }) {
            Ok(()) => {
                spinner.finish_success(&format!("Deleted worktree {}", path.display()));
                return Ok(true);
            }
            Err(e) => e,
        };
        tracing::warn!("Deleting worktree {} failed: {}", path.display(), error);
        spinner.finish_error(&format!("Unable to delete worktree {}", path.display()));

        match error.worktree_delete_reason() {
            Some(WorktreeDeleteErrorReason::MainWorkingTree) => {
                ui.error("Unable to delete the main worktree");
                return Ok(true);
            }
            Some(reason) if !*force => {
                let message = if reason == WorktreeDeleteErrorReason::HasChanges {
                    format!(
                        "Unable to delete worktree because there are uncommitted changes in '{}'. Forcibly deleting it will permanently lose those changes",
                        path.display()
                    )
                } else {
                    format!(
                        "Unable to delete worktree in '{}'. Would you like to try to force delete it?",
                        path.display()
                    )
                };
                let choices = vec![PickEntry::item("Force Delete", ())];
                if recover(ui, "Delete Worktree", &message, choices)?.is_none() {
                    return Ok(true);
                }
                *force = true;
                // A refusal for uncommitted changes was just confirmed above.
                if reason != WorktreeDeleteErrorReason::HasChanges
                    && !confirm_losing_changes(ui, git, path)?
                {
                    return Ok(false);
                }
            }
            _ => {
                ui.error(&error.to_string());
                return Ok(true);
            }
        }
    }
}

fn location_item(
    current: OpenLocation,
    location: OpenLocation,
    description: Option<String>,
    detail: String,
) -> PickEntry<OpenLocation> {
    flags_item(&current, location, location.label(), description, Some(detail))
}

fn build_open_confirm(
    open: &OpenWorktreeState,
    worktree: &Worktree,
    repo: &Repository,
    open_count: usize,
) -> PickStep<OpenLocation> {
    let current = open.location.unwrap_or(OpenLocation::CurrentWindow);
    let name = worktree.name();
    let mut entries = vec![
        location_item(
            current,
            OpenLocation::CurrentWindow,
            None,
            format!("Will open the worktree {} in the current window", name),
        ),
        location_item(
            current,
            OpenLocation::NewWindow,
            None,
            format!("Will open the worktree {} in a new window", name),
        ),
        location_item(
            current,
            OpenLocation::AddToWorkspace,
            None,
            format!("Will add the worktree {} to the current workspace", name),
        ),
    ];
    if !open.open_only {
        entries.push(PickEntry::Separator(None));
        entries.push(location_item(
            current,
            OpenLocation::RevealInExplorer,
            Some(worktree.path.display().to_string()),
            format!("Will reveal the worktree {} in the file manager", name),
        ));
    }

    let title = open.confirm_title.clone().unwrap_or_else(|| {
        append_repos_to_title(
            &format!("Confirm {}  ·  {}", WorktreeSubcommand::Open.title(), name),
            std::slice::from_ref(repo),
            open_count,
            "",
        )
    });
    create_confirm_step(
        title,
        entries,
        None,
        ConfirmOptions {
            placeholder: open.confirm_placeholder.clone(),
            disallow_back: open.disallow_back,
            ..Default::default()
        },
    )
}

fn open_worktree(
    ui: &mut dyn UserInterface,
    worktree: &Worktree,
    location: OpenLocation,
) -> Result<()> {
    tracing::info!("Opening worktree {} ({:?})", worktree.path.display(), location);
    ui.open_folder(&worktree.path, location)
}

fn open_after_create(
    ui: &mut dyn UserInterface,
    git: &dyn GitProvider,
    repo: &Repository,
    worktree: &Worktree,
    policy: OpenAfterCreate,
    open_count: usize,
) -> Result<()> {
    let location = match policy {
        OpenAfterCreate::Never => return Ok(()),
        OpenAfterCreate::Always => OpenLocation::CurrentWindow,
        OpenAfterCreate::AlwaysNewWindow => OpenLocation::NewWindow,
        // A terminal session always has a working folder unless no
        // repository is open at all.
        OpenAfterCreate::OnlyWhenEmpty => {
            if !git.open_repositories().is_empty() {
                return Ok(());
            }
            OpenLocation::CurrentWindow
        }
        OpenAfterCreate::Prompt => return prompt_open(ui, repo, worktree, open_count),
    };
    open_worktree(ui, worktree, location)
}

/// Offer to open `worktree`; there is no going back from here.
fn prompt_open(
    ui: &mut dyn UserInterface,
    repo: &Repository,
    worktree: &Worktree,
    open_count: usize,
) -> Result<()> {
    let open = OpenWorktreeState {
        worktree: Some(worktree.clone()),
        open_only: true,
        disallow_back: true,
        ..Default::default()
    };
    let selection = show_pick(ui, || Ok(build_open_confirm(&open, worktree, repo, open_count)))?;
    match selection {
        Selection::Value(picked) => match picked.into_first() {
            Some(location) => open_worktree(ui, worktree, location),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

impl QuickCommand for WorktreeCommand {
    fn key(&self) -> &'static str {
        "worktree"
    }

    fn label(&self) -> &'static str {
        CommandKind::Worktree.label()
    }

    fn title(&self) -> String {
        match self.subcommand() {
            Some(subcommand) => subcommand.title().into(),
            None => MENU_TITLE.into(),
        }
    }

    fn description(&self) -> &'static str {
        CommandKind::Worktree.description()
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn picked_via(&self) -> PickedVia {
        self.via
    }

    fn can_skip_confirm(&self) -> bool {
        self.skip_confirm_override
            .unwrap_or(self.subcommand() == Some(WorktreeSubcommand::Open))
    }

    fn skip_confirm_key(&self) -> String {
        match self.subcommand() {
            Some(subcommand) => format!(
                "worktree-{}:{}",
                subcommand.as_str(),
                self.via.as_str()
            ),
            None => format!("worktree:{}", self.via.as_str()),
        }
    }

    fn steps(&mut self, ui: &mut dyn UserInterface) -> Result<StepResult<()>> {
        let repos = self.services.git.open_repositories();
        let mut tracker = SkipTracker::default();

        while self.state.progress.can_continue() {
            tracker.begin_pass(repos.len() == 1);
            if self.state.progress.needs(1, self.state.subcommand.is_some()) {
                let current = self.subcommand();
                let StepState { progress, data } = &mut self.state;
                match pick_subcommand(ui, progress, MENU_TITLE, current)? {
                    StepResult::Value(subcommand) => {
                        if current != Some(subcommand) {
                            data.subcommand = Some(subcommand.initial_state());
                            self.folders = FolderChoice::default();
                        }
                    }
                    StepResult::Break => {
                        progress.back_out();
                        break;
                    }
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                }
            }

            let title = self.title();
            if self.state.progress.needs(2, self.state.repo.is_some()) {
                if let [only] = repos.as_slice() {
                    if self.state.repo.is_none() {
                        self.state.progress.advance();
                    }
                    self.state.repo = Some(only.clone());
                } else {
                    let picked = self.state.repo.as_ref().map(|r| r.path.clone());
                    let StepState { progress, data } = &mut self.state;
                    match pick_repository(ui, progress, &repos, &title, picked.as_deref())? {
                        StepResult::Value(repo) => data.repo = Some(repo),
                        StepResult::Break => continue,
                        StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                    }
                }
            }

            let Some(repo) = self.state.repo.clone() else {
                invariant_violation("worktree steps reached without a repository");
            };
            let repo = self.services.git.common_repository(&repo)?.unwrap_or(repo);
            self.state.repo = Some(repo.clone());

            let pass = match self.subcommand() {
                Some(WorktreeSubcommand::Create) => {
                    self.create_pass(ui, &repo, repos.len(), &tracker)?
                }
                Some(WorktreeSubcommand::Delete) => {
                    self.delete_pass(ui, &repo, repos.len(), &tracker)?
                }
                Some(WorktreeSubcommand::Open) => {
                    self.open_pass(ui, &repo, repos.len(), &tracker)?
                }
                Some(WorktreeSubcommand::CopyChanges) => {
                    self.copy_changes_pass(ui, &repo, repos.len(), &tracker)?
                }
                None => invariant_violation("worktree steps reached without a subcommand"),
            };
            if let Pass::Redirect(args) = pass {
                return Ok(StepResult::Redirect(args));
            }
        }

        Ok(self.state.progress.outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, services, services_with};
    use crate::config::{WizardConfig, WorktreeSettings};
    use crate::git::{Branch, GitCall, GitError, MockGit};
    use crate::ui::{MockAnswer, MockUI};

    const REPO: &str = "/work/app";

    fn repo() -> Repository {
        Repository::new(REPO)
    }

    fn git() -> MockGit {
        MockGit::new()
            .with_repo(REPO)
            .with_branch(Branch::local(REPO, "main").as_current())
            .with_branch(Branch::local(REPO, "feature"))
            .with_branch(Branch::remote(REPO, "origin/feature"))
            .with_branch(Branch::remote(REPO, "origin/topic"))
            .with_worktree(Worktree::new(REPO, REPO).with_branch("main").as_main())
    }

    fn opening(policy: OpenAfterCreate) -> WizardConfig {
        WizardConfig {
            worktrees: WorktreeSettings {
                open_after_create: policy,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn create_args(reference: GitReference) -> WorktreeArgs {
        WorktreeArgs {
            confirm: None,
            state: WorktreeState {
                repo: Some(repo()),
                subcommand: Some(WorktreeSubcommandState::Create(CreateWorktreeState {
                    reference: Some(reference),
                    ..Default::default()
                })),
            },
        }
    }

    fn subcommand_args(state: WorktreeSubcommandState) -> WorktreeArgs {
        WorktreeArgs {
            confirm: None,
            state: WorktreeState {
                repo: None,
                subcommand: Some(state),
            },
        }
    }

    fn created(git: &MockGit) -> Vec<(PathBuf, WorktreeCreateOptions)> {
        git.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::CreateWorktree { path, options, .. } => Some((path, options)),
                _ => None,
            })
            .collect()
    }

    fn deleted(git: &MockGit) -> Vec<(PathBuf, bool)> {
        git.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::DeleteWorktree { path, options, .. } => Some((path, options.force)),
                _ => None,
            })
            .collect()
    }

    const FEATURE: &str = "/work/app.worktrees/feature";
    const PATCH: &str = concat!(
        "diff --git a/src/lib.rs b/src/lib.rs\n",
        "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n-old\n+new\n",
        "diff --git a/README.md b/README.md\n",
        "--- a/README.md\n+++ b/README.md\n@@ -1 +1 @@\n-a\n+b\n",
    );

    fn copy_args(changes: ChangesKind) -> WorktreeArgs {
        subcommand_args(WorktreeSubcommandState::CopyChanges(CopyChangesState {
            source: Some(Worktree::new(REPO, REPO).with_branch("main").as_main()),
            changes: Some(changes),
            target: Some(Worktree::new(REPO, FEATURE).with_branch("feature")),
        }))
    }

    fn applied(git: &MockGit) -> Vec<(PathBuf, String)> {
        git.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::ApplyPatch { path, patch } => Some((path, patch)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn worktrees_go_beside_the_repository() {
        let repo = repo();
        let sibling = PathBuf::from("/work/app.worktrees");
        assert_eq!(recommended_root(&repo, Path::new("/work/app")), sibling);
        assert_eq!(recommended_root(&repo, Path::new("/work/app/sub")), sibling);
        assert_eq!(
            recommended_root(&repo, Path::new("/trees/app.worktrees")),
            PathBuf::from("/trees/app.worktrees")
        );
        assert_eq!(
            recommended_root(&repo, Path::new("/trees")),
            PathBuf::from("/trees/app.worktrees")
        );
    }

    #[test]
    fn remote_branch_gets_a_local_branch_before_confirm() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::remote_branch(REPO, "origin/topic")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        let confirm = ui.picks()[0].clone();
        assert_eq!(confirm.title, "Confirm Create Worktree  ·  topic");
        assert_eq!(
            confirm.items[0].label,
            "Create Worktree for New Local Branch Named..."
        );
        assert_eq!(
            confirm.items[0].detail.as_deref(),
            Some("Will create worktree in /work/app.worktrees/topic")
        );
        assert_eq!(
            created(&git),
            vec![(
                PathBuf::from("/work/app.worktrees/topic"),
                WorktreeCreateOptions {
                    commitish: Some("origin/topic".into()),
                    create_branch: Some("topic".into()),
                    ..Default::default()
                }
            )]
        );
    }

    #[test]
    fn remote_branch_with_existing_local_keeps_full_name() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::remote_branch(REPO, "origin/feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(
            created(&git)[0].1.create_branch.as_deref(),
            Some("origin/feature")
        );
    }

    #[test]
    fn checked_out_branch_can_be_retried_on_a_new_branch() {
        let git = Rc::new(git().fail_next_worktree_create(GitError::WorktreeCreate {
            reason: WorktreeCreateErrorReason::AlreadyCheckedOut,
            message: "'feature' is already checked out".into(),
        }));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));
        ui.answer(MockAnswer::pick("Create New Branch"));
        ui.answer(MockAnswer::text("feature-2"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        let result = run(&mut command, &mut ui);

        assert!(matches!(result, StepResult::Value(())));
        let calls = created(&git);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, PathBuf::from("/work/app.worktrees/feature"));
        assert_eq!(calls[1].0, PathBuf::from("/work/app.worktrees/feature-2"));
        assert_eq!(calls[1].1.create_branch.as_deref(), Some("feature-2"));
        assert_eq!(calls[1].1.commitish.as_deref(), Some("feature"));
        assert_eq!(
            ui.picks()[1].placeholder.as_deref(),
            Some("Unable to create a new worktree because branch feature is already checked out")
        );
    }

    #[test]
    fn checked_out_branch_can_be_forced() {
        let git = Rc::new(git().fail_next_worktree_create(GitError::WorktreeCreate {
            reason: WorktreeCreateErrorReason::AlreadyCheckedOut,
            message: "already checked out".into(),
        }));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));
        ui.answer(MockAnswer::pick("Force Create"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        let calls = created(&git);
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.force);
        assert_eq!(ui.picks().len(), 2);
    }

    #[test]
    fn existing_folder_is_reported() {
        let git = Rc::new(git().fail_next_worktree_create(GitError::WorktreeCreate {
            reason: WorktreeCreateErrorReason::AlreadyExists,
            message: "already exists".into(),
        }));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));

        let mut command = WorktreeCommand::new(
            services(&git),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert!(ui.has_error(
            "Unable to create a new worktree in '/work/app.worktrees/feature' because the folder already exists and is not empty"
        ));
        assert!(ui.opened_folders().is_empty());
    }

    #[test]
    fn changing_the_root_folder_reshows_confirm() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Change Root Folder..."));
        ui.answer(MockAnswer::folder("/trees"));
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(
            created(&git)[0].0,
            PathBuf::from("/trees/app.worktrees/feature")
        );
    }

    #[test]
    fn specific_folder_creates_directly() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Choose a Specific Folder..."));
        ui.answer(MockAnswer::folder("/elsewhere/wt"));
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(created(&git)[0].0, PathBuf::from("/elsewhere/wt"));
        let confirm = ui.last_pick().unwrap();
        assert!(confirm.items.iter().all(|i| i.label != "Change Root Folder..."));
    }

    #[test]
    fn open_after_create_follows_policy() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::AlwaysNewWindow)),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(
            ui.opened_folders(),
            &[(
                PathBuf::from("/work/app.worktrees/feature"),
                OpenLocation::NewWindow
            )]
        );
        assert_eq!(ui.picks().len(), 1);
    }

    #[test]
    fn open_after_create_prompt_offers_only_opening() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));
        ui.answer(MockAnswer::pick("Open Worktree"));

        let mut command = WorktreeCommand::new(
            services(&git),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        let open = ui.last_pick().unwrap();
        assert!(!open.can_go_back);
        assert!(open
            .items
            .iter()
            .all(|i| i.label != OpenLocation::RevealInExplorer.label()));
        assert_eq!(ui.opened_folders()[0].1, OpenLocation::CurrentWindow);
    }

    #[test]
    fn delete_retries_with_force_when_worktree_has_changes() {
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, "/work/app.worktrees/old").with_branch("old"))
                .fail_next_worktree_delete(GitError::WorktreeDelete {
                    reason: WorktreeDeleteErrorReason::HasChanges,
                    message: "contains modified or untracked files".into(),
                }),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("old"));
        ui.answer(MockAnswer::pick("Delete Worktree"));
        ui.answer(MockAnswer::pick("Force Delete"));

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Delete(Default::default())),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        let path = PathBuf::from("/work/app.worktrees/old");
        assert_eq!(deleted(&git), vec![(path.clone(), false), (path, true)]);
        assert_eq!(ui.picks().len(), 3);
    }

    #[test]
    fn main_worktree_cannot_be_deleted() {
        let git = Rc::new(git().fail_next_worktree_delete(GitError::WorktreeDelete {
            reason: WorktreeDeleteErrorReason::MainWorkingTree,
            message: "is a main working tree".into(),
        }));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("app"));
        ui.answer(MockAnswer::pick("Delete Worktree"));

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Delete(Default::default())),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert!(ui.has_error("Unable to delete the main worktree"));
        assert_eq!(deleted(&git).len(), 1);
    }

    #[test]
    fn force_delete_of_changed_worktree_asks_first() {
        let path = "/work/app.worktrees/old";
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, path).with_branch("old"))
                .with_changes(path),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Force Delete Worktree"));
        ui.answer(MockAnswer::Cancel);

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Delete(DeleteWorktreeState {
                paths: vec![path.into()],
                force: false,
            })),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert!(deleted(&git).is_empty());
        assert!(ui
            .last_pick()
            .unwrap()
            .placeholder
            .as_deref()
            .is_some_and(|p| p.contains("has uncommitted changes")));
    }

    #[test]
    fn confirmed_force_delete_deletes_once() {
        let path = "/work/app.worktrees/old";
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, path).with_branch("old"))
                .with_changes(path),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Force Delete Worktree"));
        ui.answer(MockAnswer::pick("Force Delete"));

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Delete(DeleteWorktreeState {
                paths: vec![path.into()],
                force: false,
            })),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(deleted(&git), vec![(PathBuf::from(path), true)]);
        assert_eq!(ui.picks().len(), 2);
    }

    #[test]
    fn forced_retry_after_other_refusal_warns_about_changes() {
        let path = "/work/app.worktrees/old";
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, path).with_branch("old"))
                .with_changes(path)
                .fail_next_worktree_delete(GitError::WorktreeDelete {
                    reason: WorktreeDeleteErrorReason::Other,
                    message: "locked".into(),
                }),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Delete Worktree"));
        ui.answer(MockAnswer::pick("Force Delete"));
        ui.answer(MockAnswer::Cancel);

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Delete(DeleteWorktreeState {
                paths: vec![path.into()],
                force: false,
            })),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(deleted(&git), vec![(PathBuf::from(path), false)]);
        assert_eq!(ui.picks().len(), 3);
        assert!(ui
            .last_pick()
            .unwrap()
            .placeholder
            .as_deref()
            .is_some_and(|p| p.contains("has uncommitted changes")));
    }

    #[test]
    fn leaving_create_forgets_the_chosen_root() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("feature"));
        ui.answer(MockAnswer::pick("Change Root Folder..."));
        ui.answer(MockAnswer::folder("/trees"));
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::pick("create"));
        ui.answer(MockAnswer::pick("feature"));
        ui.answer(MockAnswer::pick("Create Worktree for Branch"));

        let mut command = WorktreeCommand::new(
            services_with(&git, opening(OpenAfterCreate::Never)),
            subcommand_args(WorktreeSubcommandState::Create(Default::default())),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(
            created(&git),
            vec![(
                PathBuf::from("/work/app.worktrees/feature"),
                WorktreeCreateOptions {
                    commitish: Some("feature".into()),
                    ..Default::default()
                }
            )]
        );
    }

    #[test]
    fn back_skips_a_given_single_repository() {
        let git = Rc::new(git().with_worktree(
            Worktree::new(REPO, "/work/app.worktrees/feature").with_branch("feature"),
        ));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::Cancel);

        let args = WorktreeArgs {
            confirm: None,
            state: WorktreeState {
                repo: Some(repo()),
                subcommand: Some(WorktreeSubcommandState::Open(Default::default())),
            },
        };
        run(
            &mut WorktreeCommand::new(services(&git), args, PickedVia::Menu),
            &mut ui,
        );

        assert_eq!(ui.titles(), vec!["Open Worktree", "Worktrees"]);
    }

    #[test]
    fn copy_working_changes_to_another_worktree() {
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, FEATURE).with_branch("feature"))
                .with_patch(REPO, false, PATCH),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("app"));
        ui.answer(MockAnswer::pick("Working Changes"));
        ui.answer(MockAnswer::pick("feature"));
        ui.answer(MockAnswer::pick("Copy Working Changes to Worktree"));
        ui.answer(MockAnswer::pick("Open Worktree"));

        let result = run(
            &mut WorktreeCommand::new(
                services(&git),
                subcommand_args(WorktreeSubcommandState::CopyChanges(Default::default())),
                PickedVia::Menu,
            ),
            &mut ui,
        );

        assert!(matches!(result, StepResult::Value(())));
        assert_eq!(
            ui.titles(),
            vec![
                "Copy Changes to Worktree",
                "Copy Changes to Worktree",
                "Copy Changes to Worktree",
                "Confirm Copy Changes to Worktree  ·  feature",
                "Confirm Open Worktree  ·  feature",
            ]
        );
        let targets: Vec<&str> = ui.picks()[2].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(targets, vec!["feature"]);
        assert_eq!(
            ui.picks()[3].items[0].detail.as_deref(),
            Some("Will copy working changes (2 files) to worktree 'feature'")
        );
        assert_eq!(applied(&git), vec![(PathBuf::from(FEATURE), PATCH.to_string())]);
        assert_eq!(
            ui.opened_folders(),
            &[(PathBuf::from(FEATURE), OpenLocation::CurrentWindow)]
        );
    }

    #[test]
    fn nothing_staged_means_nothing_to_copy() {
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, FEATURE).with_branch("feature"))
                .with_patch(REPO, false, PATCH),
        );
        let mut ui = MockUI::new();

        run(
            &mut WorktreeCommand::new(
                services(&git),
                copy_args(ChangesKind::Staged),
                PickedVia::Menu,
            ),
            &mut ui,
        );

        assert!(ui.has_error("No staged changes to copy from app"));
        assert!(ui.picks().is_empty());
        assert!(applied(&git).is_empty());
    }

    #[test]
    fn copied_changes_with_conflicts_still_offer_to_open() {
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, FEATURE).with_branch("feature"))
                .with_patch(REPO, true, PATCH)
                .fail_next_operation(GitError::ApplyPatch {
                    reason: ApplyPatchErrorReason::AppliedWithConflicts,
                    message: "Applied patch to 'src/lib.rs' with conflicts.".into(),
                }),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);
        ui.answer(MockAnswer::Cancel);

        run(
            &mut WorktreeCommand::new(
                services(&git),
                copy_args(ChangesKind::Staged),
                PickedVia::Menu,
            ),
            &mut ui,
        );

        assert!(ui.has_warning("Changes were copied with conflicts"));
        assert_eq!(ui.picks().len(), 2);
        assert_eq!(applied(&git).len(), 1);
        assert!(ui.opened_folders().is_empty());
    }

    #[test]
    fn copy_that_would_overwrite_is_refused() {
        let git = Rc::new(
            git()
                .with_worktree(Worktree::new(REPO, FEATURE).with_branch("feature"))
                .with_patch(REPO, false, PATCH)
                .fail_next_operation(GitError::ApplyPatch {
                    reason: ApplyPatchErrorReason::WouldOverwrite,
                    message: "src/lib.rs: does not match index".into(),
                }),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);

        run(
            &mut WorktreeCommand::new(
                services(&git),
                copy_args(ChangesKind::Working),
                PickedVia::Menu,
            ),
            &mut ui,
        );

        assert!(ui.has_error(
            "Unable to copy changes as some local changes would be overwritten"
        ));
        assert_eq!(ui.picks().len(), 1);
    }

    #[test]
    fn copy_changes_cannot_skip_confirmation() {
        let git = Rc::new(git());
        let command = WorktreeCommand::new(
            services(&git),
            copy_args(ChangesKind::Working),
            PickedVia::Command,
        );
        assert!(!command.can_skip_confirm());
        assert_eq!(command.skip_confirm_key(), "worktree-copy-changes:command");
    }

    #[test]
    fn open_in_new_window() {
        let path = "/work/app.worktrees/feature";
        let git = Rc::new(git().with_worktree(Worktree::new(REPO, path).with_branch("feature")));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("feature"));
        ui.answer(MockAnswer::pick("Open Worktree in a New Window"));

        let mut command = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Open(Default::default())),
            PickedVia::Menu,
        );
        run(&mut command, &mut ui);

        assert_eq!(
            ui.titles(),
            vec!["Open Worktree", "Confirm Open Worktree  ·  feature"]
        );
        assert_eq!(
            ui.opened_folders(),
            &[(PathBuf::from(path), OpenLocation::NewWindow)]
        );
    }

    #[test]
    fn open_only_confirmation_ignores_back() {
        let worktree = Worktree::new(REPO, "/work/app.worktrees/feature").with_branch("feature");
        let git = Rc::new(git().with_worktree(worktree.clone()));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::pick("Open Worktree"));

        let args = WorktreeArgs {
            confirm: None,
            state: WorktreeState {
                repo: Some(repo()),
                subcommand: Some(WorktreeSubcommandState::Open(OpenWorktreeState {
                    worktree: Some(worktree),
                    open_only: true,
                    disallow_back: true,
                    confirm_title: Some("Confirm Switch to Worktree  ·  feature".into()),
                    ..Default::default()
                })),
            },
        };
        let result = run(
            &mut WorktreeCommand::new(services(&git), args, PickedVia::Command),
            &mut ui,
        );

        assert!(matches!(result, StepResult::Value(())));
        assert!(ui
            .titles()
            .iter()
            .all(|t| *t == "Confirm Switch to Worktree  ·  feature"));
        assert_eq!(ui.opened_folders().len(), 1);
    }

    #[test]
    fn back_from_worktree_pick_returns_to_subcommands() {
        let git = Rc::new(git());
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("open"));
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::Back);

        let result = run(
            &mut WorktreeCommand::new(services(&git), WorktreeArgs::default(), PickedVia::Menu),
            &mut ui,
        );

        assert!(result.is_break());
        assert_eq!(ui.titles(), vec!["Worktrees", "Open Worktree", "Worktrees"]);
    }

    #[test]
    fn only_open_may_skip_confirmation() {
        let git = Rc::new(git());
        let open = WorktreeCommand::new(
            services(&git),
            subcommand_args(WorktreeSubcommandState::Open(Default::default())),
            PickedVia::Menu,
        );
        assert!(open.can_skip_confirm());
        assert_eq!(open.skip_confirm_key(), "worktree-open:menu");

        let create = WorktreeCommand::new(
            services(&git),
            create_args(GitReference::branch(REPO, "feature")),
            PickedVia::Command,
        );
        assert!(!create.can_skip_confirm());
        assert!(create.confirm(Some(false)));
        assert_eq!(create.skip_confirm_key(), "worktree-create:command");
    }

    #[test]
    fn linked_worktree_uses_the_common_repository() {
        let git = Rc::new(
            MockGit::new()
                .with_repo("/work/app.worktrees/feature")
                .with_common_repo("/work/app.worktrees/feature", repo())
                .with_worktree(Worktree::new(REPO, REPO).with_branch("main").as_main())
                .with_worktree(Worktree::new(REPO, "/work/app.worktrees/other").with_branch("other")),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);

        run(
            &mut WorktreeCommand::new(
                services(&git),
                subcommand_args(WorktreeSubcommandState::Open(Default::default())),
                PickedVia::Menu,
            ),
            &mut ui,
        );

        let labels: Vec<&str> = ui.picks()[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["app", "other"]);
    }
}
