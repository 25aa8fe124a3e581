//! `branch`: create, delete, prune and rename branches.
//!
//! Positions: 1 subcommand, 2 repository, then the subcommand's own steps
//! from 3. Creating a branch in a new worktree hands over to `worktree
//! create`.

use std::rc::Rc;

use crate::engine::{
    get_steps, invariant_violation, CommandArgs, CommandKind, CounterSeed, PickedVia, Progress,
    QuickCommand, Services, SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{
    name_without_remote, references_label, DeleteBranchOptions, GitReference, Repository,
    SwitchOptions,
};
use crate::steps::{
    create_confirm_step, create_pick_step, flags_item, pick_step_result, show_pick,
    ConfirmOptions, PickItem, PickStep, PickStepConfig, StepResult,
};
use crate::ui::UserInterface;

use super::common::{
    append_repos_to_title, first_item, input_branch_name, pick_branch, pick_branch_or_tag,
    pick_branches, pick_repository, run_operation, Pass, ReferencePickOptions,
};
use super::worktree::{
    CreateWorktreeFlags, CreateWorktreeState, WorktreeArgs, WorktreeState,
    WorktreeSubcommandState,
};

const MENU_TITLE: &str = "Branches";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSubcommand {
    Create,
    Delete,
    Prune,
    Rename,
}

impl BranchSubcommand {
    pub const ALL: [Self; 4] = [Self::Create, Self::Delete, Self::Prune, Self::Rename];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Prune => "prune",
            Self::Rename => "rename",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Create => "creates a new branch",
            Self::Delete => "deletes the specified branches",
            Self::Prune => "deletes local branches with missing upstreams",
            Self::Rename => "renames the specified branch",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Create => "Create Branch",
            Self::Delete => "Delete Branches",
            Self::Prune => "Prune Branches",
            Self::Rename => "Rename Branch",
        }
    }

    fn initial_state(self) -> BranchSubcommandState {
        match self {
            Self::Create => BranchSubcommandState::Create(CreateBranchState::default()),
            Self::Delete => BranchSubcommandState::Delete(DeleteBranchState::default()),
            Self::Prune => BranchSubcommandState::Prune(PruneBranchState::default()),
            Self::Rename => BranchSubcommandState::Rename(RenameBranchState::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateBranchFlags {
    pub switch: bool,
    /// Create the branch in a new worktree instead.
    pub worktree: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CreateBranchState {
    /// Start point of the new branch.
    pub reference: Option<GitReference>,
    pub name: Option<String>,
    /// Treat `name` as a suggestion: still show the name step, pre-filled.
    pub suggest_name_only: bool,
    pub flags: CreateBranchFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteBranchFlags {
    pub force: bool,
    /// Also delete the upstream branches on their remotes.
    pub remotes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteBranchState {
    pub references: Vec<GitReference>,
    pub flags: DeleteBranchFlags,
}

/// Pruning deletes like `delete`, over branches whose upstream is gone.
pub type PruneBranchState = DeleteBranchState;

#[derive(Debug, Clone, Default)]
pub struct RenameBranchState {
    pub reference: Option<GitReference>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum BranchSubcommandState {
    Create(CreateBranchState),
    Delete(DeleteBranchState),
    Prune(PruneBranchState),
    Rename(RenameBranchState),
}

impl BranchSubcommandState {
    pub fn kind(&self) -> BranchSubcommand {
        match self {
            Self::Create(_) => BranchSubcommand::Create,
            Self::Delete(_) => BranchSubcommand::Delete,
            Self::Prune(_) => BranchSubcommand::Prune,
            Self::Rename(_) => BranchSubcommand::Rename,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BranchState {
    pub repo: Option<Repository>,
    pub subcommand: Option<BranchSubcommandState>,
}

#[derive(Debug, Clone, Default)]
pub struct BranchArgs {
    pub confirm: Option<bool>,
    pub state: BranchState,
}

pub struct BranchCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<BranchState>,
}

impl BranchCommand {
    pub fn new(services: Rc<Services>, args: BranchArgs, via: PickedVia) -> Self {
        let state = &args.state;
        let seed = CounterSeed::new().field(&state.subcommand);
        let seed = match &state.subcommand {
            Some(BranchSubcommandState::Create(create)) => seed
                .field(&create.reference)
                .when(create.name.is_some() && !create.suggest_name_only),
            Some(BranchSubcommandState::Delete(delete))
            | Some(BranchSubcommandState::Prune(delete)) => seed.field(&delete.references),
            Some(BranchSubcommandState::Rename(rename)) => {
                seed.field(&rename.reference).field(&rename.name)
            }
            None => seed,
        };
        let counter = seed.field(&state.repo).value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
        }
    }

    fn subcommand(&self) -> Option<BranchSubcommand> {
        self.state.subcommand.as_ref().map(BranchSubcommandState::kind)
    }

    fn create_pass(
        &mut self,
        ui: &mut dyn UserInterface,
        repo: &Repository,
        open_count: usize,
        tracker: &SkipTracker,
    ) -> Result<Pass> {
        let services = Rc::clone(&self.services);
        let git = Rc::clone(&services.git);
        let title = self.title();
        let confirm = self.confirm(self.state.progress.confirm);

        let StepState { progress, data } = &mut self.state;
        let Some(BranchSubcommandState::Create(create)) = data.subcommand.as_mut() else {
            invariant_violation("branch create pass without create state");
        };

        if progress.needs(3, create.reference.is_some()) {
            let current = git.branch(repo, None)?.map(|b| b.name);
            let picked = create
                .reference
                .as_ref()
                .map(|r| r.ref_name().to_string())
                .or(current);
            let options = ReferencePickOptions {
                placeholder: "Choose a branch or tag to create the new branch from",
                picked: picked.as_deref(),
                ..Default::default()
            };
            match pick_branch_or_tag(ui, progress, &git, repo, &title, options)? {
                StepResult::Value(reference) => create.reference = Some(reference),
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(reference) = create.reference.clone() else {
            invariant_violation("branch create reached naming without a start point");
        };

        if progress.needs(4, create.name.is_some() && !create.suggest_name_only) {
            let value = create
                .name
                .clone()
                .or_else(|| Some(name_without_remote(&reference)));
            let input_title = format!("{} from {}", title, reference.label());
            match input_branch_name(ui, progress, &git, repo, &input_title, value)? {
                StepResult::Value(name) => {
                    create.name = Some(name);
                    create.suggest_name_only = false;
                }
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(name) = create.name.clone() else {
            invariant_violation("branch create reached confirmation without a name");
        };

        if confirm {
            let selection = show_pick(ui, || {
                Ok(build_create_confirm(create, &reference, &name, repo, &title, open_count))
            })?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(flags) => create.flags = flags,
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        if create.flags.worktree {
            let args = WorktreeArgs {
                confirm: None,
                state: WorktreeState {
                    repo: Some(repo.clone()),
                    subcommand: Some(WorktreeSubcommandState::Create(CreateWorktreeState {
                        reference: Some(reference),
                        create_branch: Some(name),
                        flags: CreateWorktreeFlags {
                            new_branch: true,
                            ..Default::default()
                        },
                        ..Default::default()
                    })),
                },
            };
            match get_steps(&services, ui, CommandArgs::Worktree(args), PickedVia::Command)? {
                StepResult::Value(()) => progress.end(),
                StepResult::Break => progress.back(),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
            return Ok(Pass::Continue);
        }

        progress.end();
        if create.flags.switch {
            let options = SwitchOptions {
                create_branch: Some(name.clone()),
            };
            run_operation(
                ui,
                &format!("Switching to new branch {}", name),
                &format!("Switched to new branch {}", name),
                || git.switch_to(std::slice::from_ref(repo), &reference, &options),
            );
        } else {
            run_operation(
                ui,
                &format!("Creating branch {}", name),
                &format!("Created branch {}", name),
                || git.create_branch(repo, &name, &reference),
            );
        }
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
        let (delete, prune) = match data.subcommand.as_mut() {
            Some(BranchSubcommandState::Delete(delete)) => (delete, false),
            Some(BranchSubcommandState::Prune(delete)) => (delete, true),
            _ => invariant_violation("branch delete pass without delete state"),
        };

        if progress.needs(3, !delete.references.is_empty()) {
            let picked: Vec<String> = delete
                .references
                .iter()
                .map(|r| r.ref_name().to_string())
                .collect();
            let empty = if prune {
                format!("No branches with missing upstreams in {}", repo.name)
            } else {
                "No branches found".to_string()
            };
            let result = pick_branches(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                "Choose branches to delete",
                &empty,
                |b| {
                    !b.current
                        && (!prune
                            || (!b.remote && b.upstream.as_ref().is_some_and(|u| u.missing)))
                },
                &picked,
            )?;
            match result {
                StepResult::Value(references) => delete.references = references,
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        if confirm {
            let selection = show_pick(ui, || {
                Ok(build_delete_confirm(delete, prune, repo, &title, open_count))
            })?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(flags) => delete.flags = flags,
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        progress.end();
        let label = references_label(&delete.references);
        let options = DeleteBranchOptions {
            force: delete.flags.force,
            remote: delete.flags.remotes,
        };
        run_operation(
            ui,
            &format!("Deleting {}", label),
            &format!("Deleted {}", label),
            || git.delete_branches(repo, &delete.references, &options),
        );
        Ok(Pass::Continue)
    }

    fn rename_pass(
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
        let Some(BranchSubcommandState::Rename(rename)) = data.subcommand.as_mut() else {
            invariant_violation("branch rename pass without rename state");
        };

        if progress.needs(3, rename.reference.is_some()) {
            match pick_branch(
                ui,
                progress,
                git.as_ref(),
                repo,
                &title,
                "Choose a branch to rename",
                |b| !b.remote,
            )? {
                StepResult::Value(reference) => rename.reference = Some(reference),
                StepResult::Break => {
                    tracker.back_past(progress);
                    return Ok(Pass::Continue);
                }
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(reference) = rename.reference.clone() else {
            invariant_violation("branch rename reached naming without a branch");
        };

        if progress.needs(4, rename.name.is_some()) {
            let value = rename
                .name
                .clone()
                .unwrap_or_else(|| reference.name().to_string());
            let input_title = format!("{}  ·  {}", title, reference.name());
            match input_branch_name(ui, progress, &git, repo, &input_title, Some(value))? {
                StepResult::Value(name) => rename.name = Some(name),
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        let Some(name) = rename.name.clone() else {
            invariant_violation("branch rename reached confirmation without a name");
        };

        if confirm {
            let selection = show_pick(ui, || {
                Ok(create_confirm_step(
                    append_repos_to_title(
                        &format!("Confirm {}", title),
                        std::slice::from_ref(repo),
                        open_count,
                        "",
                    ),
                    vec![flags_item(
                        &(),
                        (),
                        title.as_str(),
                        None,
                        Some(format!(
                            "Will rename {} to {}",
                            reference.label(),
                            name
                        )),
                    )],
                    None,
                    ConfirmOptions::default(),
                ))
            })?;
            match first_item(pick_step_result(progress, selection)) {
                StepResult::Value(()) => {}
                StepResult::Break => return Ok(Pass::Continue),
                StepResult::Redirect(args) => return Ok(Pass::Redirect(args)),
            }
        }

        progress.end();
        run_operation(
            ui,
            &format!("Renaming {} to {}", reference.name(), name),
            &format!("Renamed {} to {}", reference.name(), name),
            || git.rename_branch(repo, reference.name(), &name),
        );
        Ok(Pass::Continue)
    }
}

fn pick_subcommand(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    current: Option<BranchSubcommand>,
) -> Result<StepResult<BranchSubcommand>> {
    let selection = show_pick(ui, || {
        Ok(create_pick_step(PickStepConfig {
            title: MENU_TITLE.to_string(),
            placeholder: Some("Choose a branch command".into()),
            items: BranchSubcommand::ALL
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

fn build_create_confirm(
    create: &CreateBranchState,
    reference: &GitReference,
    name: &str,
    repo: &Repository,
    title: &str,
    open_count: usize,
) -> PickStep<CreateBranchFlags> {
    let current = &create.flags;
    let from = reference.label();
    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}", title),
            std::slice::from_ref(repo),
            open_count,
            "",
        ),
        vec![
            flags_item(
                current,
                CreateBranchFlags::default(),
                title,
                None,
                Some(format!("Will create a new branch named {} from {}", name, from)),
            ),
            flags_item(
                current,
                CreateBranchFlags {
                    switch: true,
                    worktree: false,
                },
                "Create & Switch to Branch",
                None,
                Some(format!(
                    "Will create and switch to a new branch named {} from {}",
                    name, from
                )),
            ),
            flags_item(
                current,
                CreateBranchFlags {
                    switch: false,
                    worktree: true,
                },
                format!("{} in New Worktree", title),
                Some("avoid modifying your working tree".into()),
                Some(format!(
                    "Will create a new worktree for a new branch named {} from {}",
                    name, from
                )),
            ),
        ],
        None,
        ConfirmOptions::default(),
    )
}

fn build_delete_confirm(
    delete: &DeleteBranchState,
    prune: bool,
    repo: &Repository,
    title: &str,
    open_count: usize,
) -> PickStep<DeleteBranchFlags> {
    let references = &delete.references;
    let current = &delete.flags;
    let label = references_label(references);
    let noun = if references.len() == 1 {
        "Branch"
    } else {
        "Branches"
    };

    let mut choices = vec![flags_item(
        current,
        DeleteBranchFlags::default(),
        format!("Delete {}", noun),
        None,
        Some(format!("Will delete {}", label)),
    )];

    if !references.iter().all(GitReference::is_remote_branch) {
        choices.push(flags_item(
            current,
            DeleteBranchFlags {
                force: true,
                remotes: false,
            },
            format!("Force Delete {}", noun),
            Some("--force".into()),
            Some(format!("Will forcibly delete {}", label)),
        ));

        let tracked = references.iter().any(|r| {
            r.as_branch().is_some_and(|b| {
                !b.remote && b.upstream.as_ref().is_some_and(|u| !u.missing)
            })
        });
        if !prune && tracked {
            choices.push(flags_item(
                current,
                DeleteBranchFlags {
                    force: false,
                    remotes: true,
                },
                format!("Delete {} & Remote{}", noun, if references.len() == 1 { "" } else { "s" }),
                Some("--remotes".into()),
                Some(format!("Will delete {} and any remote tracking branches", label)),
            ));
            choices.push(flags_item(
                current,
                DeleteBranchFlags {
                    force: true,
                    remotes: true,
                },
                format!(
                    "Force Delete {} & Remote{}",
                    noun,
                    if references.len() == 1 { "" } else { "s" }
                ),
                Some("--force --remotes".into()),
                Some(format!(
                    "Will forcibly delete {} and any remote tracking branches",
                    label
                )),
            ));
        }
    }

    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}", title),
            std::slice::from_ref(repo),
            open_count,
            "",
        ),
        choices,
        None,
        ConfirmOptions::default(),
    )
}

impl QuickCommand for BranchCommand {
    fn key(&self) -> &'static str {
        "branch"
    }

    fn label(&self) -> &'static str {
        CommandKind::Branch.label()
    }

    fn title(&self) -> String {
        match self.subcommand() {
            Some(subcommand) => subcommand.title().into(),
            None => MENU_TITLE.into(),
        }
    }

    fn description(&self) -> &'static str {
        CommandKind::Branch.description()
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn picked_via(&self) -> PickedVia {
        self.via
    }

    /// Destructive subcommands always confirm.
    fn can_skip_confirm(&self) -> bool {
        matches!(self.subcommand(), None | Some(BranchSubcommand::Create))
    }

    fn skip_confirm_key(&self) -> String {
        match self.subcommand() {
            Some(subcommand) => format!("branch-{}:{}", subcommand.as_str(), self.via.as_str()),
            None => format!("branch:{}", self.via.as_str()),
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
                match pick_subcommand(ui, progress, current)? {
                    StepResult::Value(subcommand) => {
                        if current != Some(subcommand) {
                            data.subcommand = Some(subcommand.initial_state());
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
                invariant_violation("branch steps reached without a repository");
            };

            let pass = match self.subcommand() {
                Some(BranchSubcommand::Create) => {
                    self.create_pass(ui, &repo, repos.len(), &tracker)?
                }
                Some(BranchSubcommand::Delete) | Some(BranchSubcommand::Prune) => {
                    self.delete_pass(ui, &repo, repos.len(), &tracker)?
                }
                Some(BranchSubcommand::Rename) => {
                    self.rename_pass(ui, &repo, repos.len(), &tracker)?
                }
                None => invariant_violation("branch steps reached without a subcommand"),
            };
            if let Pass::Redirect(args) = pass {
                return Ok(StepResult::Redirect(args));
            }
        }

        Ok(self.state.progress.outcome())
    }
}
