//! `switch` (alias `checkout`): switch one or more repositories to a branch,
//! tag or commit.
//!
//! Positions: 1 repositories, 2 reference, 3 confirm. The confirm step is
//! where a remote branch turns into a local one, and where switching can be
//! handed over to `worktree create` instead. Typed text that names no
//! reference becomes `branch create --switch`.

use std::rc::Rc;

use crate::engine::{
    get_steps, invariant_violation, CommandArgs, CommandKind, CounterSeed, PickedVia,
    QuickCommand, Services, SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{name_without_remote, GitReference, Repository, SwitchOptions};
use crate::steps::{
    create_confirm_step, pick_step_result, show_pick, ConfirmOptions, PickEntry, PickItem,
    PickStep, Picked, StepResult,
};
use crate::ui::{capitalize, pluralize, UserInterface};

use super::branch::{
    BranchArgs, BranchState, BranchSubcommandState, CreateBranchFlags, CreateBranchState,
};
use super::common::{
    append_repos_to_title, first_item, input_branch_name, pick_branch_or_tag_for_switch,
    pick_repositories, run_operation, ReferencePickOptions,
};
use super::worktree::{
    CreateWorktreeFlags, CreateWorktreeState, OpenWorktreeState, WorktreeArgs, WorktreeState,
    WorktreeSubcommandState,
};

const TITLE: &str = "Switch to...";

/// What the confirm step can settle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchChoice {
    Switch,
    SwitchViaWorktree,
    SwitchToLocalBranch,
    SwitchToLocalBranchAndFastForward,
    SwitchToLocalBranchViaWorktree,
    SwitchToNewBranch,
    SwitchToNewBranchViaWorktree,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchState {
    pub repos: Vec<Repository>,
    pub reference: Option<GitReference>,
    /// Create this local branch at `reference` while switching.
    pub create_branch: Option<String>,
    /// Fast-forward the switched-to branch to this reference afterwards.
    pub fast_forward_to: Option<GitReference>,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchArgs {
    pub confirm: Option<bool>,
    pub state: SwitchState,
}

/// Facts about the chosen reference that shape the confirm step.
#[derive(Debug, Default)]
struct Resolution {
    /// A local branch already tracking the chosen remote branch.
    local_branch: Option<GitReference>,
    /// The chosen remote branch has no local counterpart.
    prompt_to_create: bool,
}

pub struct SwitchCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<SwitchState>,
}

impl SwitchCommand {
    pub fn new(services: Rc<Services>, args: SwitchArgs, via: PickedVia) -> Self {
        let counter = CounterSeed::new()
            .field(&args.state.repos)
            .field(&args.state.reference)
            .value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
        }
    }

    fn resolve(&self, reference: &GitReference) -> Result<Resolution> {
        let Some(branch) = reference.as_branch().filter(|b| b.remote) else {
            return Ok(Resolution::default());
        };
        let Some(repo) = self.state.repos.first() else {
            return Ok(Resolution::default());
        };

        let mut tracking: Vec<_> = self
            .services
            .git
            .branches(repo)?
            .into_iter()
            .filter(|b| !b.remote && b.upstream.as_ref().is_some_and(|u| u.name == branch.name))
            .collect();
        tracking.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(match tracking.first() {
            Some(local) => Resolution {
                local_branch: Some(local.reference()),
                prompt_to_create: false,
            },
            None => Resolution {
                local_branch: None,
                prompt_to_create: true,
            },
        })
    }

    /// Hand over to another command; its value ends this one.
    fn delegate(&mut self, ui: &mut dyn UserInterface, args: CommandArgs) -> Result<Option<StepResult<()>>> {
        let services = Rc::clone(&self.services);
        match get_steps(&services, ui, args, PickedVia::Command)? {
            StepResult::Value(()) => {
                self.state.progress.end();
                Ok(None)
            }
            StepResult::Break => {
                self.state.progress.back();
                Ok(None)
            }
            StepResult::Redirect(args) => Ok(Some(StepResult::Redirect(args))),
        }
    }

    fn execute(&self, ui: &mut dyn UserInterface, reference: &GitReference) {
        let git = &self.services.git;
        let state = &self.state;
        let target = match state.repos.as_slice() {
            [repo] => repo.name.clone(),
            repos => pluralize("repository", repos.len()),
        };
        let options = SwitchOptions {
            create_branch: state.create_branch.clone(),
        };
        let switched = run_operation(
            ui,
            &format!("Switching {} to {}", target, reference.name()),
            &format!("Switched {} to {}", target, reference.name()),
            || git.switch_to(&state.repos, reference, &options),
        );

        if let (true, Some(upstream), Some(repo)) =
            (switched, &state.fast_forward_to, state.repos.first())
        {
            run_operation(
                ui,
                &format!("Fast-forwarding {} to {}", reference.name(), upstream.name()),
                &format!("Fast-forwarded {} to {}", reference.name(), upstream.name()),
                || git.merge_fast_forward(repo, upstream),
            );
        }
    }
}

fn worktree_create_args(
    repo: &Repository,
    reference: GitReference,
    create_branch: Option<String>,
) -> CommandArgs {
    let new_branch = create_branch.is_some();
    CommandArgs::Worktree(WorktreeArgs {
        confirm: None,
        state: WorktreeState {
            repo: Some(repo.clone()),
            subcommand: Some(WorktreeSubcommandState::Create(CreateWorktreeState {
                reference: Some(reference),
                create_branch,
                flags: CreateWorktreeFlags {
                    new_branch,
                    ..Default::default()
                },
                ..Default::default()
            })),
        },
    })
}

fn in_repos(repos: &[Repository]) -> String {
    if repos.len() > 1 {
        format!(" in {}", pluralize("repository", repos.len()))
    } else {
        String::new()
    }
}

fn build_confirm(
    state: &SwitchState,
    reference: &GitReference,
    resolution: &Resolution,
    open_count: usize,
) -> PickStep<SwitchChoice> {
    let repos = &state.repos;
    let single = repos.len() == 1;
    let is_local = reference.is_local_branch();
    let label = reference.label();
    let named = state
        .create_branch
        .as_deref()
        .map(|name| format!(" named {}", name))
        .unwrap_or_default();

    let mut entries: Vec<PickEntry<SwitchChoice>> = Vec::new();
    if state.create_branch.is_none() {
        if let Some(local) = &resolution.local_branch {
            entries.push(PickEntry::separator("Local"));
            entries.push(
                PickItem::new("Switch to Local Branch", SwitchChoice::SwitchToLocalBranch)
                    .detail(format!("Will switch to local {} for {}", local.label(), label))
                    .into(),
            );
            if single {
                entries.push(
                    PickItem::new(
                        "Switch to Local Branch & Fast-Forward",
                        SwitchChoice::SwitchToLocalBranchAndFastForward,
                    )
                    .detail(format!("Will switch to and fast-forward local {}", local.label()))
                    .into(),
                );
            }
        } else if is_local {
            entries.push(
                PickItem::new("Switch to Branch", SwitchChoice::Switch)
                    .detail(format!("Will switch to {}{}", label, in_repos(repos)))
                    .into(),
            );
        }
    }

    if !is_local || state.create_branch.is_some() || resolution.prompt_to_create {
        if !entries.is_empty() {
            entries.push(PickEntry::separator("Remote"));
        }
        entries.push(
            PickItem::new("Switch to New Local Branch", SwitchChoice::SwitchToNewBranch)
                .detail(format!(
                    "Will create and switch to a new local branch{} from {}{}",
                    named,
                    label,
                    in_repos(repos)
                ))
                .into(),
        );
    }

    if single {
        if !entries.is_empty() {
            entries.push(PickEntry::separator("Worktree"));
        }
        let item = if is_local {
            PickItem::new("Create Worktree for Branch...", SwitchChoice::SwitchViaWorktree)
                .detail(format!("Will create a new worktree for {}", label))
        } else if let (None, Some(local)) = (&state.create_branch, &resolution.local_branch) {
            PickItem::new(
                "Create Worktree for Local Branch...",
                SwitchChoice::SwitchToLocalBranchViaWorktree,
            )
            .detail(format!("Will create a new worktree for local {}", local.label()))
        } else {
            PickItem::new(
                "Create Worktree for New Local Branch...",
                SwitchChoice::SwitchToNewBranchViaWorktree,
            )
            .detail(format!(
                "Will create a new worktree for a new local branch{} from {}",
                named, label
            ))
        };
        entries.push(item.description("avoid modifying your working tree").into());
    }

    if !is_local {
        let detached = if !reference.is_branch() {
            Some(format!("Checkout to {}", capitalize(reference.kind_label())))
        } else if state.create_branch.is_none() {
            Some("Checkout to Remote Branch".to_string())
        } else {
            None
        };
        if let Some(detached) = detached {
            if !entries.is_empty() {
                entries.push(PickEntry::Separator(None));
            }
            entries.push(
                PickItem::new(detached, SwitchChoice::Switch)
                    .description("(detached)")
                    .detail(format!("Will checkout to {}{}", label, in_repos(repos)))
                    .into(),
            );
        }
    }

    create_confirm_step(
        append_repos_to_title(
            &format!("Confirm Switch to {}", capitalize(&label)),
            repos,
            open_count,
            "",
        ),
        entries,
        None,
        ConfirmOptions {
            placeholder: Some(format!("Confirm {}", TITLE)),
            ..Default::default()
        },
    )
}

impl QuickCommand for SwitchCommand {
    fn key(&self) -> &'static str {
        "switch"
    }

    fn label(&self) -> &'static str {
        CommandKind::Switch.label()
    }

    fn title(&self) -> String {
        TITLE.into()
    }

    fn description(&self) -> &'static str {
        CommandKind::Switch.description()
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn picked_via(&self) -> PickedVia {
        self.via
    }

    fn steps(&mut self, ui: &mut dyn UserInterface) -> Result<StepResult<()>> {
        let git = Rc::clone(&self.services.git);
        let repos = git.open_repositories();
        let mut tracker = SkipTracker::default();

        while self.state.progress.can_continue() {
            tracker.begin_pass(repos.len() == 1);
            if self.state.progress.needs(1, !self.state.repos.is_empty()) {
                if let [only] = repos.as_slice() {
                    if self.state.repos.is_empty() {
                        self.state.progress.advance();
                    }
                    self.state.repos = vec![only.clone()];
                } else {
                    let StepState { progress, data } = &mut self.state;
                    match pick_repositories(ui, progress, &repos, TITLE, &data.repos)? {
                        StepResult::Value(picked) => data.repos = picked,
                        StepResult::Break => {
                            progress.back_out();
                            break;
                        }
                        StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                    }
                }
            }

            if self.state.progress.needs(2, self.state.reference.is_some()) {
                let picked = self
                    .state
                    .reference
                    .as_ref()
                    .map(|r| r.ref_name().to_string());
                let options = ReferencePickOptions {
                    placeholder: "Choose a branch or tag to switch to",
                    picked: picked.as_deref(),
                    ..Default::default()
                };
                let StepState { progress, data } = &mut self.state;
                let result =
                    pick_branch_or_tag_for_switch(ui, progress, &git, &data.repos, TITLE, options)?;
                match result {
                    StepResult::Value(Picked::Items(references)) => {
                        data.reference = references.into_iter().next();
                        data.create_branch = None;
                        data.fast_forward_to = None;
                    }
                    StepResult::Value(Picked::Text(name)) => {
                        let [repo] = data.repos.as_slice() else {
                            ui.warning(&format!(
                                "No branch or tag named '{}' exists in every repository",
                                name
                            ));
                            progress.back();
                            continue;
                        };
                        tracing::debug!("Creating branch {} to switch to", name);
                        let args = CommandArgs::Branch(BranchArgs {
                            confirm: None,
                            state: BranchState {
                                repo: Some(repo.clone()),
                                subcommand: Some(BranchSubcommandState::Create(
                                    CreateBranchState {
                                        name: Some(name),
                                        suggest_name_only: true,
                                        flags: CreateBranchFlags {
                                            switch: true,
                                            worktree: false,
                                        },
                                        ..Default::default()
                                    },
                                )),
                            },
                        });
                        let services = Rc::clone(&self.services);
                        if let StepResult::Redirect(args) =
                            get_steps(&services, ui, args, PickedVia::Command)?
                        {
                            return Ok(StepResult::Redirect(args));
                        }
                        self.state.progress.end();
                        break;
                    }
                    StepResult::Break => {
                        tracker.back_past(progress);
                        continue;
                    }
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                }
            }

            let Some(reference) = self.state.reference.clone() else {
                invariant_violation("switch reached confirmation without a reference");
            };
            let Some(repo) = self.state.repos.first().cloned() else {
                invariant_violation("switch reached confirmation without a repository");
            };

            if reference.is_local_branch() {
                self.state.create_branch = None;

                let linked = git
                    .worktrees(&repo)?
                    .into_iter()
                    .find(|w| !w.main && w.branch.as_deref() == Some(reference.name()));
                if let Some(worktree) = linked {
                    if let Some(upstream) = &self.state.fast_forward_to {
                        run_operation(
                            ui,
                            &format!("Fast-forwarding {} to {}", reference.name(), upstream.name()),
                            &format!("Fast-forwarded {} to {}", reference.name(), upstream.name()),
                            || git.merge_fast_forward(&repo, upstream),
                        );
                    }
                    let args = CommandArgs::Worktree(WorktreeArgs {
                        confirm: None,
                        state: WorktreeState {
                            repo: Some(repo.clone()),
                            subcommand: Some(WorktreeSubcommandState::Open(OpenWorktreeState {
                                worktree: Some(worktree),
                                open_only: true,
                                disallow_back: true,
                                confirm_title: Some(format!(
                                    "Confirm Switch to Worktree  ·  {}",
                                    reference.name()
                                )),
                                confirm_placeholder: Some(format!(
                                    "{} is linked to a worktree",
                                    capitalize(&reference.label())
                                )),
                                ..Default::default()
                            })),
                        },
                    });
                    if let Some(redirect) = self.delegate(ui, args)? {
                        return Ok(redirect);
                    }
                    continue;
                }
            }

            let resolution = self.resolve(&reference)?;
            if resolution.local_branch.is_some() {
                self.state.create_branch = None;
            }

            let requested = if resolution.prompt_to_create || resolution.local_branch.is_some() {
                Some(true)
            } else {
                self.state.progress.confirm
            };
            if self.confirm(requested) {
                let StepState { progress, data } = &mut self.state;
                let selection = show_pick(ui, || {
                    Ok(build_confirm(data, &reference, &resolution, repos.len()))
                })?;
                let choice = match first_item(pick_step_result(progress, selection)) {
                    StepResult::Value(choice) => choice,
                    StepResult::Break => continue,
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                };

                match choice {
                    SwitchChoice::Switch => {}
                    SwitchChoice::SwitchToLocalBranch
                    | SwitchChoice::SwitchToLocalBranchAndFastForward => {
                        let Some(local) = resolution.local_branch else {
                            invariant_violation("local branch choice without a local branch");
                        };
                        if choice == SwitchChoice::SwitchToLocalBranchAndFastForward {
                            data.fast_forward_to = Some(reference);
                        }
                        data.reference = Some(local);
                        // Confirm again for the local branch at the same position.
                        progress.back();
                        continue;
                    }
                    SwitchChoice::SwitchToNewBranch => {
                        let value = data
                            .create_branch
                            .clone()
                            .or_else(|| Some(name_without_remote(&reference)));
                        let title = format!("Switch to New Branch from {}", reference.label());
                        match input_branch_name(ui, progress, &git, &repo, &title, value)? {
                            StepResult::Value(name) => data.create_branch = Some(name),
                            StepResult::Break => continue,
                            StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                        }
                    }
                    SwitchChoice::SwitchViaWorktree
                    | SwitchChoice::SwitchToLocalBranchViaWorktree
                    | SwitchChoice::SwitchToNewBranchViaWorktree => {
                        let (target, create_branch) = match choice {
                            SwitchChoice::SwitchToLocalBranchViaWorktree => (
                                resolution.local_branch.unwrap_or_else(|| reference.clone()),
                                None,
                            ),
                            SwitchChoice::SwitchToNewBranchViaWorktree => {
                                (reference.clone(), data.create_branch.clone())
                            }
                            _ => (reference.clone(), None),
                        };
                        // Undo the confirm's advance; a back out of the worktree
                        // flow lands on this confirm again.
                        progress.back();
                        let args = worktree_create_args(&repo, target, create_branch);
                        match get_steps(&self.services, ui, args, PickedVia::Command)? {
                            StepResult::Value(()) => self.state.progress.end(),
                            StepResult::Break => {}
                            StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                        }
                        continue;
                    }
                }
            }

            self.state.progress.end();
            self.execute(ui, &reference);
        }

        Ok(self.state.progress.outcome())
    }
}
