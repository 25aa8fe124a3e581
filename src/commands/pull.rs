//! `pull`: fetch and integrate remote changes into the current branch.

use std::rc::Rc;

use crate::engine::{
    invariant_violation, CommandKind, CounterSeed, PickedVia, QuickCommand, Services,
    SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{GitProvider, GitReference, PullOptions, Repository};
use crate::steps::{
    create_confirm_step, flags_item, pick_step_result, show_pick, ConfirmOptions, Directive,
    DirectiveItem, PickStep, StepResult,
};
use crate::ui::{last_fetched_suffix, pluralize, UserInterface};

use super::common::{append_repos_to_title, fetch_button, first_item, pick_repositories, run_operation};

/// Flags chosen on the confirm step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullFlags {
    pub rebase: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PullState {
    pub repos: Vec<Repository>,
    /// Pull only this branch; a non-current branch is fetched instead.
    pub reference: Option<GitReference>,
    pub flags: PullFlags,
}

#[derive(Debug, Clone, Default)]
pub struct PullArgs {
    pub confirm: Option<bool>,
    pub state: PullState,
}

pub struct PullCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<PullState>,
}

impl PullCommand {
    pub fn new(services: Rc<Services>, args: PullArgs, via: PickedVia) -> Self {
        let counter = CounterSeed::new().field(&args.state.repos).value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
        }
    }

    fn execute(&self, ui: &mut dyn UserInterface) -> Result<()> {
        let git = self.services.git.as_ref();
        let repos = &self.state.repos;
        let Some(first) = repos.first() else {
            invariant_violation("pull executed without a repository");
        };

        if let Some(reference) = self.state.reference.as_ref().filter(|r| r.is_branch()) {
            let current = git.branch(first, None)?;
            if current.map(|b| b.name).as_deref() != Some(reference.name()) {
                run_operation(
                    ui,
                    &format!("Pulling {}", reference.label()),
                    &format!("Pulled {}", reference.label()),
                    || git.fetch_branch(first, reference, true),
                );
                return Ok(());
            }
        }

        let target = match repos.as_slice() {
            [repo] => repo.name.clone(),
            _ => pluralize("repository", repos.len()),
        };
        let options = PullOptions {
            rebase: self.state.flags.rebase,
        };
        run_operation(
            ui,
            &format!("Pulling {}", target),
            &format!("Pulled {}", target),
            || git.pull_all(repos, &options),
        );
        Ok(())
    }

    fn confirm_step(
        &mut self,
        ui: &mut dyn UserInterface,
        title: &str,
        open_count: usize,
    ) -> Result<StepResult<PullFlags>> {
        let git = Rc::clone(&self.services.git);
        let selection =
            show_pick(ui, || build_confirm(&git, &self.state.data, title, open_count))?;
        Ok(first_item(pick_step_result(&mut self.state.progress, selection)))
    }
}

fn build_confirm(
    git: &Rc<dyn GitProvider>,
    state: &PullState,
    title: &str,
    open_count: usize,
) -> Result<PickStep<PullFlags>> {
    let repos = &state.repos;
    let confirm_title = append_repos_to_title(&format!("Confirm {}", title), repos, open_count, "");
    let current = &state.flags;

    if repos.len() > 1 {
        return Ok(create_confirm_step(
            confirm_title,
            vec![
                flags_item(
                    current,
                    PullFlags::default(),
                    title,
                    None,
                    Some(format!("Will pull {}", pluralize("repository", repos.len()))),
                ),
                flags_item(
                    current,
                    PullFlags { rebase: true },
                    format!("{} with Rebase", title),
                    Some("--rebase".into()),
                    Some(format!(
                        "Will pull {} by rebasing",
                        pluralize("repository", repos.len())
                    )),
                ),
            ],
            None,
            ConfirmOptions::default(),
        ));
    }

    let Some(repo) = repos.first() else {
        invariant_violation("pull confirm step reached without a repository");
    };

    if let Some(GitReference::Branch(reference)) = &state.reference {
        if reference.remote {
            return Ok(cancel_only(confirm_title, title, "Cannot pull a remote branch"));
        }
        return Ok(match git.branch(repo, Some(&reference.name))? {
            Some(branch) if branch.upstream.is_some() => {
                let label = branch.reference().label();
                let detail = if branch.state.behind > 0 {
                    format!(
                        "Will pull {} into {}",
                        pluralize("commit", branch.state.behind as usize),
                        label
                    )
                } else {
                    format!("Will pull into {}", label)
                };
                create_confirm_step(
                    confirm_title,
                    vec![flags_item(current, PullFlags::default(), title, None, Some(detail))],
                    None,
                    ConfirmOptions::default(),
                )
            }
            _ => cancel_only(
                confirm_title,
                title,
                "Cannot pull a branch until it has been published",
            ),
        });
    }

    let status = git.status(repo)?;
    let last_fetched = git.last_fetched(repo)?;
    let details = match &status {
        Some(status) => format!(
            " {} into {}",
            pluralize("commit", status.state.behind as usize),
            repo.name
        ),
        None => format!(" into {}", repo.name),
    };

    Ok(create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}", title),
            repos,
            open_count,
            &last_fetched_suffix(last_fetched),
        ),
        vec![
            flags_item(
                current,
                PullFlags::default(),
                title,
                None,
                Some(format!("Will pull{}", details)),
            ),
            flags_item(
                current,
                PullFlags { rebase: true },
                format!("{} with Rebase", title),
                Some("--rebase".into()),
                Some(format!("Will pull and rebase{}", details)),
            ),
        ],
        None,
        ConfirmOptions {
            buttons: vec![fetch_button(git, repos)],
            ..Default::default()
        },
    ))
}

fn cancel_only(confirm_title: String, title: &str, reason: &str) -> PickStep<PullFlags> {
    create_confirm_step(
        confirm_title,
        Vec::new(),
        Some(
            DirectiveItem::new(Directive::Cancel)
                .label(format!("Cancel {}", title))
                .detail(reason),
        ),
        ConfirmOptions::default(),
    )
}

impl QuickCommand for PullCommand {
    fn key(&self) -> &'static str {
        "pull"
    }

    fn label(&self) -> &'static str {
        CommandKind::Pull.label()
    }

    fn title(&self) -> String {
        "Pull".into()
    }

    fn description(&self) -> &'static str {
        CommandKind::Pull.description()
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn picked_via(&self) -> PickedVia {
        self.via
    }

    fn steps(&mut self, ui: &mut dyn UserInterface) -> Result<StepResult<()>> {
        let repos = self.services.git.open_repositories();
        let mut tracker = SkipTracker::default();

        while self.state.progress.can_continue() {
            tracker.begin_pass(repos.len() == 1);
            let title = self.title();

            if self.state.progress.needs(1, !self.state.repos.is_empty()) {
                if let [only] = repos.as_slice() {
                    if self.state.repos.is_empty() {
                        self.state.progress.advance();
                    }
                    self.state.repos = vec![only.clone()];
                } else {
                    let StepState { progress, data } = &mut self.state;
                    match pick_repositories(ui, progress, &repos, &title, &data.repos)? {
                        StepResult::Value(picked) => data.repos = picked,
                        StepResult::Break => {
                            progress.back_out();
                            break;
                        }
                        StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                    }
                }
            }

            if self.confirm(self.state.progress.confirm) {
                match self.confirm_step(ui, &title, repos.len())? {
                    StepResult::Value(flags) => self.state.flags = flags,
                    StepResult::Break => {
                        tracker.back_past(&mut self.state.progress);
                        continue;
                    }
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                }
            }

            self.state.progress.end();
            self.execute(ui)?;
        }

        Ok(self.state.progress.outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, services, services_skipping};
    use crate::git::{Branch, GitCall, MockGit, RepoStatus, TrackingState, Upstream};
    use crate::ui::{MockAnswer, MockUI};

    const REPO: &str = "/work/app";

    fn single_repo() -> Rc<MockGit> {
        Rc::new(
            MockGit::new().with_repo(REPO).with_branch(
                Branch::local(REPO, "main")
                    .as_current()
                    .with_upstream(Upstream::new("origin/main")),
            ),
        )
    }

    fn pull(git: &Rc<MockGit>, args: PullArgs) -> PullCommand {
        PullCommand::new(services(git), args, PickedVia::Menu)
    }

    #[test]
    fn single_repository_goes_straight_to_confirm() {
        let git = single_repo();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Pull with Rebase"));

        let result = run(&mut pull(&git, PullArgs::default()), &mut ui);

        assert!(matches!(result, StepResult::Value(())));
        assert_eq!(ui.titles(), vec!["Confirm Pull"]);
        assert_eq!(
            git.calls(),
            vec![GitCall::Pull {
                repos: vec![REPO.into()],
                options: PullOptions { rebase: true },
            }]
        );
    }

    #[test]
    fn back_from_confirm_leaves_when_repository_was_skipped() {
        let git = single_repo();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Back);

        let mut command = pull(&git, PullArgs::default());
        let result = run(&mut command, &mut ui);

        assert!(result.is_break());
        assert!(git.calls().is_empty());
    }

    #[test]
    fn cancel_is_not_a_break() {
        let git = single_repo();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        let result = run(&mut pull(&git, PullArgs::default()), &mut ui);
        assert!(matches!(result, StepResult::Value(())));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn fetch_button_rebuilds_with_new_counts() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_status(REPO, RepoStatus::default())
                .with_status_after_fetch(
                    REPO,
                    RepoStatus {
                        branch: Some("main".into()),
                        state: TrackingState::new(0, 3),
                        ..Default::default()
                    },
                ),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::button("Fetch"));
        ui.answer(MockAnswer::pick("Pull"));

        run(&mut pull(&git, PullArgs::default()), &mut ui);

        let picks = ui.picks();
        assert_eq!(picks.len(), 2);
        assert_eq!(
            picks[0].items[0].detail.as_deref(),
            Some("Will pull 0 commits into app")
        );
        assert_eq!(
            picks[1].items[0].detail.as_deref(),
            Some("Will pull 3 commits into app")
        );
        assert_eq!(git.calls()[0], GitCall::Fetch { repo: REPO.into() });
        assert!(matches!(git.calls()[1], GitCall::Pull { .. }));
    }

    #[test]
    fn non_current_branch_is_fetched() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_branch(Branch::local(REPO, "main").as_current())
                .with_branch(
                    Branch::local(REPO, "feature")
                        .with_upstream(Upstream::new("origin/feature"))
                        .with_state(0, 2),
                ),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Pull"));

        let args = PullArgs {
            confirm: None,
            state: PullState {
                repos: vec![Repository::new(REPO)],
                reference: Some(GitReference::branch(REPO, "feature")),
                ..Default::default()
            },
        };
        run(&mut pull(&git, args), &mut ui);

        assert_eq!(
            ui.last_pick().unwrap().items[0].detail.as_deref(),
            Some("Will pull 2 commits into branch feature")
        );
        assert_eq!(
            git.calls(),
            vec![GitCall::FetchBranch {
                repo: REPO.into(),
                branch: "feature".into(),
                pull: true,
            }]
        );
    }

    #[test]
    fn remote_branch_cannot_be_pulled() {
        let git = single_repo();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Cancel Pull"));

        let args = PullArgs {
            confirm: None,
            state: PullState {
                reference: Some(GitReference::remote_branch(REPO, "origin/main")),
                ..Default::default()
            },
        };
        let result = run(&mut pull(&git, args), &mut ui);

        assert!(matches!(result, StepResult::Value(())));
        let pick = ui.last_pick().unwrap();
        assert_eq!(pick.items.len(), 1);
        assert_eq!(pick.items[0].detail.as_deref(), Some("Cannot pull a remote branch"));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn unpublished_branch_cannot_be_pulled() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_branch(Branch::local(REPO, "wip").as_current()),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        let args = PullArgs {
            confirm: None,
            state: PullState {
                reference: Some(GitReference::branch(REPO, "wip")),
                ..Default::default()
            },
        };
        run(&mut pull(&git, args), &mut ui);
        assert!(ui.last_pick().unwrap().items[0]
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("published")));
    }

    #[test]
    fn several_repositories_are_picked_then_confirmed() {
        let git = Rc::new(MockGit::new().with_repo(REPO).with_repo("/work/lib"));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick_all(["app", "lib"]));
        ui.answer(MockAnswer::pick("Pull"));

        run(&mut pull(&git, PullArgs::default()), &mut ui);

        assert_eq!(
            ui.titles(),
            vec!["Pull", "Confirm Pull  ·  2 repositories"]
        );
        assert_eq!(
            ui.last_pick().unwrap().items[0].detail.as_deref(),
            Some("Will pull 2 repositories")
        );
        assert!(matches!(&git.calls()[0], GitCall::Pull { repos, .. } if repos.len() == 2));
    }

    #[test]
    fn back_from_confirm_returns_to_repositories() {
        let git = Rc::new(MockGit::new().with_repo(REPO).with_repo("/work/lib"));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("app"));
        ui.answer(MockAnswer::Back);
        ui.answer(MockAnswer::Back);

        let result = run(&mut pull(&git, PullArgs::default()), &mut ui);

        assert!(result.is_break());
        assert_eq!(ui.titles(), vec!["Pull", "Confirm Pull  ·  app", "Pull"]);
    }

    #[test]
    fn configured_skip_executes_without_confirm() {
        let git = single_repo();
        let mut ui = MockUI::new();
        let mut command =
            PullCommand::new(services_skipping(&git, &["pull:menu"]), PullArgs::default(), PickedVia::Menu);
        run(&mut command, &mut ui);
        assert!(ui.prompts_shown().is_empty());
        assert_eq!(git.calls().len(), 1);
    }

    #[test]
    fn failed_pull_is_reported() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .fail_next_operation(crate::git::GitError::CommandFailed {
                    command: "git pull".into(),
                    message: "conflict".into(),
                }),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Pull"));
        let result = run(&mut pull(&git, PullArgs::default()), &mut ui);
        assert!(matches!(result, StepResult::Value(())));
        assert!(ui.has_error("conflict"));
    }
}
