//! `push`: push the current branch, or a given branch, to its remote.

use std::rc::Rc;

use crate::engine::{
    invariant_violation, CommandKind, CounterSeed, PickedVia, QuickCommand, Services,
    SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{GitProvider, GitReference, PushOptions, Repository};
use crate::steps::{
    create_confirm_step, flags_item, pick_step_result, show_pick, ConfirmOptions, Directive,
    DirectiveItem, PickEntry, PickStep, StepResult,
};
use crate::ui::{last_fetched_suffix, pluralize, UserInterface};

use super::common::{
    append_repos_to_title, fetch_button, first_item, pick_repositories, pick_repository,
    run_operation,
};

/// Flags chosen on the confirm step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushFlags {
    pub force: bool,
    /// Publish to this remote with `--set-upstream`.
    pub publish: Option<String>,
}

impl PushFlags {
    fn force() -> Self {
        Self {
            force: true,
            publish: None,
        }
    }

    fn publish(remote: &str) -> Self {
        Self {
            force: false,
            publish: Some(remote.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PushState {
    pub repos: Vec<Repository>,
    /// Push only this reference instead of the current branch.
    pub reference: Option<GitReference>,
    pub flags: PushFlags,
}

#[derive(Debug, Clone, Default)]
pub struct PushArgs {
    pub confirm: Option<bool>,
    pub state: PushState,
}

pub struct PushCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<PushState>,
}

/// How force pushes are performed, from settings and git's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForceMode {
    with_lease: bool,
    if_includes: bool,
}

impl ForceMode {
    fn qualifier(&self) -> &'static str {
        if self.if_includes {
            " (with lease and if includes)"
        } else if self.with_lease {
            " (with lease)"
        } else {
            ""
        }
    }

    fn option(&self) -> &'static str {
        if self.if_includes {
            "--force-with-lease --force-if-includes"
        } else if self.with_lease {
            "--force-with-lease"
        } else {
            "--force"
        }
    }

    fn item(&self, current: &PushFlags, title: &str, detail: String) -> PickEntry<PushFlags> {
        flags_item(
            current,
            PushFlags::force(),
            format!("Force {}{}", title, self.qualifier()),
            Some(self.option().to_string()),
            Some(detail),
        )
    }
}

impl PushCommand {
    pub fn new(services: Rc<Services>, args: PushArgs, via: PickedVia) -> Self {
        let counter = CounterSeed::new().field(&args.state.repos).value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
        }
    }

    fn force_mode(&self, repo: &Repository) -> ForceMode {
        let settings = &self.services.config.git;
        let with_lease = settings.use_force_push_with_lease;
        ForceMode {
            with_lease,
            if_includes: with_lease
                && settings.use_force_push_if_includes
                && self.services.git.supports_force_if_includes(repo),
        }
    }

    fn execute(&self, ui: &mut dyn UserInterface) {
        let git = self.services.git.as_ref();
        let repos = &self.state.repos;
        let flags = &self.state.flags;
        let options = PushOptions {
            force: flags.force && flags.publish.is_none(),
            publish: flags.publish.clone(),
            reference: self.state.reference.clone(),
        };

        let target = match repos.as_slice() {
            [repo] => repo.name.clone(),
            _ => pluralize("repository", repos.len()),
        };
        let (message, done) = match &options.publish {
            Some(remote) => (
                format!("Publishing {} to {}", target, remote),
                format!("Published {} to {}", target, remote),
            ),
            None => (format!("Pushing {}", target), format!("Pushed {}", target)),
        };
        run_operation(ui, &message, &done, || git.push_all(repos, &options));
    }

    fn confirm_step(
        &mut self,
        ui: &mut dyn UserInterface,
        title: &str,
        open_count: usize,
    ) -> Result<StepResult<PushFlags>> {
        let Some(first) = self.state.repos.first() else {
            invariant_violation("push confirm step reached without a repository");
        };
        let force = self.force_mode(first);
        let git = Rc::clone(&self.services.git);
        let selection = show_pick(ui, || {
            build_confirm(&git, &self.state.data, title, open_count, force)
        })?;
        Ok(first_item(pick_step_result(&mut self.state.progress, selection)))
    }
}

fn cancel_only(title: String, label: &str, detail: &str, placeholder: &str) -> PickStep<PushFlags> {
    create_confirm_step(
        title,
        Vec::new(),
        Some(DirectiveItem::new(Directive::Cancel).label(label).detail(detail)),
        ConfirmOptions {
            placeholder: Some(placeholder.to_string()),
            ..Default::default()
        },
    )
}

fn publish_step(
    items: Vec<PickEntry<PushFlags>>,
    repos: &[Repository],
    open_count: usize,
) -> PickStep<PushFlags> {
    if items.is_empty() {
        return cancel_only(
            append_repos_to_title("Publish", repos, open_count, ""),
            "OK",
            "No remotes found",
            "Cannot publish; No remotes found",
        );
    }
    create_confirm_step(
        append_repos_to_title("Confirm Publish", repos, open_count, ""),
        items,
        None,
        ConfirmOptions {
            placeholder: Some("Confirm Publish".into()),
            ..Default::default()
        },
    )
}

fn build_confirm(
    git: &Rc<dyn GitProvider>,
    state: &PushState,
    title: &str,
    open_count: usize,
    force: ForceMode,
) -> Result<PickStep<PushFlags>> {
    let repos = &state.repos;
    let current = &state.flags;
    let confirm_title = append_repos_to_title(&format!("Confirm {}", title), repos, open_count, "");

    if repos.len() > 1 {
        let count = pluralize("repository", repos.len());
        return Ok(create_confirm_step(
            confirm_title,
            vec![
                flags_item(
                    current,
                    PushFlags::default(),
                    title,
                    None,
                    Some(format!("Will push {}", count)),
                ),
                force.item(
                    current,
                    title,
                    format!("Will force push{} {}", force.qualifier(), count),
                ),
            ],
            None,
            ConfirmOptions::default(),
        ));
    }

    let Some(repo) = repos.first() else {
        invariant_violation("push confirm step reached without a repository");
    };

    if let Some(GitReference::Branch(reference)) = &state.reference {
        if reference.remote {
            return Ok(cancel_only(
                append_repos_to_title(title, repos, open_count, ""),
                "OK",
                "Cannot push a remote branch",
                "Cannot push a remote branch",
            ));
        }

        let branch = git.branch(repo, Some(&reference.name))?;
        let Some(branch) = branch else {
            return Ok(nothing_to_push(repos, title, open_count));
        };
        let label = branch.reference().label();
        let remote = branch.remote_name().unwrap_or("remote").to_string();

        if branch.upstream.is_none() {
            let mut items = Vec::new();
            for r in git.remotes(repo)? {
                items.push(flags_item(
                    current,
                    PushFlags::publish(&r.name),
                    format!("Publish {} to {}", branch.name, r.name),
                    None,
                    Some(format!("Will publish {} to {}", label, r.name)),
                ));
            }
            return Ok(publish_step(items, repos, open_count));
        }

        if branch.state.behind > 0 {
            let mut detail = format!("Will force push{}", force.qualifier());
            if branch.state.ahead > 0 {
                detail.push_str(&format!(
                    " {}",
                    pluralize("commit", branch.state.ahead as usize)
                ));
            }
            detail.push_str(&format!(
                " to {}, overwriting {} on {}",
                remote,
                pluralize("commit", branch.state.behind as usize),
                remote
            ));
            return Ok(create_confirm_step(
                confirm_title,
                vec![force.item(current, title, detail)],
                Some(
                    DirectiveItem::new(Directive::Cancel)
                        .label(format!("Cancel {}", title))
                        .detail(format!(
                            "Cannot push; {} is behind {} by {}",
                            label,
                            remote,
                            pluralize("commit", branch.state.behind as usize)
                        )),
                ),
                ConfirmOptions::default(),
            ));
        }

        if branch.state.ahead > 0 {
            return Ok(create_confirm_step(
                confirm_title,
                vec![flags_item(
                    current,
                    PushFlags::default(),
                    title,
                    None,
                    Some(format!(
                        "Will push {} from {} to {}",
                        pluralize("commit", branch.state.ahead as usize),
                        label,
                        remote
                    )),
                )],
                None,
                ConfirmOptions::default(),
            ));
        }

        return Ok(nothing_to_push(repos, title, open_count));
    }

    let status = git.status(repo)?;
    let branch_name = status
        .as_ref()
        .and_then(|s| s.branch.clone())
        .unwrap_or_else(|| "HEAD".to_string());
    let upstream_remote = status
        .as_ref()
        .and_then(|s| s.upstream.as_ref())
        .map(|u| u.remote_name().to_string());

    if let Some(status) = status.as_ref().filter(|s| s.state.ahead == 0) {
        if status.upstream.is_none() {
            let up_to = match &state.reference {
                Some(reference) => format!(" up to and including {}", reference.name()),
                None => String::new(),
            };
            let mut items = Vec::new();
            for r in git.remotes(repo)? {
                items.push(flags_item(
                    current,
                    PushFlags::publish(&r.name),
                    format!("Publish {} to {}", branch_name, r.name),
                    None,
                    Some(format!(
                        "Will publish branch {}{} to {}",
                        branch_name, up_to, r.name
                    )),
                ));
            }
            return Ok(publish_step(items, repos, open_count));
        }

        let remote = upstream_remote.unwrap_or_default();
        return Ok(cancel_only(
            append_repos_to_title(title, repos, open_count, ""),
            "OK",
            &format!("No commits found that are not on {}", remote),
            &format!("Nothing to push; no commits found that are not on {}", remote),
        ));
    }

    let (ahead, behind) = status
        .as_ref()
        .map(|s| (s.state.ahead as usize, s.state.behind as usize))
        .unwrap_or_default();
    let mut details = String::new();
    match &state.reference {
        Some(reference) if ahead > 0 => {
            details.push_str(&format!(" commits up to and including {}", reference.name()))
        }
        Some(_) => {}
        None if ahead > 0 => details.push_str(&format!(" {}", pluralize("commit", ahead))),
        None => {}
    }
    if let Some(remote) = &upstream_remote {
        details.push_str(&format!(" to {}", remote));
    }

    let mut items = Vec::new();
    if behind == 0 {
        items.push(flags_item(
            current,
            PushFlags::default(),
            title,
            None,
            Some(format!("Will push{}", details)),
        ));
    }
    let mut force_detail = format!("Will force push{}{}", force.qualifier(), details);
    if behind > 0 {
        force_detail.push_str(&format!(", overwriting {}", pluralize("commit", behind)));
        if let Some(remote) = &upstream_remote {
            force_detail.push_str(&format!(" on {}", remote));
        }
    }
    items.push(force.item(current, title, force_detail));

    let cancel = (behind > 0).then(|| {
        let mut reason = format!("Cannot push; branch {} is behind", branch_name);
        if let Some(remote) = &upstream_remote {
            reason.push_str(&format!(" {}", remote));
        }
        reason.push_str(&format!(" by {}", pluralize("commit", behind)));
        DirectiveItem::new(Directive::Cancel)
            .label(format!("Cancel {}", title))
            .detail(reason)
    });

    let last_fetched = git.last_fetched(repo)?;
    Ok(create_confirm_step(
        append_repos_to_title(
            &format!("Confirm {}", title),
            repos,
            open_count,
            &last_fetched_suffix(last_fetched),
        ),
        items,
        cancel,
        ConfirmOptions {
            buttons: vec![fetch_button(git, repos)],
            ..Default::default()
        },
    ))
}

fn nothing_to_push(repos: &[Repository], title: &str, open_count: usize) -> PickStep<PushFlags> {
    cancel_only(
        append_repos_to_title(title, repos, open_count, ""),
        "OK",
        "No commits found to push",
        "Nothing to push; No commits found to push",
    )
}

impl QuickCommand for PushCommand {
    fn key(&self) -> &'static str {
        "push"
    }

    fn label(&self) -> &'static str {
        CommandKind::Push.label()
    }

    fn title(&self) -> String {
        "Push".into()
    }

    fn description(&self) -> &'static str {
        CommandKind::Push.description()
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
                    let result = match &data.reference {
                        Some(reference) => pick_repository(
                            ui,
                            progress,
                            &repos,
                            &title,
                            Some(reference.repo_path()),
                        )?
                        .map(|repo| vec![repo]),
                        None => pick_repositories(ui, progress, &repos, &title, &data.repos)?,
                    };
                    match result {
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
            self.execute(ui);
        }

        Ok(self.state.progress.outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, services, services_with};
    use crate::config::{GitSettings, WizardConfig};
    use crate::git::{Branch, GitCall, MockGit, Remote, RepoStatus, TrackingState, Upstream};
    use crate::ui::{MockAnswer, MockUI};

    const REPO: &str = "/work/app";

    fn args_for(reference: GitReference) -> PushArgs {
        PushArgs {
            confirm: Some(true),
            state: PushState {
                repos: vec![Repository::new(REPO)],
                reference: Some(reference),
                ..Default::default()
            },
        }
    }

    fn tracked(ahead: u32, behind: u32) -> Rc<MockGit> {
        Rc::new(
            MockGit::new().with_repo(REPO).with_branch(
                Branch::local(REPO, "x")
                    .with_upstream(Upstream::new("origin/x"))
                    .with_state(ahead, behind),
            ),
        )
    }

    #[test]
    fn ahead_branch_offers_plain_push_only() {
        let git = tracked(3, 0);
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Push"));

        let reference = GitReference::branch(REPO, "x");
        let mut command =
            PushCommand::new(services(&git), args_for(reference.clone()), PickedVia::Command);
        run(&mut command, &mut ui);

        assert_eq!(ui.picks().len(), 1);
        let pick = ui.last_pick().unwrap();
        let labels: Vec<&str> = pick.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Push", "Cancel"]);
        assert_eq!(
            pick.items[0].detail.as_deref(),
            Some("Will push 3 commits from branch x to origin")
        );
        assert_eq!(
            git.calls(),
            vec![GitCall::Push {
                repos: vec![REPO.into()],
                options: PushOptions {
                    force: false,
                    publish: None,
                    reference: Some(reference),
                },
            }]
        );
    }

    #[test]
    fn behind_branch_offers_force_with_reason() {
        let git = tracked(1, 2);
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Force Push (with lease)"));

        let mut command = PushCommand::new(
            services(&git),
            args_for(GitReference::branch(REPO, "x")),
            PickedVia::Command,
        );
        run(&mut command, &mut ui);

        let pick = ui.last_pick().unwrap();
        assert_eq!(pick.items.len(), 2);
        assert_eq!(pick.items[0].description.as_deref(), Some("--force-with-lease"));
        assert_eq!(
            pick.items[1].detail.as_deref(),
            Some("Cannot push; branch x is behind origin by 2 commits")
        );
        assert!(matches!(
            &git.calls()[0],
            GitCall::Push { options, .. } if options.force
        ));
    }

    #[test]
    fn force_label_reflects_if_includes_support() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_force_if_includes(true)
                .with_branch(
                    Branch::local(REPO, "x")
                        .with_upstream(Upstream::new("origin/x"))
                        .with_state(0, 1),
                ),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        let mut command = PushCommand::new(
            services(&git),
            args_for(GitReference::branch(REPO, "x")),
            PickedVia::Command,
        );
        run(&mut command, &mut ui);
        let item = &ui.last_pick().unwrap().items[0];
        assert_eq!(item.label, "Force Push (with lease and if includes)");
        assert_eq!(
            item.description.as_deref(),
            Some("--force-with-lease --force-if-includes")
        );
    }

    #[test]
    fn plain_force_when_lease_disabled() {
        let git = tracked(0, 1);
        let config = WizardConfig {
            git: GitSettings {
                use_force_push_with_lease: false,
                use_force_push_if_includes: true,
            },
            ..Default::default()
        };
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        let mut command = PushCommand::new(
            services_with(&git, config),
            args_for(GitReference::branch(REPO, "x")),
            PickedVia::Command,
        );
        run(&mut command, &mut ui);
        let item = &ui.last_pick().unwrap().items[0];
        assert_eq!(item.label, "Force Push");
        assert_eq!(item.description.as_deref(), Some("--force"));
    }

    #[test]
    fn unpublished_branch_offers_each_remote() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_branch(Branch::local(REPO, "x"))
                .with_remote(REPO, Remote::new("origin", "git@host:app.git"))
                .with_remote(REPO, Remote::new("fork", "git@host:me/app.git")),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("Publish x to fork"));

        let mut command = PushCommand::new(
            services(&git),
            args_for(GitReference::branch(REPO, "x")),
            PickedVia::Command,
        );
        run(&mut command, &mut ui);

        assert_eq!(ui.titles(), vec!["Confirm Publish"]);
        assert!(matches!(
            &git.calls()[0],
            GitCall::Push { options, .. }
                if options.publish.as_deref() == Some("fork") && !options.force
        ));
    }

    #[test]
    fn remote_branch_cannot_be_pushed() {
        let git = tracked(0, 0);
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("OK"));
        let mut command = PushCommand::new(
            services(&git),
            args_for(GitReference::remote_branch(REPO, "origin/x")),
            PickedVia::Command,
        );
        let result = run(&mut command, &mut ui);
        assert!(matches!(result, StepResult::Value(())));
        assert!(git.calls().is_empty());
        assert_eq!(
            ui.last_pick().unwrap().placeholder.as_deref(),
            Some("Cannot push a remote branch")
        );
    }

    #[test]
    fn current_branch_behind_hides_plain_push() {
        let git = Rc::new(MockGit::new().with_repo(REPO).with_status(
            REPO,
            RepoStatus {
                branch: Some("main".into()),
                upstream: Some(Upstream::new("origin/main")),
                state: TrackingState::new(2, 1),
                has_changes: false,
            },
        ));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        run(
            &mut PushCommand::new(services(&git), PushArgs::default(), PickedVia::Menu),
            &mut ui,
        );
        let pick = ui.last_pick().unwrap();
        let labels: Vec<&str> = pick.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Force Push (with lease)", "Cancel Push"]);
        assert_eq!(
            pick.items[0].detail.as_deref(),
            Some("Will force push (with lease) 2 commits to origin, overwriting 1 commit on origin")
        );
        assert_eq!(pick.buttons[0].tooltip, "Fetch");
    }

    #[test]
    fn up_to_date_branch_has_nothing_to_push() {
        let git = Rc::new(MockGit::new().with_repo(REPO).with_status(
            REPO,
            RepoStatus {
                branch: Some("main".into()),
                upstream: Some(Upstream::new("origin/main")),
                ..Default::default()
            },
        ));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick("OK"));
        run(
            &mut PushCommand::new(services(&git), PushArgs::default(), PickedVia::Menu),
            &mut ui,
        );
        assert_eq!(
            ui.last_pick().unwrap().items[0].detail.as_deref(),
            Some("No commits found that are not on origin")
        );
        assert!(git.calls().is_empty());
    }

    #[test]
    fn several_repositories_offer_push_and_force() {
        let git = Rc::new(MockGit::new().with_repo(REPO).with_repo("/work/lib"));
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::pick_all(["app", "lib"]));
        ui.answer(MockAnswer::pick("Push"));
        run(
            &mut PushCommand::new(services(&git), PushArgs::default(), PickedVia::Menu),
            &mut ui,
        );
        assert_eq!(
            ui.last_pick().unwrap().items[1].detail.as_deref(),
            Some("Will force push (with lease) 2 repositories")
        );
        assert!(matches!(
            &git.calls()[0],
            GitCall::Push { repos, options } if repos.len() == 2 && !options.force
        ));
    }

    #[test]
    fn reference_picks_a_single_repository() {
        let git = Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_repo("/work/lib")
                .with_branch(
                    Branch::local(REPO, "x")
                        .with_upstream(Upstream::new("origin/x"))
                        .with_state(1, 0),
                ),
        );
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);
        ui.answer(MockAnswer::pick("Push"));
        let args = PushArgs {
            confirm: None,
            state: PushState {
                reference: Some(GitReference::branch(REPO, "x")),
                ..Default::default()
            },
        };
        run(
            &mut PushCommand::new(services(&git), args, PickedVia::Command),
            &mut ui,
        );
        assert!(!ui.picks()[0].multi_select);
        assert!(matches!(&git.calls()[0], GitCall::Push { repos, .. } if repos == &vec![std::path::PathBuf::from(REPO)]));
    }
}
