//! `cherry-pick`: apply commits from another branch onto the current one.

use std::rc::Rc;

use crate::engine::{
    invariant_violation, CommandKind, CounterSeed, PickedVia, QuickCommand, Services,
    SkipTracker, StepState,
};
use crate::error::Result;
use crate::git::{
    references_label, revision_range, Branch, CherryPickOptions, GitReference, Repository,
};
use crate::steps::{
    create_confirm_step, flags_item, pick_step_result, show_pick, ConfirmOptions, StepResult,
};
use crate::ui::UserInterface;

use super::common::{
    append_repos_to_title, first_item, pick_branch_or_tag, pick_commits, pick_repository,
    run_operation, LogCache, ReferencePickOptions,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CherryPickFlags {
    pub edit: bool,
    pub no_commit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CherryPickState {
    pub repo: Option<Repository>,
    /// Commits to apply, or the branch or tag to choose them from.
    pub references: Vec<GitReference>,
    pub flags: CherryPickFlags,
}

#[derive(Debug, Clone, Default)]
pub struct CherryPickArgs {
    pub confirm: Option<bool>,
    pub state: CherryPickState,
}

pub struct CherryPickCommand {
    services: Rc<Services>,
    via: PickedVia,
    state: StepState<CherryPickState>,
    /// The checked-out branch commits are applied to.
    destination: Option<Branch>,
    /// Branch or tag whose commits are offered.
    source: Option<GitReference>,
    cache: LogCache,
}

impl CherryPickCommand {
    pub fn new(services: Rc<Services>, args: CherryPickArgs, via: PickedVia) -> Self {
        let revisions = args
            .state
            .references
            .first()
            .is_some_and(GitReference::is_revision);
        let counter = CounterSeed::new()
            .field(&args.state.repo)
            .weighted(&args.state.references, if revisions { 2 } else { 1 })
            .value();
        Self {
            services,
            via,
            state: StepState::new(args.state, counter, args.confirm),
            destination: None,
            source: None,
            cache: LogCache::default(),
        }
    }

    fn execute(&self, ui: &mut dyn UserInterface, repo: &Repository, destination: &GitReference) {
        let shas = oldest_first(&self.state.references);
        let options = CherryPickOptions {
            edit: self.state.flags.edit,
            no_commit: self.state.flags.no_commit,
        };
        let label = references_label(&self.state.references);
        run_operation(
            ui,
            &format!("Cherry picking {} onto {}", label, destination.label()),
            &format!("Cherry picked {} onto {}", label, destination.label()),
            || self.services.git.cherry_pick(repo, &shas, &options),
        );
    }

    /// Find the branch a directly supplied commit lives on, so its
    /// neighbours can be offered too.
    fn resolve_source(&mut self, repo: &Repository) -> Result<()> {
        if self.source.is_some() {
            return Ok(());
        }
        let Some(first) = self.state.references.first() else {
            return Ok(());
        };
        if !first.is_revision() {
            self.source = Some(first.clone());
            self.state.references.clear();
            return Ok(());
        }

        let git = self.services.git.as_ref();
        if let Some(name) = git.commit_branches(repo, first.ref_name())?.first() {
            if let Some(branch) = git.branch(repo, Some(name))? {
                tracing::debug!("Commit {} found on {}", first.name(), branch.name);
                self.source = Some(branch.reference());
            }
        }
        Ok(())
    }

    fn confirm_step(
        &mut self,
        ui: &mut dyn UserInterface,
        title: &str,
        destination: &GitReference,
        open_count: usize,
    ) -> Result<StepResult<CherryPickFlags>> {
        let state = &self.state.data;
        let repos: Vec<Repository> = state.repo.iter().cloned().collect();
        let selection = show_pick(ui, || {
            let refs = references_label(&state.references);
            let dest = destination.label();
            let current = &state.flags;
            Ok(create_confirm_step(
                append_repos_to_title(&format!("Confirm {}", title), &repos, open_count, ""),
                vec![
                    flags_item(
                        current,
                        CherryPickFlags::default(),
                        "Cherry Pick",
                        None,
                        Some(format!("Will apply {} to {}", refs, dest)),
                    ),
                    flags_item(
                        current,
                        CherryPickFlags {
                            edit: true,
                            no_commit: false,
                        },
                        "Cherry Pick & Edit",
                        Some("--edit".into()),
                        Some(format!("Will edit and apply {} to {}", refs, dest)),
                    ),
                    flags_item(
                        current,
                        CherryPickFlags {
                            edit: false,
                            no_commit: true,
                        },
                        "Cherry Pick without Committing",
                        Some("--no-commit".into()),
                        Some(format!("Will apply {} to {} without committing", refs, dest)),
                    ),
                ],
                None,
                ConfirmOptions::default(),
            ))
        })?;
        Ok(first_item(pick_step_result(&mut self.state.progress, selection)))
    }
}

/// Shas in the order they must be applied.
///
/// Commits loaded from a log carry their dates and are sorted by them;
/// otherwise the list is taken to be newest first, as the picker shows it.
fn oldest_first(references: &[GitReference]) -> Vec<String> {
    let mut ordered = references.to_vec();
    if ordered.iter().all(|r| r.date().is_some()) {
        ordered.sort_by_key(|r| r.date());
    } else {
        ordered.reverse();
    }
    ordered.iter().map(|r| r.ref_name().to_string()).collect()
}

impl QuickCommand for CherryPickCommand {
    fn key(&self) -> &'static str {
        "cherry-pick"
    }

    fn label(&self) -> &'static str {
        CommandKind::CherryPick.label()
    }

    fn title(&self) -> String {
        "Cherry Pick".into()
    }

    fn description(&self) -> &'static str {
        CommandKind::CherryPick.description()
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn picked_via(&self) -> PickedVia {
        self.via
    }

    fn can_skip_confirm(&self) -> bool {
        false
    }

    fn steps(&mut self, ui: &mut dyn UserInterface) -> Result<StepResult<()>> {
        let git = Rc::clone(&self.services.git);
        let repos = git.open_repositories();
        let page_size = self.services.config.commits.page_size;
        let mut tracker = SkipTracker::default();

        while self.state.progress.can_continue() {
            tracker.begin_pass(repos.len() == 1);
            if self.state.progress.needs(1, self.state.repo.is_some()) {
                if let [only] = repos.as_slice() {
                    if self.state.repo.is_none() {
                        self.state.progress.advance();
                    }
                    self.state.repo = Some(only.clone());
                } else {
                    let picked = self.state.repo.as_ref().map(|r| r.path.clone());
                    let title = self.title();
                    match pick_repository(
                        ui,
                        &mut self.state.progress,
                        &repos,
                        &title,
                        picked.as_deref(),
                    )? {
                        StepResult::Value(repo) => {
                            if self.state.repo.as_ref() != Some(&repo) {
                                self.destination = None;
                                self.source = None;
                            }
                            self.state.repo = Some(repo);
                        }
                        StepResult::Break => {
                            self.state.progress.back_out();
                            break;
                        }
                        StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                    }
                }
            }

            let Some(repo) = self.state.repo.clone() else {
                invariant_violation("cherry-pick reached its steps without a repository");
            };

            if self.destination.is_none() {
                match git.branch(&repo, None)? {
                    Some(branch) => self.destination = Some(branch),
                    None => {
                        ui.warning("Unable to cherry-pick; no branch is checked out");
                        self.state.progress.cancel();
                        break;
                    }
                }
            }
            let Some(destination) = self.destination.clone() else {
                invariant_violation("cherry-pick destination missing");
            };
            let destination_ref = destination.reference();
            let title = format!("{} into {}", self.title(), destination_ref.label());

            if self
                .state
                .progress
                .needs(2, !self.state.references.is_empty())
            {
                let picked = self.source.as_ref().map(|r| r.ref_name().to_string());
                let value = match &self.source {
                    None => self
                        .state
                        .references
                        .first()
                        .map(|r| r.ref_name().to_string()),
                    Some(_) => None,
                };
                let result = pick_branch_or_tag(
                    ui,
                    &mut self.state.progress,
                    &git,
                    &repo,
                    &title,
                    ReferencePickOptions {
                        placeholder: "Choose a branch or tag to cherry-pick from",
                        picked: picked.as_deref(),
                        value,
                        exclude: Some(&destination.name),
                        show_tags: true,
                        ..Default::default()
                    },
                )?;
                match result {
                    StepResult::Value(reference) if reference.is_revision() => {
                        self.state.references = vec![reference];
                        self.source = None;
                    }
                    StepResult::Value(reference) => {
                        self.state.references.clear();
                        self.source = Some(reference);
                    }
                    StepResult::Break => {
                        tracker.back_past(&mut self.state.progress);
                        continue;
                    }
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                }
            }

            self.resolve_source(&repo)?;

            if self.state.progress.counter < 3 {
                if let Some(source) = self.source.clone() {
                    let range = revision_range(&destination.name, source.ref_name());
                    let picked: Vec<String> = self
                        .state
                        .references
                        .iter()
                        .map(|r| r.ref_name().to_string())
                        .collect();
                    let StepState { progress, data } = &mut self.state;
                    match pick_commits(
                        ui,
                        progress,
                        git.as_ref(),
                        &self.cache,
                        &repo,
                        &range,
                        &title,
                        &format!("Choose commits to cherry-pick into {}", destination_ref.label()),
                        &picked,
                        page_size,
                    )? {
                        StepResult::Value(references) => data.references = references,
                        StepResult::Break => continue,
                        StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                    }
                }
            }

            if self.state.references.is_empty() {
                invariant_violation("cherry-pick confirm reached without commits");
            }

            if self.confirm(self.state.progress.confirm) {
                match self.confirm_step(ui, &title, &destination_ref, repos.len())? {
                    StepResult::Value(flags) => self.state.flags = flags,
                    StepResult::Break => continue,
                    StepResult::Redirect(args) => return Ok(StepResult::Redirect(args)),
                }
            }

            self.state.progress.end();
            self.execute(ui, &repo, &destination_ref);
        }

        Ok(self.state.progress.outcome())
    }
}
