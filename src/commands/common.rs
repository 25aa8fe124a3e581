//! Step builders shared by the commands.
//!
//! Every builder takes the command's [`Progress`] so that a valid answer
//! advances the counter and a directive applies its effect, exactly as a
//! hand-written step would.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::engine::{CommandArgs, Progress};
use crate::error::Result;
use crate::git::{
    shorten_sha, Branch, Commit, GitProvider, GitReference, GitResult, Repository, Worktree,
};
use crate::steps::{
    create_input_step, create_pick_step, pick_step_result, show_input, show_pick, step_result,
    ButtonKind, InputStepConfig, PickEntry, PickItem, PickStepConfig, Picked, Selection,
    StepButton, StepResult, Validation,
};
use crate::ui::{format_relative_time, pluralize, UserInterface};

/// What one pass of a subcommand's steps asks of the command loop.
#[derive(Debug)]
pub enum Pass {
    /// Re-check every position; the loop exits once the steps have ended.
    Continue,
    Redirect(Box<CommandArgs>),
}

/// Append the chosen repositories to a title when more than one is open.
pub fn append_repos_to_title(
    title: &str,
    repos: &[Repository],
    open_count: usize,
    extra: &str,
) -> String {
    if open_count <= 1 {
        return format!("{}{}", title, extra);
    }
    match repos {
        [] => format!("{}{}", title, extra),
        [repo] => format!("{}{}  ·  {}", title, extra, repo.name),
        _ => format!(
            "{}{}  ·  {}",
            title,
            extra,
            pluralize("repository", repos.len())
        ),
    }
}

/// Collapse a single-select pick into its payload.
pub fn first_item<T>(result: StepResult<Picked<T>>) -> StepResult<T> {
    match result {
        StepResult::Value(picked) => match picked.into_first() {
            Some(item) => StepResult::Value(item),
            None => StepResult::Break,
        },
        StepResult::Break => StepResult::Break,
        StepResult::Redirect(args) => StepResult::Redirect(args),
    }
}

/// A "Fetch" button that fetches `repos` and asks for the step to be rebuilt.
pub fn fetch_button(git: &Rc<dyn GitProvider>, repos: &[Repository]) -> StepButton {
    let git = Rc::clone(git);
    let repos = repos.to_vec();
    StepButton::fetch(move || {
        for repo in &repos {
            tracing::debug!("Fetching {}", repo.name);
            git.fetch(repo)?;
        }
        Ok(true)
    })
}

/// Run a git operation under a spinner.
///
/// Failures are reported to the user and logged rather than propagated; the
/// command has already ended its steps. Returns whether it succeeded.
pub fn run_operation(
    ui: &mut dyn UserInterface,
    message: &str,
    done: &str,
    operation: impl FnOnce() -> GitResult<()>,
) -> bool {
    let mut spinner = ui.start_spinner(message);
    match operation() {
        Ok(()) => {
            spinner.finish_success(done);
            true
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", message, e);
            spinner.finish_error(message);
            ui.error(&e.to_string());
            false
        }
    }
}

fn repository_item(repo: &Repository, picked: bool) -> PickEntry<Repository> {
    PickItem::new(&repo.name, repo.clone())
        .description(repo.path.display().to_string())
        .picked(picked)
        .into()
}

/// Pick one repository.
pub fn pick_repository(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    repos: &[Repository],
    title: &str,
    picked: Option<&Path>,
) -> Result<StepResult<Repository>> {
    let selection = show_pick(ui, || {
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some("Choose a repository".into()),
            items: repos
                .iter()
                .map(|r| repository_item(r, picked == Some(r.path.as_path())))
                .collect(),
            empty_placeholder: Some("No repositories found".into()),
            ..Default::default()
        }))
    })?;
    Ok(first_item(pick_step_result(progress, selection)))
}

/// Pick one or more repositories. Previously chosen ones are pre-selected;
/// with none chosen yet, the first repository is.
pub fn pick_repositories(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    repos: &[Repository],
    title: &str,
    current: &[Repository],
) -> Result<StepResult<Vec<Repository>>> {
    let selection = show_pick(ui, || {
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some("Choose repositories".into()),
            items: repos
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let picked = if current.is_empty() {
                        i == 0
                    } else {
                        current.contains(r)
                    };
                    repository_item(r, picked)
                })
                .collect(),
            multi_select: true,
            empty_placeholder: Some("No repositories found".into()),
            ..Default::default()
        }))
    })?;
    Ok(pick_step_result(progress, selection).map(Picked::into_items))
}

/// `current`, `↑2 ↓1 origin/main`, `in worktree app.worktrees/x`
pub fn branch_description(branch: &Branch) -> Option<String> {
    let mut parts = Vec::new();
    if branch.current {
        parts.push("current".to_string());
    }
    if let Some(upstream) = &branch.upstream {
        if upstream.missing {
            parts.push(format!("{} (gone)", upstream.name));
        } else {
            let mut tracking = String::new();
            if branch.state.ahead > 0 {
                tracking.push_str(&format!("↑{} ", branch.state.ahead));
            }
            if branch.state.behind > 0 {
                tracking.push_str(&format!("↓{} ", branch.state.behind));
            }
            parts.push(format!("{}{}", tracking, upstream.name));
        }
    }
    if let Some(path) = &branch.worktree_path {
        parts.push(format!("in worktree {}", path.display()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("  ·  "))
    }
}

fn branch_item(branch: &Branch, picked: bool) -> PickEntry<GitReference> {
    let mut item = PickItem::new(&branch.name, branch.reference()).picked(picked);
    if let Some(description) = branch_description(branch) {
        item = item.description(description);
    }
    if let Some(date) = branch.date {
        item = item.detail(format_relative_time(date));
    }
    item.into()
}

/// Options for [`pick_branch_or_tag`].
#[derive(Default)]
pub struct ReferencePickOptions<'a> {
    pub placeholder: &'a str,
    /// Name of the reference to pre-select.
    pub picked: Option<&'a str>,
    /// Initial filter text.
    pub value: Option<String>,
    /// Branch hidden from the list (e.g. the cherry-pick destination).
    pub exclude: Option<&'a str>,
    pub show_tags: bool,
    pub buttons: Vec<StepButton>,
}

fn reference_entries(
    git: &dyn GitProvider,
    repo: &Repository,
    show_tags: bool,
    exclude: Option<&str>,
    picked: Option<&str>,
) -> Result<Vec<PickEntry<GitReference>>> {
    let branches: Vec<Branch> = git
        .branches(repo)?
        .into_iter()
        .filter(|b| Some(b.name.as_str()) != exclude)
        .collect();

    let mut entries = Vec::new();
    let (local, remote): (Vec<&Branch>, Vec<&Branch>) = branches.iter().partition(|b| !b.remote);
    if !local.is_empty() {
        entries.push(PickEntry::separator("Branches"));
        entries.extend(
            local
                .iter()
                .map(|b| branch_item(b, picked == Some(b.name.as_str()))),
        );
    }
    if !remote.is_empty() {
        entries.push(PickEntry::separator("Remote Branches"));
        entries.extend(
            remote
                .iter()
                .map(|b| branch_item(b, picked == Some(b.name.as_str()))),
        );
    }

    if show_tags {
        let tags = git.tags(repo)?;
        if !tags.is_empty() {
            entries.push(PickEntry::separator("Tags"));
            entries.extend(tags.iter().map(|t| {
                PickItem::new(&t.name, t.reference())
                    .description("tag")
                    .picked(picked == Some(t.name.as_str()))
                    .into()
            }));
        }
    }
    Ok(entries)
}

fn show_tags_button(show_tags: &Rc<Cell<bool>>) -> StepButton {
    let on = show_tags.get();
    let toggle = Rc::clone(show_tags);
    StepButton::refresh(
        ButtonKind::ShowTags { on },
        if on { "Hide Tags" } else { "Show Tags" },
        move || {
            toggle.set(!toggle.get());
            Ok(true)
        },
    )
}

/// Pick a branch or tag; typed text is resolved as a revision.
///
/// Text that does not resolve is reported and the step is shown again.
pub fn pick_branch_or_tag(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &Rc<dyn GitProvider>,
    repo: &Repository,
    title: &str,
    options: ReferencePickOptions<'_>,
) -> Result<StepResult<GitReference>> {
    let show_tags = Rc::new(Cell::new(options.show_tags));
    let mut value = options.value.clone();

    loop {
        let selection = show_pick(ui, || {
            let mut buttons = vec![show_tags_button(&show_tags)];
            buttons.extend(options.buttons.iter().cloned());
            Ok(create_pick_step(PickStepConfig {
                title: title.to_string(),
                placeholder: Some(options.placeholder.to_string()),
                items: reference_entries(
                    git.as_ref(),
                    repo,
                    show_tags.get(),
                    options.exclude,
                    options.picked,
                )?,
                buttons,
                accepts_text: true,
                value: value.clone(),
                empty_placeholder: Some("No branches found".into()),
                ..Default::default()
            }))
        })?;

        let selection = match selection {
            Selection::Value(Picked::Text(text)) => match git.resolve_revision(repo, &text)? {
                Some(commit) => Selection::Value(Picked::Items(vec![commit.reference()])),
                None => {
                    ui.warning(&format!(
                        "'{}' is not a branch, tag or commit",
                        text.trim()
                    ));
                    value = Some(text);
                    continue;
                }
            },
            other => other,
        };
        return Ok(first_item(pick_step_result(progress, selection)));
    }
}

/// Pick a branch or tag present in every one of `repos`, for switching.
///
/// Typed text that names an existing reference in the first repository is
/// resolved; anything else is returned as text, to become a new branch.
pub fn pick_branch_or_tag_for_switch(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &Rc<dyn GitProvider>,
    repos: &[Repository],
    title: &str,
    options: ReferencePickOptions<'_>,
) -> Result<StepResult<Picked<GitReference>>> {
    let Some(first) = repos.first() else {
        crate::engine::invariant_violation("switch reference step reached without a repository");
    };
    let show_tags = Rc::new(Cell::new(options.show_tags));

    let selection = show_pick(ui, || {
        let mut entries = reference_entries(
            git.as_ref(),
            first,
            show_tags.get(),
            options.exclude,
            options.picked,
        )?;
        if repos.len() > 1 {
            let mut common = Vec::new();
            for repo in &repos[1..] {
                let names: Vec<String> = git.branches(repo)?.into_iter().map(|b| b.name).collect();
                common.push(names);
            }
            entries.retain(|entry| match entry {
                PickEntry::Item(item) if item.item.is_branch() => common
                    .iter()
                    .all(|names| names.iter().any(|n| n == item.item.ref_name())),
                _ => true,
            });
        }

        let mut buttons = vec![show_tags_button(&show_tags)];
        buttons.extend(options.buttons.iter().cloned());
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(options.placeholder.to_string()),
            items: entries,
            buttons,
            accepts_text: true,
            value: options.value.clone(),
            empty_placeholder: Some("No branches found".into()),
            ..Default::default()
        }))
    })?;

    let selection = match selection {
        Selection::Value(Picked::Text(text)) => match find_reference(git.as_ref(), first, &text)? {
            Some(reference) => Selection::Value(Picked::Items(vec![reference])),
            None => Selection::Value(Picked::Text(text.trim().to_string())),
        },
        other => other,
    };
    Ok(pick_step_result(progress, selection))
}

/// Pick a single branch matching `filter`.
pub fn pick_branch(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &dyn GitProvider,
    repo: &Repository,
    title: &str,
    placeholder: &str,
    filter: impl Fn(&Branch) -> bool,
) -> Result<StepResult<GitReference>> {
    let selection = show_pick(ui, || {
        let items = git
            .branches(repo)?
            .iter()
            .filter(|b| filter(b))
            .map(|b| branch_item(b, false))
            .collect();
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(placeholder.to_string()),
            items,
            empty_placeholder: Some(format!("{}; no branches found", placeholder)),
            ..Default::default()
        }))
    })?;
    Ok(first_item(pick_step_result(progress, selection)))
}

/// Pick several branches matching `filter`; `picked` names are pre-selected.
#[allow(clippy::too_many_arguments)]
pub fn pick_branches(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &dyn GitProvider,
    repo: &Repository,
    title: &str,
    placeholder: &str,
    empty_placeholder: &str,
    filter: impl Fn(&Branch) -> bool,
    picked: &[String],
) -> Result<StepResult<Vec<GitReference>>> {
    let selection = show_pick(ui, || {
        let items = git
            .branches(repo)?
            .iter()
            .filter(|b| filter(b))
            .map(|b| branch_item(b, picked.contains(&b.name)))
            .collect();
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(placeholder.to_string()),
            items,
            multi_select: true,
            empty_placeholder: Some(empty_placeholder.to_string()),
            ..Default::default()
        }))
    })?;
    Ok(pick_step_result(progress, selection).map(Picked::into_items))
}

/// Log queries already answered, keyed by repository, range and limit.
#[derive(Debug, Default)]
pub struct LogCache {
    entries: RefCell<HashMap<(PathBuf, String, usize), Vec<Commit>>>,
}

impl LogCache {
    pub fn log(
        &self,
        git: &dyn GitProvider,
        repo: &Repository,
        range: &str,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let key = (repo.path.clone(), range.to_string(), limit);
        if let Some(commits) = self.entries.borrow().get(&key) {
            return Ok(commits.clone());
        }
        let commits = git.log(repo, range, limit)?;
        self.entries.borrow_mut().insert(key, commits.clone());
        Ok(commits)
    }
}

fn commit_item(commit: &Commit, picked: bool) -> PickEntry<GitReference> {
    let mut description = commit.author.clone();
    if let Some(date) = commit.date {
        if !description.is_empty() {
            description.push_str(", ");
        }
        description.push_str(&format_relative_time(date));
    }
    let mut item = PickItem::new(&commit.summary, commit.reference())
        .detail(shorten_sha(&commit.sha))
        .picked(picked);
    if !description.is_empty() {
        item = item.description(description);
    }
    item.into()
}

/// Pick commits from `range`, newest first.
///
/// Starts with `page_size` commits; a "Load More" button grows the page
/// while the log may hold more.
#[allow(clippy::too_many_arguments)]
pub fn pick_commits(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &dyn GitProvider,
    cache: &LogCache,
    repo: &Repository,
    range: &str,
    title: &str,
    placeholder: &str,
    picked: &[String],
    page_size: usize,
) -> Result<StepResult<Vec<GitReference>>> {
    let page_size = page_size.max(1);
    let limit = Rc::new(Cell::new(page_size));

    let selection = show_pick(ui, || {
        let commits = cache.log(git, repo, range, limit.get())?;
        let mut buttons = Vec::new();
        if commits.len() >= limit.get() {
            let grow = Rc::clone(&limit);
            buttons.push(StepButton::refresh(
                ButtonKind::LoadMore,
                "Load More Commits",
                move || {
                    grow.set(grow.get() + page_size);
                    Ok(true)
                },
            ));
        }
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(placeholder.to_string()),
            items: commits
                .iter()
                .map(|c| commit_item(c, picked.contains(&c.sha)))
                .collect(),
            multi_select: true,
            buttons,
            empty_placeholder: Some(format!("No commits found in {}", range)),
            ..Default::default()
        }))
    })?;
    Ok(pick_step_result(progress, selection).map(Picked::into_items))
}

/// Ask for a new branch name.
///
/// Names git rejects, and names of existing branches, are refused inline.
pub fn input_branch_name(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &Rc<dyn GitProvider>,
    repo: &Repository,
    title: &str,
    value: Option<String>,
) -> Result<StepResult<String>> {
    let validator_git = Rc::clone(git);
    let validator_repo = repo.clone();

    let selection = show_input(ui, || {
        let git = Rc::clone(&validator_git);
        let repo = validator_repo.clone();
        Ok(create_input_step(InputStepConfig {
            title: title.to_string(),
            prompt: Some("Please provide a name for the new branch".into()),
            placeholder: Some("Branch name".into()),
            value: value.clone(),
            validate: Some(Rc::new(move |text: &str| -> Result<Validation> {
                let name = text.trim();
                if name.is_empty() {
                    return Ok(Validation::invalid("Please provide a valid branch name"));
                }
                if !git.validate_branch_name(&repo, name)? {
                    return Ok(Validation::invalid(format!(
                        "'{}' is not a valid branch name",
                        name
                    )));
                }
                if git.branch(&repo, Some(name))?.is_some() {
                    return Ok(Validation::invalid(format!(
                        "A branch named '{}' already exists",
                        name
                    )));
                }
                Ok(Validation::ok())
            })),
            ..Default::default()
        }))
    })?;
    Ok(step_result(progress, selection).map(|name| name.trim().to_string()))
}

fn worktree_item(worktree: &Worktree, picked: bool) -> PickEntry<Worktree> {
    let mut description = match &worktree.branch {
        Some(branch) => branch.clone(),
        None => format!(
            "detached at {}",
            worktree.sha.as_deref().map(shorten_sha).unwrap_or("HEAD")
        ),
    };
    if worktree.main {
        description.push_str("  ·  main");
    }
    if worktree.opened {
        description.push_str("  ·  current");
    }
    PickItem::new(worktree.name(), worktree.clone())
        .description(description)
        .detail(worktree.path.display().to_string())
        .picked(picked)
        .into()
}

/// Pick a worktree matching `filter`.
#[allow(clippy::too_many_arguments)]
pub fn pick_worktree(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &dyn GitProvider,
    repo: &Repository,
    title: &str,
    placeholder: &str,
    filter: impl Fn(&Worktree) -> bool,
    picked: Option<&Path>,
) -> Result<StepResult<Worktree>> {
    let selection = show_pick(ui, || {
        let items = git
            .worktrees(repo)?
            .iter()
            .filter(|w| filter(w))
            .map(|w| worktree_item(w, picked == Some(w.path.as_path())))
            .collect();
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(placeholder.to_string()),
            items,
            empty_placeholder: Some("No worktrees found".into()),
            ..Default::default()
        }))
    })?;
    Ok(first_item(pick_step_result(progress, selection)))
}

/// Pick several worktrees matching `filter`.
#[allow(clippy::too_many_arguments)]
pub fn pick_worktrees(
    ui: &mut dyn UserInterface,
    progress: &mut Progress,
    git: &dyn GitProvider,
    repo: &Repository,
    title: &str,
    placeholder: &str,
    filter: impl Fn(&Worktree) -> bool,
    picked: &[PathBuf],
) -> Result<StepResult<Vec<Worktree>>> {
    let selection = show_pick(ui, || {
        let items = git
            .worktrees(repo)?
            .iter()
            .filter(|w| filter(w))
            .map(|w| worktree_item(w, picked.contains(&w.path)))
            .collect();
        Ok(create_pick_step(PickStepConfig {
            title: title.to_string(),
            placeholder: Some(placeholder.to_string()),
            items,
            multi_select: true,
            empty_placeholder: Some("No worktrees found".into()),
            ..Default::default()
        }))
    })?;
    Ok(pick_step_result(progress, selection).map(Picked::into_items))
}

/// Resolve a name the way a user means it: local branch, then remote
/// branch, then tag, then any revision git understands.
pub fn find_reference(
    git: &dyn GitProvider,
    repo: &Repository,
    name: &str,
) -> Result<Option<GitReference>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let branches = git.branches(repo)?;
    if let Some(branch) = branches.iter().find(|b| !b.remote && b.name == name) {
        return Ok(Some(branch.reference()));
    }
    if let Some(branch) = branches.iter().find(|b| b.remote && b.name == name) {
        return Ok(Some(branch.reference()));
    }
    if let Some(tag) = git.tags(repo)?.iter().find(|t| t.name == name) {
        return Ok(Some(tag.reference()));
    }
    Ok(git.resolve_revision(repo, name)?.map(|c| c.reference()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{Branch, Commit, MockGit, Tag, Upstream};
    use crate::ui::{MockAnswer, MockUI};

    const REPO: &str = "/work/app";

    fn repo() -> Repository {
        Repository::new(REPO)
    }

    fn git() -> Rc<dyn GitProvider> {
        Rc::new(
            MockGit::new()
                .with_repo(REPO)
                .with_branch(Branch::local(REPO, "main").as_current())
                .with_branch(Branch::local(REPO, "feature"))
                .with_branch(Branch::remote(REPO, "origin/main"))
                .with_tag(Tag::new(REPO, "v1.0"))
                .with_log(
                    REPO,
                    vec![
                        Commit::new(REPO, "cccccccccc", "third"),
                        Commit::new(REPO, "bbbbbbbbbb", "second"),
                        Commit::new(REPO, "aaaaaaaaaa", "first"),
                    ],
                ),
        )
    }

    #[test]
    fn title_mentions_repos_only_when_several_are_open() {
        let one = vec![repo()];
        assert_eq!(append_repos_to_title("Pull", &one, 1, ""), "Pull");
        assert_eq!(append_repos_to_title("Pull", &one, 2, ""), "Pull  ·  app");
        let two = vec![repo(), Repository::new("/work/lib")];
        assert_eq!(
            append_repos_to_title("Pull", &two, 2, "  ·  x"),
            "Pull  ·  x  ·  2 repositories"
        );
    }

    #[test]
    fn branch_description_shows_tracking() {
        let branch = Branch::local(REPO, "main")
            .as_current()
            .with_upstream(Upstream::new("origin/main"))
            .with_state(2, 1);
        assert_eq!(
            branch_description(&branch).as_deref(),
            Some("current  ·  ↑2 ↓1 origin/main")
        );
        assert_eq!(branch_description(&Branch::local(REPO, "x")), None);
    }

    #[test]
    fn repositories_default_to_first() {
        let repos = vec![repo(), Repository::new("/work/lib")];
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Accept);
        let mut progress = Progress::new(0, None);
        let result = pick_repositories(&mut ui, &mut progress, &repos, "Pull", &[]).unwrap();
        assert!(matches!(result, StepResult::Value(r) if r == vec![repo()]));
        assert_eq!(progress.counter, 1);
    }

    #[test]
    fn tags_appear_after_toggle() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::button("Show Tags"));
        ui.answer(MockAnswer::pick("v1.0"));
        let mut progress = Progress::new(0, None);
        let result = pick_branch_or_tag(
            &mut ui,
            &mut progress,
            &git,
            &repo(),
            "Cherry Pick",
            ReferencePickOptions {
                placeholder: "Choose a branch or tag",
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(result, StepResult::Value(GitReference::Tag(t)) if t.name == "v1.0"));
        let first = &ui.picks()[0];
        assert!(first.items.iter().all(|i| i.label != "v1.0"));
        assert!(ui.last_pick().unwrap().buttons[0].tooltip == "Hide Tags");
    }

    #[test]
    fn unresolved_text_is_reshown_with_warning() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::text("nope"));
        ui.answer(MockAnswer::text("bbbb"));
        let mut progress = Progress::new(0, None);
        let result = pick_branch_or_tag(
            &mut ui,
            &mut progress,
            &git,
            &repo(),
            "Cherry Pick",
            ReferencePickOptions::default(),
        )
        .unwrap();
        assert!(ui.has_warning("'nope' is not a branch, tag or commit"));
        assert!(matches!(result, StepResult::Value(r) if r.is_revision()));
        assert_eq!(progress.counter, 1);
    }

    #[test]
    fn excluded_branch_is_hidden() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Cancel);
        let mut progress = Progress::new(0, None);
        pick_branch_or_tag(
            &mut ui,
            &mut progress,
            &git,
            &repo(),
            "Cherry Pick",
            ReferencePickOptions {
                exclude: Some("main"),
                ..Default::default()
            },
        )
        .unwrap();
        let labels: Vec<&str> = ui.picks()[0].items.iter().map(|i| i.label.as_str()).collect();
        assert!(!labels.contains(&"main"));
        assert!(labels.contains(&"origin/main"));
        assert!(!progress.can_continue());
    }

    #[test]
    fn switch_picker_returns_unknown_text() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::text("brand-new"));
        let mut progress = Progress::new(0, None);
        let result = pick_branch_or_tag_for_switch(
            &mut ui,
            &mut progress,
            &git,
            &[repo()],
            "Switch",
            ReferencePickOptions::default(),
        )
        .unwrap();
        assert!(matches!(result, StepResult::Value(Picked::Text(t)) if t == "brand-new"));
    }

    #[test]
    fn switch_picker_resolves_known_text() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::text("feature"));
        let mut progress = Progress::new(0, None);
        let result = pick_branch_or_tag_for_switch(
            &mut ui,
            &mut progress,
            &git,
            &[repo()],
            "Switch",
            ReferencePickOptions::default(),
        )
        .unwrap();
        assert!(
            matches!(result, StepResult::Value(Picked::Items(r)) if r[0].is_local_branch() && r[0].name() == "feature")
        );
    }

    #[test]
    fn load_more_grows_the_page() {
        let git = git();
        let cache = LogCache::default();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::button("Load More Commits"));
        ui.answer(MockAnswer::pick_all(["first", "third"]));
        let mut progress = Progress::new(0, None);
        let result = pick_commits(
            &mut ui,
            &mut progress,
            git.as_ref(),
            &cache,
            &repo(),
            "main..feature",
            "Cherry Pick",
            "Choose commits",
            &[],
            2,
        )
        .unwrap();
        assert_eq!(ui.picks()[0].items.len(), 2);
        assert_eq!(ui.picks()[1].items.len(), 3);
        assert!(ui.picks()[1].buttons.is_empty());
        match result {
            StepResult::Value(refs) => assert_eq!(refs.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn branch_name_validation_messages() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::text("  "));
        ui.answer(MockAnswer::text("bad name"));
        ui.answer(MockAnswer::text("feature"));
        ui.answer(MockAnswer::text(" fresh "));
        let mut progress = Progress::new(0, None);
        let result =
            input_branch_name(&mut ui, &mut progress, &git, &repo(), "Create Branch", None)
                .unwrap();
        assert!(matches!(result, StepResult::Value(n) if n == "fresh"));

        let messages: Vec<Option<String>> = ui
            .prompts_shown()
            .iter()
            .map(|p| match p {
                crate::ui::ShownPrompt::Input(i) => i.validation_message.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                None,
                Some("Please provide a valid branch name".to_string()),
                Some("'bad name' is not a valid branch name".to_string()),
                Some("A branch named 'feature' already exists".to_string()),
            ]
        );
    }

    #[test]
    fn input_back_breaks() {
        let git = git();
        let mut ui = MockUI::new();
        ui.answer(MockAnswer::Back);
        let mut progress = Progress::new(2, None);
        let result =
            input_branch_name(&mut ui, &mut progress, &git, &repo(), "Create Branch", None)
                .unwrap();
        assert!(result.is_break());
        assert_eq!(progress.counter, 1);
    }

    #[test]
    fn find_reference_prefers_local_branches() {
        let git = git();
        let found = find_reference(git.as_ref(), &repo(), "main").unwrap().unwrap();
        assert!(found.is_local_branch());
        let found = find_reference(git.as_ref(), &repo(), "origin/main")
            .unwrap()
            .unwrap();
        assert!(found.is_remote_branch());
        let found = find_reference(git.as_ref(), &repo(), "v1.0").unwrap().unwrap();
        assert!(matches!(found, GitReference::Tag(_)));
        let found = find_reference(git.as_ref(), &repo(), "aaaa").unwrap().unwrap();
        assert!(found.is_revision());
        assert!(find_reference(git.as_ref(), &repo(), "missing").unwrap().is_none());
    }

    #[test]
    fn log_cache_reuses_answers() {
        let git = git();
        let cache = LogCache::default();
        let first = cache.log(git.as_ref(), &repo(), "a..b", 10).unwrap();
        let second = cache.log(git.as_ref(), &repo(), "a..b", 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.entries.borrow().len(), 1);
    }
}
