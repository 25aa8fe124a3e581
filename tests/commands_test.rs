//! Command scenarios run end to end: command line in, git operations out.

use std::path::Path;
use std::rc::Rc;

use clap::Parser;
use gitstep::cli::{ArgsResolver, Cli};
use chrono::{TimeZone, Utc};
use gitstep::config::{OpenAfterCreate, WizardConfig, WorktreeSettings};
use gitstep::engine::{Services, Wizard, WizardOutcome};
use gitstep::git::{
    Branch, Commit, DeleteBranchOptions, GitCall, MockGit, SwitchOptions, Tag, Upstream,
    Worktree, WorktreeCreateOptions,
};
use gitstep::ui::{MockAnswer, MockUI};
use gitstep::GitstepError;

const REPO: &str = "/work/app";

fn git() -> Rc<MockGit> {
    Rc::new(
        MockGit::new()
            .with_repo(REPO)
            .with_branch(Branch::local(REPO, "main").as_current())
            .with_branch(Branch::local(REPO, "feature").with_upstream(Upstream::new("origin/feature")))
            .with_branch(Branch::local(REPO, "stale").with_upstream(Upstream::gone("origin/stale")))
            .with_branch(Branch::remote(REPO, "origin/feature"))
            .with_branch(Branch::remote(REPO, "origin/topic"))
            .with_tag(Tag::new(REPO, "v1.0"))
            .with_worktree(Worktree::new(REPO, REPO).with_branch("main").as_main()),
    )
}

fn run(
    git: &Rc<MockGit>,
    config: WizardConfig,
    argv: &[&str],
    ui: &mut MockUI,
) -> Result<WizardOutcome, GitstepError> {
    let cli = Cli::try_parse_from(argv).unwrap();
    let initial = ArgsResolver::new(git.as_ref(), Path::new(REPO), cli.no_confirm)
        .resolve(cli.command.as_ref())?;
    Wizard::new(Services::new(git.clone(), config)).run(ui, initial)
}

#[test]
fn switch_to_named_branch_confirms_then_switches() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick("Switch to Branch"));

    let outcome = run(&git, WizardConfig::default(), &["gitstep", "switch", "feature"], &mut ui).unwrap();

    assert_eq!(outcome, WizardOutcome::Completed);
    assert_eq!(ui.titles(), vec!["Confirm Switch to Branch feature"]);
    assert_eq!(
        git.calls(),
        vec![GitCall::Switch {
            repos: vec![REPO.into()],
            reference: "feature".into(),
            options: SwitchOptions::default(),
        }]
    );
}

#[test]
fn no_confirm_flag_runs_without_prompting() {
    let git = git();
    let mut ui = MockUI::new();

    run(
        &git,
        WizardConfig::default(),
        &["gitstep", "--no-confirm", "switch", "feature"],
        &mut ui,
    )
    .unwrap();

    assert!(ui.prompts_shown().is_empty());
    assert_eq!(git.calls().len(), 1);
}

#[test]
fn configured_skip_list_applies_to_command_line_runs() {
    let git = git();
    let mut ui = MockUI::new();
    let config = WizardConfig {
        skip_confirmations: vec!["switch:command".into()],
        ..Default::default()
    };

    run(&git, config, &["gitstep", "switch", "v1.0"], &mut ui).unwrap();

    assert!(ui.prompts_shown().is_empty());
    assert!(matches!(
        &git.calls()[0],
        GitCall::Switch { reference, .. } if reference == "v1.0"
    ));
}

#[test]
fn palette_leads_into_the_chosen_command() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick("switch"));
    ui.answer(MockAnswer::pick("feature"));
    ui.answer(MockAnswer::pick("Switch to Branch"));

    let outcome = run(&git, WizardConfig::default(), &["gitstep"], &mut ui).unwrap();

    assert_eq!(outcome, WizardOutcome::Completed);
    assert_eq!(
        ui.titles(),
        vec!["gitstep", "Switch to...", "Confirm Switch to Branch feature"]
    );
    assert_eq!(git.calls().len(), 1);
}

#[test]
fn backing_out_of_a_command_returns_to_the_palette() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick("switch"));
    ui.answer(MockAnswer::Back);
    ui.answer(MockAnswer::Cancel);

    let outcome = run(&git, WizardConfig::default(), &["gitstep"], &mut ui).unwrap();

    assert_eq!(outcome, WizardOutcome::Dismissed);
    assert_eq!(ui.titles(), vec!["gitstep", "Switch to...", "gitstep"]);
    assert!(git.calls().is_empty());
}

#[test]
fn rename_from_command_line_goes_straight_to_confirm() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick("Rename Branch"));

    run(
        &git,
        WizardConfig::default(),
        &["gitstep", "branch", "rename", "feature", "feature-2"],
        &mut ui,
    )
    .unwrap();

    assert_eq!(ui.picks().len(), 1);
    assert_eq!(
        git.calls(),
        vec![GitCall::RenameBranch {
            repo: REPO.into(),
            from: "feature".into(),
            to: "feature-2".into(),
        }]
    );
}

#[test]
fn prune_offers_only_branches_with_gone_upstreams() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick_all(["stale"]));
    ui.answer(MockAnswer::pick("Delete Branch"));

    run(&git, WizardConfig::default(), &["gitstep", "branch", "prune"], &mut ui).unwrap();

    let labels: Vec<String> = ui.picks()[0].items.iter().map(|i| i.label.clone()).collect();
    assert!(labels.contains(&"stale".to_string()));
    assert!(!labels.contains(&"feature".to_string()));
    assert_eq!(
        git.calls(),
        vec![GitCall::DeleteBranches {
            repo: REPO.into(),
            names: vec!["stale".into()],
            options: DeleteBranchOptions::default(),
        }]
    );
}

#[test]
fn unknown_reference_is_reported_before_prompting() {
    let git = git();
    let mut ui = MockUI::new();

    let err = run(&git, WizardConfig::default(), &["gitstep", "push", "nope"], &mut ui).unwrap_err();

    assert!(matches!(err, GitstepError::InvalidReference { ref name } if name == "nope"));
    assert!(ui.prompts_shown().is_empty());
}

#[test]
fn unknown_worktree_is_reported() {
    let git = git();
    let mut ui = MockUI::new();

    let err = run(
        &git,
        WizardConfig::default(),
        &["gitstep", "worktree", "delete", "/work/elsewhere"],
        &mut ui,
    )
    .unwrap_err();

    assert!(matches!(err, GitstepError::UnknownWorktree { .. }));
}

#[test]
fn cherry_picked_revisions_apply_oldest_first() {
    let dated = |sha: &str, summary: &str, day: u32| {
        let mut commit = Commit::new(REPO, sha, summary);
        commit.date = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
        commit
    };
    let git = Rc::new(
        MockGit::new()
            .with_repo(REPO)
            .with_branch(Branch::local(REPO, "main").as_current())
            .with_log(
                REPO,
                vec![
                    dated("c3c3c3c3", "third", 3),
                    dated("c2c2c2c2", "second", 2),
                    dated("c1c1c1c1", "first", 1),
                ],
            ),
    );
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::pick("Cherry Pick"));

    run(
        &git,
        WizardConfig::default(),
        &["gitstep", "cherry-pick", "c3c3", "c1c1"],
        &mut ui,
    )
    .unwrap();

    assert_eq!(ui.titles(), vec!["Confirm Cherry Pick into branch main"]);
    match git.calls().as_slice() {
        [GitCall::CherryPick { shas, .. }] => assert_eq!(shas, &["c1c1c1c1", "c3c3c3c3"]),
        other => panic!("unexpected calls: {:?}", other),
    }
}

#[test]
fn worktree_for_remote_branch_creates_local_branch() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::Accept);
    let config = WizardConfig {
        worktrees: WorktreeSettings {
            open_after_create: OpenAfterCreate::Never,
            ..Default::default()
        },
        ..Default::default()
    };

    run(&git, config, &["gitstep", "worktree", "create", "origin/topic"], &mut ui).unwrap();

    assert_eq!(ui.titles(), vec!["Confirm Create Worktree  ·  topic"]);
    assert_eq!(
        git.calls(),
        vec![GitCall::CreateWorktree {
            repo: REPO.into(),
            path: "/work/app.worktrees/topic".into(),
            options: WorktreeCreateOptions {
                commitish: Some("origin/topic".into()),
                create_branch: Some("topic".into()),
                ..Default::default()
            },
        }]
    );
}

#[test]
fn copy_staged_changes_between_worktrees() {
    let patch = "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-x\n+y\n";
    let git = Rc::new(
        MockGit::new()
            .with_repo(REPO)
            .with_worktree(Worktree::new(REPO, REPO).with_branch("main").as_main())
            .with_worktree(Worktree::new(REPO, "/work/app.worktrees/feature").with_branch("feature"))
            .with_patch(REPO, true, patch),
    );
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::Accept);
    ui.answer(MockAnswer::Cancel);

    run(
        &git,
        WizardConfig::default(),
        &[
            "gitstep",
            "worktree",
            "copy-changes",
            "/work/app.worktrees/feature",
            "--from",
            REPO,
            "--staged",
        ],
        &mut ui,
    )
    .unwrap();

    assert_eq!(
        ui.titles(),
        vec![
            "Confirm Copy Changes to Worktree  ·  feature",
            "Confirm Open Worktree  ·  feature"
        ]
    );
    assert_eq!(
        git.calls(),
        vec![GitCall::ApplyPatch {
            path: "/work/app.worktrees/feature".into(),
            patch: patch.into(),
        }]
    );
}

#[test]
fn delete_confirms_even_with_no_confirm() {
    let git = git();
    let mut ui = MockUI::new();
    ui.answer(MockAnswer::Cancel);

    run(
        &git,
        WizardConfig::default(),
        &["gitstep", "--no-confirm", "branch", "delete", "stale"],
        &mut ui,
    )
    .unwrap();

    assert_eq!(ui.titles(), vec!["Confirm Delete Branches"]);
    assert!(git.calls().is_empty());
}
