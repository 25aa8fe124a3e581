//! The concrete git commands.
//!
//! Each command owns a [`StepState`](crate::engine::StepState) built from its
//! `*Args`, and walks its positions in a single loop that re-checks every
//! position on each pass. Shared step builders live in [`common`].

pub mod branch;
pub mod cherry_pick;
pub mod common;
pub mod pull;
pub mod push;
pub mod switch;
pub mod worktree;

pub use branch::{
    BranchArgs, BranchCommand, BranchState, BranchSubcommand, BranchSubcommandState,
    CreateBranchFlags, CreateBranchState, DeleteBranchFlags, DeleteBranchState,
    PruneBranchState, RenameBranchState,
};
pub use cherry_pick::{CherryPickArgs, CherryPickCommand, CherryPickFlags, CherryPickState};
pub use pull::{PullArgs, PullCommand, PullFlags, PullState};
pub use push::{PushArgs, PushCommand, PushFlags, PushState};
pub use switch::{SwitchArgs, SwitchChoice, SwitchCommand, SwitchState};
pub use worktree::{
    ChangesKind, CopyChangesState, CreateWorktreeFlags, CreateWorktreeState, DeleteWorktreeState,
    OpenWorktreeState, WorktreeArgs, WorktreeCommand, WorktreeState, WorktreeSubcommand,
    WorktreeSubcommandState,
};

#[cfg(test)]
pub(crate) mod testing {
    use std::rc::Rc;

    use crate::config::WizardConfig;
    use crate::engine::{QuickCommand, Services};
    use crate::git::MockGit;
    use crate::steps::StepResult;
    use crate::ui::MockUI;

    pub fn services(git: &Rc<MockGit>) -> Rc<Services> {
        services_with(git, WizardConfig::default())
    }

    pub fn services_skipping(git: &Rc<MockGit>, keys: &[&str]) -> Rc<Services> {
        services_with(
            git,
            WizardConfig {
                skip_confirmations: keys.iter().map(|k| k.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    pub fn services_with(git: &Rc<MockGit>, config: WizardConfig) -> Rc<Services> {
        Services::new(git.clone(), config)
    }

    pub fn run(command: &mut dyn QuickCommand, ui: &mut MockUI) -> StepResult<()> {
        command.steps(ui).unwrap()
    }
}
