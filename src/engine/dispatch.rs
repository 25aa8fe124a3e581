//! Cross-command delegation and the top-level command palette.
//!
//! [`get_steps`] is the only way one command runs another. The parent
//! receives the child's [`StepResult`] and reacts to it like one of its own
//! steps: `Break` behaves as a back at the current position, a value ends
//! the parent, and a redirect is passed upward untouched until it reaches
//! the [`Wizard`], which starts the requested command.

use std::rc::Rc;

use crate::commands::{
    BranchArgs, BranchCommand, CherryPickArgs, CherryPickCommand, PullArgs, PullCommand,
    PushArgs, PushCommand, SwitchArgs, SwitchCommand, WorktreeArgs, WorktreeCommand,
};
use crate::error::Result;
use crate::steps::{
    create_pick_step, show_pick, PickEntry, PickItem, PickStepConfig, Picked, Selection,
    StepResult,
};
use crate::ui::UserInterface;

use super::{QuickCommand, Services};

/// How a command was reached; part of its skip-confirm key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickedVia {
    /// Chosen from the command palette.
    Menu,
    /// Invoked directly, from the command line or by another command.
    Command,
}

impl PickedVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Command => "command",
        }
    }
}

/// A command together with the partial state it starts from.
#[derive(Debug, Clone)]
pub enum CommandArgs {
    Branch(BranchArgs),
    CherryPick(CherryPickArgs),
    Pull(PullArgs),
    Push(PushArgs),
    Switch(SwitchArgs),
    Worktree(WorktreeArgs),
}

impl CommandArgs {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Branch(_) => CommandKind::Branch,
            Self::CherryPick(_) => CommandKind::CherryPick,
            Self::Pull(_) => CommandKind::Pull,
            Self::Push(_) => CommandKind::Push,
            Self::Switch(_) => CommandKind::Switch,
            Self::Worktree(_) => CommandKind::Worktree,
        }
    }
}

/// The commands offered by the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Branch,
    CherryPick,
    Pull,
    Push,
    Switch,
    Worktree,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        Self::Branch,
        Self::CherryPick,
        Self::Pull,
        Self::Push,
        Self::Switch,
        Self::Worktree,
    ];

    /// Name used on the command line and in the palette.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::CherryPick => "cherry-pick",
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Switch => "switch",
            Self::Worktree => "worktree",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Branch => "create, prune, rename, or delete branches",
            Self::CherryPick => "integrates changes from specified commits into the current branch",
            Self::Pull => "fetches and integrates changes from a remote into the current branch",
            Self::Push => "pushes changes from the current branch to a remote",
            Self::Switch => "switches the current branch to a specified branch",
            Self::Worktree => "create, open, or delete worktrees",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::CherryPick => &["cherry"],
            Self::Switch => &["checkout"],
            _ => &[],
        }
    }

    /// Arguments that start the command from scratch.
    pub fn default_args(&self) -> CommandArgs {
        match self {
            Self::Branch => CommandArgs::Branch(BranchArgs::default()),
            Self::CherryPick => CommandArgs::CherryPick(CherryPickArgs::default()),
            Self::Pull => CommandArgs::Pull(PullArgs::default()),
            Self::Push => CommandArgs::Push(PushArgs::default()),
            Self::Switch => CommandArgs::Switch(SwitchArgs::default()),
            Self::Worktree => CommandArgs::Worktree(WorktreeArgs::default()),
        }
    }

    /// Look a command up by label or alias, falling back to a prefix that
    /// matches exactly one command.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        if let Some(kind) = Self::ALL
            .into_iter()
            .find(|k| k.label() == name || k.aliases().contains(&name.as_str()))
        {
            return Some(kind);
        }

        let matches: Vec<CommandKind> = Self::ALL
            .into_iter()
            .filter(|k| {
                k.label().starts_with(&name) || k.aliases().iter().any(|a| a.starts_with(&name))
            })
            .collect();
        match matches.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.label().contains(&query)
            || self.aliases().iter().any(|a| a.contains(&query))
    }
}

/// Build the command for `args`.
pub fn create_command(
    services: &Rc<Services>,
    args: CommandArgs,
    via: PickedVia,
) -> Box<dyn QuickCommand> {
    let services = Rc::clone(services);
    match args {
        CommandArgs::Branch(args) => Box::new(BranchCommand::new(services, args, via)),
        CommandArgs::CherryPick(args) => Box::new(CherryPickCommand::new(services, args, via)),
        CommandArgs::Pull(args) => Box::new(PullCommand::new(services, args, via)),
        CommandArgs::Push(args) => Box::new(PushCommand::new(services, args, via)),
        CommandArgs::Switch(args) => Box::new(SwitchCommand::new(services, args, via)),
        CommandArgs::Worktree(args) => Box::new(WorktreeCommand::new(services, args, via)),
    }
}

/// Run the command described by `args` as a nested flow and return its
/// outcome to the caller.
pub fn get_steps(
    services: &Rc<Services>,
    ui: &mut dyn UserInterface,
    args: CommandArgs,
    via: PickedVia,
) -> Result<StepResult<()>> {
    let kind = args.kind();
    tracing::debug!("Entering {} ({})", kind.label(), via.as_str());
    let mut command = create_command(services, args, via);
    let result = command.steps(ui)?;
    tracing::debug!(
        "Leaving {}: {}",
        kind.label(),
        match &result {
            StepResult::Value(_) => "completed",
            StepResult::Break => "break",
            StepResult::Redirect(_) => "redirect",
        }
    );
    Ok(result)
}

/// How a wizard session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    /// A command ran to its end (executed or cancelled).
    Completed,
    /// The user left without finishing a command.
    Dismissed,
}

/// Top-level host loop.
pub struct Wizard {
    services: Rc<Services>,
}

impl Wizard {
    pub fn new(services: Rc<Services>) -> Self {
        Self { services }
    }

    /// Run `initial`, or the command palette when no command was given.
    ///
    /// Backing out of a command chosen from the palette shows the palette
    /// again; backing out of the palette, or of a command given directly,
    /// leaves the wizard.
    pub fn run(
        &self,
        ui: &mut dyn UserInterface,
        initial: Option<CommandArgs>,
    ) -> Result<WizardOutcome> {
        let palette = initial.is_none();
        let mut next = initial.map(|args| (args, PickedVia::Command));

        loop {
            let (args, via) = match next.take() {
                Some(pending) => pending,
                None => match self.pick_command(ui)? {
                    Some(kind) => (kind.default_args(), PickedVia::Menu),
                    None => return Ok(WizardOutcome::Dismissed),
                },
            };

            match get_steps(&self.services, ui, args, via)? {
                StepResult::Value(()) => return Ok(WizardOutcome::Completed),
                StepResult::Break if palette => continue,
                StepResult::Break => return Ok(WizardOutcome::Dismissed),
                StepResult::Redirect(args) => {
                    tracing::debug!("Redirecting to {}", args.kind().label());
                    next = Some((*args, PickedVia::Command));
                }
            }
        }
    }

    fn pick_command(&self, ui: &mut dyn UserInterface) -> Result<Option<CommandKind>> {
        let entries = |query: &str| -> Vec<PickEntry<CommandKind>> {
            CommandKind::ALL
                .into_iter()
                .filter(|k| k.matches_query(query))
                .map(|k| PickItem::new(k.label(), k).description(k.description()).into())
                .collect()
        };

        loop {
            let selection = show_pick(ui, || {
                Ok(create_pick_step(PickStepConfig {
                    title: "gitstep".into(),
                    placeholder: Some("Choose a command".into()),
                    items: entries(""),
                    filter: Some(Rc::new(move |query: &str| Ok(entries(query)))),
                    accepts_text: true,
                    empty_placeholder: Some("No commands match".into()),
                    ..Default::default()
                }))
            })?;

            match selection {
                Selection::Value(Picked::Items(kinds)) => return Ok(kinds.into_iter().next()),
                Selection::Value(Picked::Text(text)) => match CommandKind::from_name(&text) {
                    Some(kind) => return Ok(Some(kind)),
                    None => ui.warning(&format!("Unknown command '{}'", text.trim())),
                },
                Selection::Directive(_) | Selection::Redirect(_) => return Ok(None),
            }
        }
    }
}
