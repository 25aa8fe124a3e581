//! Nav buttons attached to steps.

use std::fmt;
use std::rc::Rc;

use crate::engine::dispatch::CommandArgs;
use crate::error::Result;

/// Click handler for a refresh-style button.
///
/// Returning `true` asks for the step to be rebuilt and shown again in
/// place; `false` keeps the current step as it is.
pub type RefreshHandler = Rc<dyn Fn() -> Result<bool>>;

/// What a button is for. Drives its rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Fetch,
    ShowTags { on: bool },
    LoadMore,
    OpenCommand,
}

impl ButtonKind {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Fetch => "⟳",
            Self::ShowTags { on: true } => "◉",
            Self::ShowTags { on: false } => "○",
            Self::LoadMore => "…",
            Self::OpenCommand => "↗",
        }
    }
}

/// What happens when a button is clicked.
#[derive(Clone)]
pub enum ButtonAction {
    Refresh(RefreshHandler),
    /// Leave this command and run another one.
    Redirect(Box<CommandArgs>),
}

impl fmt::Debug for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh(_) => f.write_str("Refresh(..)"),
            Self::Redirect(args) => f.debug_tuple("Redirect").field(args).finish(),
        }
    }
}

/// A button shown alongside a step.
#[derive(Debug, Clone)]
pub struct StepButton {
    pub kind: ButtonKind,
    pub tooltip: String,
    pub action: ButtonAction,
}

impl StepButton {
    /// A button whose handler may request the step be shown again.
    pub fn refresh(
        kind: ButtonKind,
        tooltip: impl Into<String>,
        handler: impl Fn() -> Result<bool> + 'static,
    ) -> Self {
        Self {
            kind,
            tooltip: tooltip.into(),
            action: ButtonAction::Refresh(Rc::new(handler)),
        }
    }

    /// A button that hands off to another command.
    pub fn redirect(tooltip: impl Into<String>, args: CommandArgs) -> Self {
        Self {
            kind: ButtonKind::OpenCommand,
            tooltip: tooltip.into(),
            action: ButtonAction::Redirect(Box::new(args)),
        }
    }

    /// The conventional "Fetch" button.
    pub fn fetch(handler: impl Fn() -> Result<bool> + 'static) -> Self {
        Self::refresh(ButtonKind::Fetch, "Fetch", handler)
    }
}
