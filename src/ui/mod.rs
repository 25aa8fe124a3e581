//! User interface for the step wizards.
//!
//! This module provides:
//! - [`UserInterface`] trait through which every step is shown
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for scripts, which accepts defaults
//! - [`MockUI`] for scripted tests
//!
//! Commands never build these views themselves. A step renders itself into
//! a [`PickPrompt`] or [`InputPrompt`] and the UI answers with a
//! [`PickResponse`] or [`InputResponse`] expressed in indices and text.
//!
//! # Example
//!
//! ```
//! use gitstep::ui::{create_ui, OutputMode, UserInterface};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.success("Pushed main");
//! assert!(!ui.is_interactive());
//! ```

pub mod format;
pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use format::{capitalize, format_relative_time, last_fetched_suffix, pluralize};
pub use mock::{MockAnswer, MockSpinner, MockUI, ShownPrompt};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, is_ci, TerminalUI};
pub use theme::{should_use_colors, GitstepTheme};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::steps::{ButtonKind, Directive};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a list and wait for a choice, typed text, a button or a directive.
    fn pick(&mut self, prompt: &PickPrompt) -> Result<PickResponse>;

    /// Ask for a line of text.
    fn input(&mut self, prompt: &InputPrompt) -> Result<InputResponse>;

    /// Ask for a folder. `None` means the user dismissed the chooser.
    fn choose_folder(&mut self, request: &FolderRequest) -> Result<Option<PathBuf>>;

    /// Open a folder, e.g. a newly created worktree.
    fn open_folder(&mut self, path: &Path, location: OpenLocation) -> Result<()>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);
}

/// How a row of a pick prompt behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptItemKind {
    /// A selectable value.
    Choice,
    /// A non-selectable heading.
    Separator,
    /// Selecting the row issues the directive.
    Directive(Directive),
}

/// One row of a pick prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptItem {
    pub kind: PromptItemKind,
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
    /// Pre-selected (multi-select) or default (single-select).
    pub picked: bool,
}

/// A nav button shown alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptButton {
    pub kind: ButtonKind,
    pub tooltip: String,
}

/// A list to choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickPrompt {
    pub title: String,
    pub placeholder: Option<String>,
    pub items: Vec<PromptItem>,
    pub multi_select: bool,
    pub buttons: Vec<PromptButton>,
    pub can_go_back: bool,
    /// Typed text may be submitted instead of a row.
    pub accepts_text: bool,
    /// Typed text should be reported as a filter query.
    pub filterable: bool,
    /// Current filter text.
    pub value: Option<String>,
    /// This is the final confirmation before a git operation.
    pub confirm: bool,
}

impl PickPrompt {
    /// Indices of the rows that can be chosen.
    pub fn choice_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.kind != PromptItemKind::Separator)
            .map(|(i, _)| i)
    }

    /// Rows pre-selected by the step.
    pub fn picked_indices(&self) -> Vec<usize> {
        self.choice_indices()
            .filter(|&i| self.items[i].picked)
            .collect()
    }
}

/// A line of text to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPrompt {
    pub title: String,
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    /// Why the previously entered value was rejected.
    pub validation_message: Option<String>,
    pub buttons: Vec<PromptButton>,
    pub can_go_back: bool,
}

/// Answer to a [`PickPrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResponse {
    /// Indices into [`PickPrompt::items`].
    Selected(Vec<usize>),
    /// Free text submitted instead of a row.
    Text(String),
    /// The filter text changed.
    Filter(String),
    /// Index into [`PickPrompt::buttons`].
    Button(usize),
    Directive(Directive),
}

/// Answer to an [`InputPrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResponse {
    Value(String),
    Button(usize),
    Directive(Directive),
}

/// A request for a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRequest {
    pub title: String,
    pub default_path: Option<PathBuf>,
}

/// Where a folder should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenLocation {
    CurrentWindow,
    NewWindow,
    AddToWorkspace,
    RevealInExplorer,
}

impl OpenLocation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CurrentWindow => "Open Worktree",
            Self::NewWindow => "Open Worktree in a New Window",
            Self::AddToWorkspace => "Add Worktree to Workspace",
            Self::RevealInExplorer => "Reveal Worktree in File Manager",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: PromptItemKind, picked: bool) -> PromptItem {
        PromptItem {
            kind,
            label: "x".into(),
            description: None,
            detail: None,
            picked,
        }
    }

    #[test]
    fn separators_are_not_choices() {
        let prompt = PickPrompt {
            title: "t".into(),
            placeholder: None,
            items: vec![
                item(PromptItemKind::Separator, false),
                item(PromptItemKind::Choice, true),
                item(PromptItemKind::Directive(Directive::Cancel), false),
            ],
            multi_select: false,
            buttons: Vec::new(),
            can_go_back: true,
            accepts_text: false,
            filterable: false,
            value: None,
            confirm: false,
        };
        assert_eq!(prompt.choice_indices().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(prompt.picked_indices(), vec![1]);
    }

    #[test]
    fn open_locations_have_distinct_labels() {
        let labels = [
            OpenLocation::CurrentWindow,
            OpenLocation::NewWindow,
            OpenLocation::AddToWorkspace,
            OpenLocation::RevealInExplorer,
        ]
        .map(|l| l.label());
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
