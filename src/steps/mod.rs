//! Step protocol: the vocabulary exchanged between a command and the UI.
//!
//! A command never talks to the terminal directly. It builds a step
//! ([`PickStep`], [`InputStep`] or [`CustomStep`]), hands a builder for it to
//! one of the `show_*` helpers in [`show`], and receives a [`Selection`]:
//! either the chosen value, a [`Directive`] (back, cancel, retry), or a
//! request to redirect into another command.
//!
//! Before trusting a selection every command calls
//! [`can_pick_step_continue`] or [`can_step_continue`], which also apply the
//! directive's effect on the step counter.

pub mod buttons;
pub mod custom;
pub mod input;
pub mod pick;
pub mod show;

pub use buttons::{ButtonAction, ButtonKind, RefreshHandler, StepButton};
pub use custom::{create_custom_step, CustomStep};
pub use input::{create_input_step, InputStep, InputStepConfig, Validation, Validator};
pub use pick::{
    create_confirm_step, create_pick_step, flags_item, ConfirmOptions, DirectiveItem,
    ItemFilter, PickEntry, PickItem, PickStep, PickStepConfig,
};
pub use show::{show_custom, show_input, show_pick};

use crate::engine::dispatch::CommandArgs;
use crate::engine::Progress;

/// Out-of-band signal that can replace any step value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Return to the previous step.
    Back,
    /// Abandon the command.
    Cancel,
    /// Show the current step again, rebuilt from current state.
    Retry,
}

impl Directive {
    /// Default label for a directive entry.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Back => "Back",
            Self::Cancel => "Cancel",
            Self::Retry => "Try Again",
        }
    }
}

/// Outcome of a step-producing call.
#[derive(Debug)]
pub enum StepResult<T> {
    Value(T),
    /// The user backed out; the caller falls back to its previous step.
    Break,
    /// Abandon this flow and run a different command instead.
    Redirect(Box<CommandArgs>),
}

impl<T> StepResult<T> {
    pub fn is_break(&self) -> bool {
        matches!(self, Self::Break)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepResult<U> {
        match self {
            Self::Value(value) => StepResult::Value(f(value)),
            Self::Break => StepResult::Break,
            Self::Redirect(args) => StepResult::Redirect(args),
        }
    }
}

/// What the UI returned for a shown step.
#[derive(Debug)]
pub enum Selection<T> {
    Value(T),
    Directive(Directive),
    Redirect(Box<CommandArgs>),
}

/// The value of a pick step: chosen payloads, or free text typed instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picked<T> {
    Items(Vec<T>),
    Text(String),
}

impl<T> Picked<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Items(items) => items.is_empty(),
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    /// Chosen payloads, or an empty list for typed text.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::Text(_) => Vec::new(),
        }
    }

    /// First chosen payload.
    pub fn into_first(self) -> Option<T> {
        self.into_items().into_iter().next()
    }
}

/// Whether a pick step's selection can be trusted.
///
/// True iff the selection holds at least one item (or non-empty text) and is
/// not a directive. A valid selection advances the counter; `Back` rewinds it
/// one position and `Cancel` ends the command.
pub fn can_pick_step_continue<T>(progress: &mut Progress, selection: &Selection<Picked<T>>) -> bool {
    match selection {
        Selection::Value(picked) if !picked.is_empty() => {
            progress.advance();
            true
        }
        Selection::Value(_) => false,
        Selection::Directive(directive) => {
            apply_directive(progress, *directive);
            false
        }
        Selection::Redirect(_) => false,
    }
}

/// Generalized form of [`can_pick_step_continue`] for input and custom steps.
pub fn can_step_continue<T>(progress: &mut Progress, selection: &Selection<T>) -> bool {
    match selection {
        Selection::Value(_) => {
            progress.advance();
            true
        }
        Selection::Directive(directive) => {
            apply_directive(progress, *directive);
            false
        }
        Selection::Redirect(_) => false,
    }
}

/// Check a pick selection and convert it into a [`StepResult`].
///
/// Anything that cannot continue becomes `Break`, except a redirect, which
/// is passed through.
pub fn pick_step_result<T>(
    progress: &mut Progress,
    selection: Selection<Picked<T>>,
) -> StepResult<Picked<T>> {
    let proceed = can_pick_step_continue(progress, &selection);
    match selection {
        Selection::Value(picked) if proceed => StepResult::Value(picked),
        Selection::Redirect(args) => StepResult::Redirect(args),
        _ => StepResult::Break,
    }
}

/// [`pick_step_result`] for input and custom steps.
pub fn step_result<T>(progress: &mut Progress, selection: Selection<T>) -> StepResult<T> {
    let proceed = can_step_continue(progress, &selection);
    match selection {
        Selection::Value(value) if proceed => StepResult::Value(value),
        Selection::Redirect(args) => StepResult::Redirect(args),
        _ => StepResult::Break,
    }
}

fn apply_directive(progress: &mut Progress, directive: Directive) {
    match directive {
        Directive::Back => progress.back(),
        Directive::Cancel => progress.cancel(),
        Directive::Retry => {}
    }
}
