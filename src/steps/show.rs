//! Presenting steps to the UI and interpreting the response.
//!
//! The helpers here own the inner loop of a single step: typeahead queries,
//! nav-button clicks and retry requests are handled without returning to the
//! command, so the command only ever sees a final [`Selection`].

use crate::engine::dispatch::CommandArgs;
use crate::error::Result;
use crate::ui::{InputResponse, PickResponse, UserInterface};

use super::buttons::{ButtonAction, StepButton};
use super::custom::CustomStep;
use super::input::InputStep;
use super::pick::{PickEntry, PickStep};
use super::{Directive, Picked, Selection};

/// Outcome of clicking a nav button.
enum Clicked {
    Rebuild,
    Stay,
    Redirect(Box<CommandArgs>),
}

fn click(ui: &mut dyn UserInterface, buttons: &[StepButton], index: usize) -> Result<Clicked> {
    let Some(button) = buttons.get(index) else {
        tracing::debug!("Ignoring click on unknown button {}", index);
        return Ok(Clicked::Stay);
    };
    match &button.action {
        ButtonAction::Refresh(handler) => {
            let mut spinner = ui.start_spinner(&button.tooltip);
            let outcome = handler();
            match &outcome {
                Ok(_) => spinner.finish_success(&button.tooltip),
                Err(e) => spinner.finish_error(&e.to_string()),
            }
            Ok(if outcome? {
                Clicked::Rebuild
            } else {
                Clicked::Stay
            })
        }
        ButtonAction::Redirect(args) => Ok(Clicked::Redirect(args.clone())),
    }
}

/// Show a pick step until it produces a selection.
///
/// `build` is called again whenever the step must be shown afresh: after a
/// `Retry` directive or a button whose handler returned `true`.
pub fn show_pick<T: Clone>(
    ui: &mut dyn UserInterface,
    mut build: impl FnMut() -> Result<PickStep<T>>,
) -> Result<Selection<Picked<T>>> {
    'rebuild: loop {
        let step = build()?;
        let mut entries: Vec<PickEntry<T>> = step.entries.clone();
        let mut query = step.value.clone();

        loop {
            let prompt = step.prompt_for(&entries, query.as_deref());
            tracing::debug!("Showing pick step '{}'", prompt.title);

            match ui.pick(&prompt)? {
                PickResponse::Selected(indices) => {
                    let mut chosen = Vec::new();
                    for index in indices {
                        match entries.get(index) {
                            Some(PickEntry::Item(item)) => chosen.push(item.item.clone()),
                            Some(PickEntry::Directive(d)) => match d.directive {
                                Directive::Retry => continue 'rebuild,
                                directive => return Ok(Selection::Directive(directive)),
                            },
                            Some(PickEntry::Separator(_)) | None => {}
                        }
                    }
                    if chosen.is_empty() && !step.multi_select {
                        continue;
                    }
                    return Ok(Selection::Value(Picked::Items(chosen)));
                }
                PickResponse::Text(text) => {
                    if step.accepts_text {
                        return Ok(Selection::Value(Picked::Text(text)));
                    }
                    tracing::debug!("Step '{}' does not accept typed text", step.title);
                }
                PickResponse::Filter(text) => {
                    if let Some(filter) = &step.filter {
                        entries = filter(&text)?;
                    }
                    query = Some(text);
                }
                PickResponse::Button(index) => match click(ui, &step.buttons, index)? {
                    Clicked::Rebuild => continue 'rebuild,
                    Clicked::Stay => {}
                    Clicked::Redirect(args) => return Ok(Selection::Redirect(args)),
                },
                PickResponse::Directive(Directive::Retry) => continue 'rebuild,
                PickResponse::Directive(Directive::Back) if step.disallow_back => {}
                PickResponse::Directive(directive) => {
                    return Ok(Selection::Directive(directive))
                }
            }
        }
    }
}

/// Show an input step until a value passes validation.
///
/// A rejected value is shown again with the validator's message; the
/// command's counter is untouched.
pub fn show_input(
    ui: &mut dyn UserInterface,
    mut build: impl FnMut() -> Result<InputStep>,
) -> Result<Selection<String>> {
    'rebuild: loop {
        let step = build()?;
        let mut value = step.value.clone();
        let mut message: Option<String> = None;

        loop {
            let prompt = step.prompt(value.as_deref(), message.as_deref());
            tracing::debug!("Showing input step '{}'", prompt.title);

            match ui.input(&prompt)? {
                InputResponse::Value(text) => {
                    let verdict = step.validate(&text)?;
                    if verdict.valid {
                        return Ok(Selection::Value(text));
                    }
                    message = verdict
                        .message
                        .or_else(|| Some(format!("'{}' is not valid", text)));
                    value = Some(text);
                }
                InputResponse::Button(index) => match click(ui, &step.buttons, index)? {
                    Clicked::Rebuild => continue 'rebuild,
                    Clicked::Stay => {}
                    Clicked::Redirect(args) => return Ok(Selection::Redirect(args)),
                },
                InputResponse::Directive(Directive::Retry) => continue 'rebuild,
                InputResponse::Directive(Directive::Back) if step.disallow_back => {}
                InputResponse::Directive(directive) => {
                    return Ok(Selection::Directive(directive))
                }
            }
        }
    }
}

/// Run a custom step.
pub fn show_custom<T>(ui: &mut dyn UserInterface, step: CustomStep<'_, T>) -> Result<Selection<T>> {
    tracing::debug!("Running custom step '{}'", step.title);
    step.run(ui)
}
