//! Interactive prompts rendered with dialoguer.
//!
//! Pick prompts become a `Select` (or `MultiSelect`) whose rows are the
//! prompt's choices followed by one row per nav button and, where the step
//! allows it, a row for typing text. Escape goes back.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};
use std::path::PathBuf;

use crate::error::{GitstepError, Result};
use crate::steps::Directive;

use super::theme::GitstepTheme;
use super::{
    FolderRequest, InputPrompt, InputResponse, PickPrompt, PickResponse, PromptItemKind,
};

/// Convert dialoguer errors to GitstepError.
fn map_dialoguer_err(e: dialoguer::Error) -> GitstepError {
    GitstepError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// What a rendered row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Item(usize),
    Button(usize),
    Type,
    Filter,
}

/// Rows in display order with their rendered labels.
fn rows(prompt: &PickPrompt, theme: &GitstepTheme) -> Vec<(Row, String)> {
    let mut rows = Vec::new();
    for (index, item) in prompt.items.iter().enumerate() {
        let label = match item.kind {
            PromptItemKind::Separator => continue,
            PromptItemKind::Choice => theme.format_row(&item.label, item.description.as_deref()),
            PromptItemKind::Directive(_) => {
                let label = theme.format_directive(&item.label);
                theme.format_row(&label, item.detail.as_deref())
            }
        };
        rows.push((Row::Item(index), label));
    }
    if prompt.filterable {
        rows.push((Row::Filter, theme.format_button("⌕", "Search…")));
    }
    if prompt.accepts_text {
        rows.push((Row::Type, theme.format_button("✎", "Enter a name…")));
    }
    for (index, button) in prompt.buttons.iter().enumerate() {
        rows.push((
            Row::Button(index),
            theme.format_button(button.kind.glyph(), &button.tooltip),
        ));
    }
    rows
}

fn escape(prompt: &PickPrompt) -> PickResponse {
    if prompt.can_go_back {
        PickResponse::Directive(Directive::Back)
    } else {
        PickResponse::Directive(Directive::Cancel)
    }
}

/// A free-text input, pre-filled with `initial` when given.
fn text_input<'a>(
    theme: &'a ColorfulTheme,
    label: &str,
    initial: Option<&str>,
) -> Input<'a, String> {
    let input = Input::<String>::with_theme(theme)
        .with_prompt(label)
        .allow_empty(true);
    match initial {
        Some(initial) => input.with_initial_text(initial),
        None => input,
    }
}

fn read_text(term: &Term, label: &str, initial: Option<&str>) -> Result<String> {
    let theme = prompt_theme();
    text_input(&theme, label, initial)
        .interact_text_on(term)
        .map_err(map_dialoguer_err)
}

fn act(prompt: &PickPrompt, term: &Term, row: Row) -> Result<Option<PickResponse>> {
    Ok(match row {
        Row::Item(_) => None,
        Row::Button(index) => Some(PickResponse::Button(index)),
        Row::Filter => Some(PickResponse::Filter(read_text(
            term,
            "Search",
            prompt.value.as_deref(),
        )?)),
        Row::Type => {
            let text = read_text(term, "Name", prompt.value.as_deref())?;
            Some(if text.trim().is_empty() {
                escape(prompt)
            } else {
                PickResponse::Text(text)
            })
        }
    })
}

/// Show a pick prompt on the terminal.
pub fn pick_on_term(prompt: &PickPrompt, term: &Term, theme: &GitstepTheme) -> Result<PickResponse> {
    let rows = rows(prompt, theme);
    let labels: Vec<&str> = rows.iter().map(|(_, label)| label.as_str()).collect();
    let title = theme.format_title(&prompt.title, prompt.placeholder.as_deref());

    if prompt.multi_select {
        let defaults: Vec<bool> = rows
            .iter()
            .map(|(row, _)| matches!(row, Row::Item(i) if prompt.items[*i].picked))
            .collect();
        let select_theme = prompt_theme();
        let Some(chosen) = MultiSelect::with_theme(&select_theme)
            .with_prompt(title)
            .items(&labels)
            .defaults(&defaults)
            .interact_on_opt(term)
            .map_err(map_dialoguer_err)?
        else {
            return Ok(escape(prompt));
        };

        // An action row wins over any ticked items.
        for &index in &chosen {
            if let Some(response) = act(prompt, term, rows[index].0)? {
                return Ok(response);
            }
        }
        let items = chosen
            .into_iter()
            .filter_map(|index| match rows[index].0 {
                Row::Item(i) => Some(i),
                _ => None,
            })
            .collect();
        return Ok(PickResponse::Selected(items));
    }

    let default = rows
        .iter()
        .position(|(row, _)| matches!(row, Row::Item(i) if prompt.items[*i].picked))
        .unwrap_or(0);
    let select_theme = prompt_theme();
    let Some(index) = Select::with_theme(&select_theme)
        .with_prompt(title)
        .items(&labels)
        .default(default)
        .interact_on_opt(term)
        .map_err(map_dialoguer_err)?
    else {
        return Ok(escape(prompt));
    };

    let row = rows[index].0;
    match row {
        Row::Item(i) => Ok(PickResponse::Selected(vec![i])),
        other => Ok(act(prompt, term, other)?.unwrap_or_else(|| escape(prompt))),
    }
}

/// Show an input prompt on the terminal. An empty line goes back.
pub fn input_on_term(prompt: &InputPrompt, term: &Term, theme: &GitstepTheme) -> Result<InputResponse> {
    if let Some(message) = &prompt.validation_message {
        term.write_line(&theme.format_warning(message))?;
    }
    let label = match &prompt.prompt {
        Some(text) => format!("{} · {}", prompt.title, text),
        None => prompt.title.clone(),
    };
    let text = read_text(term, &label, prompt.value.as_deref())?;
    if text.trim().is_empty() {
        return Ok(InputResponse::Directive(if prompt.can_go_back {
            Directive::Back
        } else {
            Directive::Cancel
        }));
    }
    Ok(InputResponse::Value(text))
}

/// Ask for a folder path on the terminal. An empty line dismisses.
pub fn folder_on_term(request: &FolderRequest, term: &Term) -> Result<Option<PathBuf>> {
    let default = request
        .default_path
        .as_ref()
        .map(|p| p.display().to_string());
    let text = read_text(term, &request.title, default.as_deref())?;
    let text = text.trim();
    Ok(if text.is_empty() {
        None
    } else {
        Some(PathBuf::from(text))
    })
}
