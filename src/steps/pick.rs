//! Pick and confirm steps.

use std::fmt;
use std::rc::Rc;

use crate::engine::invariant_violation;
use crate::error::Result;
use crate::ui::{PickPrompt, PromptButton, PromptItem, PromptItemKind};

use super::buttons::StepButton;
use super::Directive;

/// Per-keystroke callback that recomputes the entries for a query.
pub type ItemFilter<T> = Rc<dyn Fn(&str) -> Result<Vec<PickEntry<T>>>>;

/// A selectable entry carrying a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PickItem<T> {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
    /// Pre-selected when the step is shown.
    pub picked: bool,
    pub item: T,
}

impl<T> PickItem<T> {
    pub fn new(label: impl Into<String>, item: T) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
            picked: false,
            item,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn picked(mut self, picked: bool) -> Self {
        self.picked = picked;
        self
    }
}

/// An entry rendered as a directive instead of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveItem {
    pub directive: Directive,
    pub label: String,
    pub detail: Option<String>,
    pub picked: bool,
}

impl DirectiveItem {
    pub fn new(directive: Directive) -> Self {
        Self {
            directive,
            label: directive.label().to_string(),
            detail: None,
            picked: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn picked(mut self) -> Self {
        self.picked = true;
        self
    }
}

/// One row of a pick step.
#[derive(Debug, Clone, PartialEq)]
pub enum PickEntry<T> {
    Item(PickItem<T>),
    Separator(Option<String>),
    Directive(DirectiveItem),
}

impl<T> PickEntry<T> {
    pub fn item(label: impl Into<String>, item: T) -> Self {
        Self::Item(PickItem::new(label, item))
    }

    pub fn separator(label: impl Into<String>) -> Self {
        Self::Separator(Some(label.into()))
    }

    fn to_prompt_item(&self) -> PromptItem {
        match self {
            Self::Item(item) => PromptItem {
                kind: PromptItemKind::Choice,
                label: item.label.clone(),
                description: item.description.clone(),
                detail: item.detail.clone(),
                picked: item.picked,
            },
            Self::Separator(label) => PromptItem {
                kind: PromptItemKind::Separator,
                label: label.clone().unwrap_or_default(),
                description: None,
                detail: None,
                picked: false,
            },
            Self::Directive(directive) => PromptItem {
                kind: PromptItemKind::Directive(directive.directive),
                label: directive.label.clone(),
                description: None,
                detail: directive.detail.clone(),
                picked: directive.picked,
            },
        }
    }
}

impl<T> From<PickItem<T>> for PickEntry<T> {
    fn from(item: PickItem<T>) -> Self {
        Self::Item(item)
    }
}

/// Everything needed to build a [`PickStep`].
pub struct PickStepConfig<T> {
    pub title: String,
    pub placeholder: Option<String>,
    pub items: Vec<PickEntry<T>>,
    pub multi_select: bool,
    pub buttons: Vec<StepButton>,
    pub filter: Option<ItemFilter<T>>,
    /// Typed text can be submitted in place of an item.
    pub accepts_text: bool,
    /// Initial filter text.
    pub value: Option<String>,
    pub disallow_back: bool,
    /// Placeholder shown (with a single back entry) when `items` is empty.
    pub empty_placeholder: Option<String>,
}

impl<T> Default for PickStepConfig<T> {
    fn default() -> Self {
        Self {
            title: String::new(),
            placeholder: None,
            items: Vec::new(),
            multi_select: false,
            buttons: Vec::new(),
            filter: None,
            accepts_text: false,
            value: None,
            disallow_back: false,
            empty_placeholder: None,
        }
    }
}

/// A prompt over a list of entries.
pub struct PickStep<T> {
    pub title: String,
    pub placeholder: Option<String>,
    pub entries: Vec<PickEntry<T>>,
    pub multi_select: bool,
    pub buttons: Vec<StepButton>,
    pub filter: Option<ItemFilter<T>>,
    pub accepts_text: bool,
    pub value: Option<String>,
    pub disallow_back: bool,
    /// Rendered as a final confirmation.
    pub confirm: bool,
}

impl<T: fmt::Debug> fmt::Debug for PickStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickStep")
            .field("title", &self.title)
            .field("placeholder", &self.placeholder)
            .field("entries", &self.entries)
            .field("multi_select", &self.multi_select)
            .field("buttons", &self.buttons)
            .field("filter", &self.filter.is_some())
            .field("confirm", &self.confirm)
            .finish()
    }
}

impl<T> PickStep<T> {
    /// The view handed to the UI for the given entries.
    pub fn prompt_for(&self, entries: &[PickEntry<T>], value: Option<&str>) -> PickPrompt {
        PickPrompt {
            title: self.title.clone(),
            placeholder: self.placeholder.clone(),
            items: entries.iter().map(PickEntry::to_prompt_item).collect(),
            multi_select: self.multi_select,
            buttons: self
                .buttons
                .iter()
                .map(|b| PromptButton {
                    kind: b.kind,
                    tooltip: b.tooltip.clone(),
                })
                .collect(),
            can_go_back: !self.disallow_back,
            accepts_text: self.accepts_text,
            filterable: self.filter.is_some(),
            value: value.map(String::from),
            confirm: self.confirm,
        }
    }

    /// The view handed to the UI for the step's own entries.
    pub fn prompt(&self) -> PickPrompt {
        self.prompt_for(&self.entries, self.value.as_deref())
    }

    /// Selectable payload items.
    pub fn items(&self) -> impl Iterator<Item = &PickItem<T>> {
        self.entries.iter().filter_map(|e| match e {
            PickEntry::Item(item) => Some(item),
            _ => None,
        })
    }
}

/// Build a pick step.
///
/// A step with no entries must supply `empty_placeholder`; otherwise there is
/// nothing the user could do with it and the caller has a bug.
pub fn create_pick_step<T>(config: PickStepConfig<T>) -> PickStep<T> {
    let mut placeholder = config.placeholder;
    let mut entries = config.items;

    if entries.is_empty() {
        match config.empty_placeholder {
            Some(empty) => {
                placeholder = Some(empty);
                entries.push(PickEntry::Directive(DirectiveItem::new(Directive::Back).picked()));
            }
            None => invariant_violation(&format!(
                "pick step '{}' has no items and no empty placeholder",
                config.title
            )),
        }
    }

    PickStep {
        title: config.title,
        placeholder,
        entries,
        multi_select: config.multi_select,
        buttons: config.buttons,
        filter: config.filter,
        accepts_text: config.accepts_text,
        value: config.value,
        disallow_back: config.disallow_back,
        confirm: false,
    }
}

/// Options for [`create_confirm_step`].
#[derive(Debug, Default)]
pub struct ConfirmOptions {
    pub placeholder: Option<String>,
    pub buttons: Vec<StepButton>,
    pub disallow_back: bool,
}

/// Build a confirm step from mutually exclusive choices.
///
/// The first choice is the default action. `cancel`, when given, replaces the
/// plain cancel entry with one that explains why nothing can be done; with no
/// choices that makes the step cancel-only.
pub fn create_confirm_step<T>(
    title: impl Into<String>,
    choices: Vec<PickEntry<T>>,
    cancel: Option<DirectiveItem>,
    options: ConfirmOptions,
) -> PickStep<T> {
    let title = title.into();
    let placeholder = options
        .placeholder
        .unwrap_or_else(|| format!("Confirm {}", title));

    let mut entries = choices;
    entries.push(PickEntry::Directive(
        cancel.unwrap_or_else(|| DirectiveItem::new(Directive::Cancel)),
    ));

    let mut step = create_pick_step(PickStepConfig {
        title,
        placeholder: Some(placeholder),
        items: entries,
        buttons: options.buttons,
        disallow_back: options.disallow_back,
        ..Default::default()
    });
    step.confirm = true;
    step
}

/// A choice whose payload is a flag set, pre-selected when it matches `current`.
pub fn flags_item<F: PartialEq>(
    current: &F,
    flags: F,
    label: impl Into<String>,
    description: Option<String>,
    detail: Option<String>,
) -> PickEntry<F> {
    let picked = *current == flags;
    PickEntry::Item(PickItem {
        label: label.into(),
        description,
        detail,
        picked,
        item: flags,
    })
}
