//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. Answers are queued up front and
//! consumed in order, one per prompt shown.
//!
//! # Example
//!
//! ```
//! use gitstep::ui::{MockAnswer, MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.answer(MockAnswer::pick("main"));
//!
//! // Use ui in code under test...
//! ui.success("Switched to main");
//!
//! // Assert on captured interactions
//! assert!(ui.has_success("Switched"));
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::error::Result;
use crate::steps::Directive;

use super::{
    FolderRequest, InputPrompt, InputResponse, OpenLocation, OutputMode, PickPrompt,
    PickResponse, SpinnerHandle, UserInterface,
};

/// A scripted answer to the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAnswer {
    /// Choose the row with this label. Directive rows match too.
    Pick(String),
    /// Choose every row with one of these labels.
    PickAll(Vec<String>),
    /// Choose the row at this index.
    PickIndex(usize),
    /// Accept the pre-selected rows, or the first row, or the input's value.
    Accept,
    /// Type text; answers an input, or submits text to a pick.
    Text(String),
    /// Change a pick's filter text.
    Filter(String),
    /// Click the button with this tooltip.
    Button(String),
    Back,
    Cancel,
    Retry,
    /// Answer a folder chooser.
    Folder(Option<PathBuf>),
}

impl MockAnswer {
    pub fn pick(label: impl Into<String>) -> Self {
        Self::Pick(label.into())
    }

    pub fn pick_all<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PickAll(labels.into_iter().map(Into::into).collect())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn button(tooltip: impl Into<String>) -> Self {
        Self::Button(tooltip.into())
    }

    pub fn folder(path: impl Into<PathBuf>) -> Self {
        Self::Folder(Some(path.into()))
    }
}

/// A prompt captured by [`MockUI`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShownPrompt {
    Pick(PickPrompt),
    Input(InputPrompt),
    Folder(FolderRequest),
}

impl ShownPrompt {
    pub fn title(&self) -> &str {
        match self {
            Self::Pick(p) => &p.title,
            Self::Input(p) => &p.title,
            Self::Folder(r) => &r.title,
        }
    }
}

/// Mock UI implementation for testing.
///
/// When the answer queue runs dry every further prompt is answered with a
/// cancel directive, so a test that under-scripts a flow terminates instead
/// of hanging.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    answers: VecDeque<MockAnswer>,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    prompts_shown: Vec<ShownPrompt>,
    opened: Vec<(PathBuf, OpenLocation)>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            interactive: true,
            ..Default::default()
        }
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Self::new()
        }
    }

    /// Queue an answer for the next prompt.
    pub fn answer(&mut self, answer: MockAnswer) {
        self.answers.push_back(answer);
    }

    /// Queue several answers in order.
    pub fn answers(&mut self, answers: impl IntoIterator<Item = MockAnswer>) {
        self.answers.extend(answers);
    }

    /// Answers not consumed yet.
    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Every prompt shown, in order.
    pub fn prompts_shown(&self) -> &[ShownPrompt] {
        &self.prompts_shown
    }

    /// Titles of every prompt shown, in order.
    pub fn titles(&self) -> Vec<&str> {
        self.prompts_shown.iter().map(ShownPrompt::title).collect()
    }

    /// Every pick prompt shown, in order.
    pub fn picks(&self) -> Vec<&PickPrompt> {
        self.prompts_shown
            .iter()
            .filter_map(|p| match p {
                ShownPrompt::Pick(pick) => Some(pick),
                _ => None,
            })
            .collect()
    }

    pub fn last_pick(&self) -> Option<&PickPrompt> {
        self.picks().pop()
    }

    pub fn last_input(&self) -> Option<&InputPrompt> {
        self.prompts_shown.iter().rev().find_map(|p| match p {
            ShownPrompt::Input(input) => Some(input),
            _ => None,
        })
    }

    /// Folders opened, with where they were opened.
    pub fn opened_folders(&self) -> &[(PathBuf, OpenLocation)] {
        &self.opened
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }
}

fn find_label(prompt: &PickPrompt, label: &str) -> Result<usize> {
    prompt
        .choice_indices()
        .find(|&i| prompt.items[i].label == label)
        .ok_or_else(|| {
            let labels: Vec<&str> = prompt
                .choice_indices()
                .map(|i| prompt.items[i].label.as_str())
                .collect();
            anyhow!(
                "MockUI: no item '{}' in '{}' (items: {:?})",
                label,
                prompt.title,
                labels
            )
            .into()
        })
}

fn find_button(buttons: &[super::PromptButton], title: &str, tooltip: &str) -> Result<usize> {
    buttons
        .iter()
        .position(|b| b.tooltip == tooltip)
        .ok_or_else(|| anyhow!("MockUI: no button '{}' in '{}'", tooltip, title).into())
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn pick(&mut self, prompt: &PickPrompt) -> Result<PickResponse> {
        self.prompts_shown.push(ShownPrompt::Pick(prompt.clone()));

        let Some(answer) = self.answers.pop_front() else {
            return Ok(PickResponse::Directive(Directive::Cancel));
        };

        Ok(match answer {
            MockAnswer::Pick(label) => PickResponse::Selected(vec![find_label(prompt, &label)?]),
            MockAnswer::PickAll(labels) => PickResponse::Selected(
                labels
                    .iter()
                    .map(|l| find_label(prompt, l))
                    .collect::<Result<Vec<_>>>()?,
            ),
            MockAnswer::PickIndex(index) => PickResponse::Selected(vec![index]),
            MockAnswer::Accept => {
                let picked = prompt.picked_indices();
                if picked.is_empty() && !prompt.multi_select {
                    PickResponse::Selected(prompt.choice_indices().take(1).collect())
                } else {
                    PickResponse::Selected(picked)
                }
            }
            MockAnswer::Text(text) => PickResponse::Text(text),
            MockAnswer::Filter(text) => PickResponse::Filter(text),
            MockAnswer::Button(tooltip) => {
                PickResponse::Button(find_button(&prompt.buttons, &prompt.title, &tooltip)?)
            }
            MockAnswer::Back => PickResponse::Directive(Directive::Back),
            MockAnswer::Cancel => PickResponse::Directive(Directive::Cancel),
            MockAnswer::Retry => PickResponse::Directive(Directive::Retry),
            MockAnswer::Folder(_) => {
                return Err(anyhow!("MockUI: folder answer given to pick '{}'", prompt.title).into())
            }
        })
    }

    fn input(&mut self, prompt: &InputPrompt) -> Result<InputResponse> {
        self.prompts_shown.push(ShownPrompt::Input(prompt.clone()));

        let Some(answer) = self.answers.pop_front() else {
            return Ok(InputResponse::Directive(Directive::Cancel));
        };

        Ok(match answer {
            MockAnswer::Text(text) => InputResponse::Value(text),
            MockAnswer::Accept => InputResponse::Value(prompt.value.clone().unwrap_or_default()),
            MockAnswer::Button(tooltip) => {
                InputResponse::Button(find_button(&prompt.buttons, &prompt.title, &tooltip)?)
            }
            MockAnswer::Back => InputResponse::Directive(Directive::Back),
            MockAnswer::Cancel => InputResponse::Directive(Directive::Cancel),
            MockAnswer::Retry => InputResponse::Directive(Directive::Retry),
            other => {
                return Err(
                    anyhow!("MockUI: {:?} cannot answer input '{}'", other, prompt.title).into(),
                )
            }
        })
    }

    fn choose_folder(&mut self, request: &FolderRequest) -> Result<Option<PathBuf>> {
        self.prompts_shown
            .push(ShownPrompt::Folder(request.clone()));

        match self.answers.pop_front() {
            Some(MockAnswer::Folder(path)) => Ok(path),
            Some(MockAnswer::Accept) => Ok(request.default_path.clone()),
            Some(MockAnswer::Back) | Some(MockAnswer::Cancel) | None => Ok(None),
            Some(other) => Err(anyhow!(
                "MockUI: {:?} cannot answer folder request '{}'",
                other,
                request.title
            )
            .into()),
        }
    }

    fn open_folder(&mut self, path: &Path, location: OpenLocation) -> Result<()> {
        self.opened.push((path.to_path_buf(), location));
        Ok(())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that captures finish messages.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finish_message: Option<String>,
    status: Option<SpinnerStatus>,
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinnerStatus {
    /// Finished successfully.
    Success,
    /// Finished with error.
    Error,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages set during spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get the final finish message.
    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    /// Get the final status.
    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Error);
    }
}
