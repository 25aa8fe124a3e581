//! Non-interactive UI for scripts and pipes.

use std::path::{Path, PathBuf};

use crate::error::{GitstepError, Result};
use crate::steps::Directive;

use super::{
    FolderRequest, InputPrompt, InputResponse, OpenLocation, OutputMode, PickPrompt,
    PickResponse, ProgressSpinner, PromptItemKind, SpinnerHandle, UserInterface,
};

/// UI implementation for non-interactive mode.
///
/// Every prompt is answered with its default: the pre-selected rows, or the
/// first choice, or the prefilled value. A prompt with no usable default
/// fails with [`GitstepError::NonInteractive`], so a script learns which
/// argument it has to supply.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

fn required(title: &str) -> GitstepError {
    GitstepError::NonInteractive {
        prompt: title.to_string(),
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn pick(&mut self, prompt: &PickPrompt) -> Result<PickResponse> {
        tracing::debug!("Answering '{}' with its default", prompt.title);

        let picked = prompt.picked_indices();
        if !picked.is_empty() {
            return Ok(PickResponse::Selected(picked));
        }
        if prompt.multi_select {
            return Err(required(&prompt.title));
        }

        let first_choice = prompt
            .choice_indices()
            .find(|&i| prompt.items[i].kind == PromptItemKind::Choice);
        match first_choice {
            Some(index) => Ok(PickResponse::Selected(vec![index])),
            // Only directives left, e.g. a confirm step that explains why
            // nothing can be done.
            None if prompt.choice_indices().next().is_some() => {
                Ok(PickResponse::Directive(Directive::Cancel))
            }
            None => Err(required(&prompt.title)),
        }
    }

    fn input(&mut self, prompt: &InputPrompt) -> Result<InputResponse> {
        if prompt.validation_message.is_some() {
            return Err(required(&prompt.title));
        }
        match prompt.value.as_deref() {
            Some(value) if !value.is_empty() => Ok(InputResponse::Value(value.to_string())),
            _ => Err(required(&prompt.title)),
        }
    }

    fn choose_folder(&mut self, request: &FolderRequest) -> Result<Option<PathBuf>> {
        match &request.default_path {
            Some(path) => Ok(Some(path.clone())),
            None => Err(required(&request.title)),
        }
    }

    fn open_folder(&mut self, path: &Path, location: OpenLocation) -> Result<()> {
        tracing::debug!("Open {} ({:?})", path.display(), location);
        if self.mode.shows_status() {
            println!("{}", path.display());
        }
        Ok(())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_messages() {
            println!("{}", message);
        }
        Box::new(ProgressSpinner::hidden())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
