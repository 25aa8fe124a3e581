//! Interactive terminal UI.

use console::Term;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::prompts::{folder_on_term, input_on_term, pick_on_term};
use super::{
    should_use_colors, FolderRequest, GitstepTheme, InputPrompt, InputResponse,
    NonInteractiveUI, OpenLocation, OutputMode, PickPrompt, PickResponse, ProgressSpinner,
    SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: GitstepTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            GitstepTheme::new()
        } else {
            GitstepTheme::plain()
        };

        Self {
            term: Term::stderr(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn pick(&mut self, prompt: &PickPrompt) -> Result<PickResponse> {
        pick_on_term(prompt, &self.term, &self.theme)
    }

    fn input(&mut self, prompt: &InputPrompt) -> Result<InputResponse> {
        input_on_term(prompt, &self.term, &self.theme)
    }

    fn choose_folder(&mut self, request: &FolderRequest) -> Result<Option<PathBuf>> {
        folder_on_term(request, &self.term)
    }

    fn open_folder(&mut self, path: &Path, location: OpenLocation) -> Result<()> {
        // A terminal cannot open windows; point the user at the folder.
        tracing::debug!("Open {} ({:?})", path.display(), location);
        if self.mode.shows_status() {
            writeln!(
                self.term,
                "{} {}",
                self.theme.highlight.apply_to(location.label()),
                self.theme.dim.apply_to(format!("cd {}", path.display()))
            )
            .ok();
        }
        Ok(())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Whether a CI service is running us; the wizard never prompts there.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS", "JENKINS_URL"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stderr().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}
