//! Runs a git command's wizard against the repositories on the command line.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cli::args::Cli;
use crate::cli::resolve::ArgsResolver;
use crate::config::{find_project_root, load_config, WizardConfig};
use crate::engine::{CommandArgs, Services, Wizard, WizardOutcome};
use crate::error::Result;
use crate::git::{GitCli, GitProvider};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Exit code for a wizard the user left before finishing.
pub const DISMISSED_EXIT_CODE: i32 = 130;

pub struct WizardCommand<'a> {
    cwd: &'a Path,
    cli: &'a Cli,
}

impl<'a> WizardCommand<'a> {
    pub fn new(cwd: &'a Path, cli: &'a Cli) -> Self {
        Self { cwd, cli }
    }

    fn repo_paths(&self) -> Vec<PathBuf> {
        if self.cli.repos.is_empty() {
            vec![self.cwd.to_path_buf()]
        } else {
            self.cli.repos.clone()
        }
    }

    fn load_config(&self) -> Result<WizardConfig> {
        let root = find_project_root(self.cwd);
        load_config(root.as_deref(), self.cli.config.as_deref())
    }

    /// Resolve the command-line arguments against `git`.
    pub fn initial_args(&self, git: &dyn GitProvider) -> Result<Option<CommandArgs>> {
        ArgsResolver::new(git, self.cwd, self.cli.no_confirm).resolve(self.cli.command.as_ref())
    }

    /// Run the wizard with an already-built set of services.
    pub fn run_with(
        &self,
        services: Rc<Services>,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let initial = self.initial_args(services.git.as_ref())?;
        match Wizard::new(services).run(ui, initial)? {
            WizardOutcome::Completed => Ok(CommandResult::success()),
            WizardOutcome::Dismissed => {
                tracing::debug!("Wizard dismissed");
                Ok(CommandResult::failure(DISMISSED_EXIT_CODE))
            }
        }
    }
}

impl Command for WizardCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.load_config()?;
        let git = GitCli::discover(&self.repo_paths(), self.cwd)?.with_force_mode(
            config.git.use_force_push_with_lease,
            config.git.use_force_push_if_includes,
        );
        self.run_with(Services::new(Rc::new(git), config), ui)
    }
}
