//! The step engine.
//!
//! A command is a [`QuickCommand`]: it owns a [`StepState`], asks the UI one
//! step at a time, and returns a [`StepResult`] once its loop exits. The
//! [`dispatch`] module maps a [`CommandArgs`](dispatch::CommandArgs) value
//! onto the right command and runs the top-level palette loop.

pub mod dispatch;
pub mod state;

pub use dispatch::{get_steps, CommandArgs, CommandKind, PickedVia, Wizard, WizardOutcome};
pub use state::{Answered, CounterSeed, Progress, SkipTracker, StepState};

use std::rc::Rc;

use crate::config::WizardConfig;
use crate::error::Result;
use crate::git::GitProvider;
use crate::steps::StepResult;
use crate::ui::UserInterface;

/// Shared collaborators handed to every command.
pub struct Services {
    pub git: Rc<dyn GitProvider>,
    pub config: WizardConfig,
}

impl Services {
    pub fn new(git: Rc<dyn GitProvider>, config: WizardConfig) -> Rc<Self> {
        Rc::new(Self { git, config })
    }
}

/// A multi-step git command.
pub trait QuickCommand {
    /// Identifier used in skip-confirmation keys, e.g. `branch`.
    fn key(&self) -> &'static str;

    /// Label shown in the palette.
    fn label(&self) -> &'static str;

    /// Title of the current flow; may include the chosen subcommand.
    fn title(&self) -> String;

    fn description(&self) -> &'static str;

    fn services(&self) -> &Services;

    fn picked_via(&self) -> PickedVia;

    /// Whether configuration may suppress the confirm step at all.
    fn can_skip_confirm(&self) -> bool {
        true
    }

    /// `<command>[-<subcommand>]:<menu|command>`
    fn skip_confirm_key(&self) -> String {
        format!("{}:{}", self.key(), self.picked_via().as_str())
    }

    /// Whether a confirm step must be shown.
    ///
    /// Commands that cannot skip confirmation always confirm. Otherwise an
    /// explicit request wins, and without one the configured skip list
    /// decides.
    fn confirm(&self, requested: Option<bool>) -> bool {
        if !self.can_skip_confirm() {
            return true;
        }
        requested.unwrap_or_else(|| {
            let key = self.skip_confirm_key();
            !self
                .services()
                .config
                .skip_confirmations
                .iter()
                .any(|k| *k == key)
        })
    }

    /// Drive the command's steps to completion.
    fn steps(&mut self, ui: &mut dyn UserInterface) -> Result<StepResult<()>>;
}

/// Report a programming error in step construction and abort.
pub fn invariant_violation(message: &str) -> ! {
    tracing::error!("Invariant violated: {}", message);
    panic!("invariant violated: {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockGit;

    struct Stub {
        services: Rc<Services>,
        skippable: bool,
    }

    impl QuickCommand for Stub {
        fn key(&self) -> &'static str {
            "stub"
        }
        fn label(&self) -> &'static str {
            "stub"
        }
        fn title(&self) -> String {
            "Stub".into()
        }
        fn description(&self) -> &'static str {
            "test command"
        }
        fn services(&self) -> &Services {
            &self.services
        }
        fn picked_via(&self) -> PickedVia {
            PickedVia::Menu
        }
        fn can_skip_confirm(&self) -> bool {
            self.skippable
        }
        fn steps(&mut self, _ui: &mut dyn UserInterface) -> Result<StepResult<()>> {
            Ok(StepResult::Value(()))
        }
    }

    fn stub(skip: &[&str], skippable: bool) -> Stub {
        let config = WizardConfig {
            skip_confirmations: skip.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        Stub {
            services: Services::new(Rc::new(MockGit::new()), config),
            skippable,
        }
    }

    #[test]
    fn confirms_by_default() {
        assert!(stub(&[], true).confirm(None));
    }

    #[test]
    fn skip_list_suppresses_confirmation() {
        assert!(!stub(&["stub:menu"], true).confirm(None));
        assert!(stub(&["stub:command"], true).confirm(None));
    }

    #[test]
    fn explicit_request_wins() {
        assert!(stub(&["stub:menu"], true).confirm(Some(true)));
        assert!(!stub(&[], true).confirm(Some(false)));
    }

    #[test]
    fn unskippable_commands_always_confirm() {
        assert!(stub(&["stub:menu"], false).confirm(Some(false)));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn invariant_violation_panics() {
        invariant_violation("broken");
    }
}
