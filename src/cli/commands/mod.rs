//! CLI command implementations.
//!
//! Every git subcommand runs through [`wizard::WizardCommand`]; only
//! `completions` bypasses the wizard.

pub mod completions;
pub mod dispatcher;
pub mod wizard;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
