//! Command-line interface for gitstep.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`resolve`] - Mapping arguments onto a wizard's initial state
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;
pub mod resolve;

pub use args::{Cli, Commands, CompletionsArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
pub use resolve::ArgsResolver;
