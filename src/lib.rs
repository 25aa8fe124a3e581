//! gitstep - Step-by-step interactive wizards for everyday git commands.
//!
//! Each git command (branch, cherry-pick, pull, push, switch, worktree) is a
//! small state machine that asks one question at a time, lets the user step
//! back, and confirms before touching the repository.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`commands`] - The git command wizards
//! - [`config`] - Configuration loading and merging
//! - [`engine`] - Step state, counters, and command dispatch
//! - [`error`] - Error types and result aliases
//! - [`git`] - Git queries and operations behind a provider trait
//! - [`steps`] - Pick, input, and confirm step builders
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use gitstep::config::parse_config;
//! use std::path::Path;
//!
//! let config = parse_config(
//!     "skipConfirmations: [\"push:command\"]",
//!     Path::new(".gitstep/config.yml"),
//! )
//! .unwrap();
//! assert_eq!(config.skip_confirmations, vec!["push:command".to_string()]);
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod steps;
pub mod ui;

pub use error::{GitstepError, Result};
