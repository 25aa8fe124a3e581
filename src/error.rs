//! Error types for gitstep operations.
//!
//! This module defines [`GitstepError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Navigation (back, cancel) is never an error; it travels as
//!   [`StepResult::Break`](crate::steps::StepResult) or a directive
//! - Use `GitstepError` for failures that need distinct handling
//! - Use `anyhow::Error` (via `GitstepError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

use crate::git::GitError;

/// Core error type for gitstep operations.
#[derive(Debug, Error)]
pub enum GitstepError {
    /// A git query or operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A prompt needed an answer but no user is attached.
    #[error("Input required but running non-interactively: {prompt}")]
    NonInteractive { prompt: String },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Command name not recognized by the dispatcher.
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    /// A reference given on the command line does not resolve.
    #[error("Unknown branch, tag or revision: {name}")]
    InvalidReference { name: String },

    /// A worktree given on the command line is not one of the repository's.
    #[error("Not a worktree of the repository: {path}")]
    UnknownWorktree { path: PathBuf },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for gitstep operations.
pub type Result<T> = std::result::Result<T, GitstepError>;
