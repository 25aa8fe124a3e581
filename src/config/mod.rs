//! Configuration loading for gitstep.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use gitstep::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".gitstep");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "skipConfirmations: [\"pull:menu\"]").unwrap();
//!
//! let config = load_config(Some(temp.path()), None).unwrap();
//! assert_eq!(config.skip_confirmations, vec!["pull:menu".to_string()]);
//! ```
//!
//! # Configuration File Locations
//!
//! gitstep discovers and merges configuration in this order:
//! 1. User global config (`~/.gitstep/config.yml`)
//! 2. Project config (`.gitstep/config.yml`)
//! 3. A file passed with `--config`

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{find_project_root, load_config, load_config_value, parse_config, ConfigPaths};
pub use merger::{deep_merge, merge_configs};
pub use schema::{CommitSettings, GitSettings, OpenAfterCreate, WizardConfig, WorktreeSettings};
