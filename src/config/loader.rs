//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! various locations in the correct priority order.

use crate::config::merger::merge_configs;
use crate::config::schema::WizardConfig;
use crate::error::{GitstepError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`~/.gitstep/config.yml`)
/// 2. Project config (`.gitstep/config.yml` in the repository root)
/// 3. Explicit `--config` file
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config: ~/.gitstep/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .gitstep/config.yml
    pub project: Option<PathBuf>,

    /// File named on the command line.
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: Option<&Path>, explicit: Option<&Path>) -> Self {
        Self {
            user_global: dirs::home_dir()
                .map(|home| home.join(".gitstep").join("config.yml"))
                .filter(|p| p.exists()),
            project: project_root
                .map(|root| root.join(".gitstep").join("config.yml"))
                .filter(|p| p.exists()),
            explicit: explicit.map(Path::to_path_buf),
        }
    }

    /// Returns all config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.explicit]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Find the repository root by walking up from `start`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Parse YAML content into WizardConfig.
pub fn parse_config(content: &str, source_path: &Path) -> Result<WizardConfig> {
    if content.trim().is_empty() {
        return Ok(WizardConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| GitstepError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as raw YAML Value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }

    serde_yaml::from_str(&content).map_err(|e| GitstepError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge every config file that applies.
///
/// With no config files at all the defaults are returned.
pub fn load_config(project_root: Option<&Path>, explicit: Option<&Path>) -> Result<WizardConfig> {
    let paths = ConfigPaths::discover(project_root, explicit);

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config from {}", path.display());
        configs.push(load_config_value(path)?);
    }

    if configs.is_empty() {
        return Ok(WizardConfig::default());
    }

    let merged = merge_configs(&configs);
    let source = paths
        .all_existing()
        .last()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    serde_yaml::from_value(merged).map_err(|e| GitstepError::ConfigParseError {
        path: source,
        message: format!("Failed to parse merged config: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAfterCreate;
    use tempfile::TempDir;

    fn project_with(content: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".gitstep");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), content).unwrap();
        temp
    }

    #[test]
    fn discover_finds_project_config() {
        let temp = project_with("");
        let paths = ConfigPaths::discover(Some(temp.path()), None);
        assert!(paths.project.is_some());
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover(Some(temp.path()), None);
        assert!(paths.project.is_none());
        assert!(paths.explicit.is_none());
    }

    #[test]
    fn find_project_root_finds_git_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("src").join("bin");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn explicit_file_overrides_project() {
        let temp = project_with("commits:\n  pageSize: 10\nskipConfirmations:\n  - push:menu\n");
        let explicit = temp.path().join("override.yml");
        fs::write(&explicit, "commits:\n  pageSize: 40\n").unwrap();

        let config = load_config(Some(temp.path()), Some(&explicit)).unwrap();
        assert_eq!(config.commits.page_size, 40);
        assert_eq!(config.skip_confirmations, vec!["push:menu".to_string()]);
    }

    #[test]
    fn project_config_is_loaded() {
        let temp = project_with("worktrees:\n  openAfterCreate: never\n");
        let config = load_config(Some(temp.path()), None).unwrap();
        assert_eq!(config.worktrees.open_after_create, OpenAfterCreate::Never);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = project_with("commits: [unclosed");
        let err = load_config(Some(temp.path()), None).unwrap_err();
        match err {
            GitstepError::ConfigParseError { path, .. } => {
                assert!(path.ends_with(".gitstep/config.yml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        assert!(matches!(
            load_config(None, Some(&missing)),
            Err(GitstepError::Io(_))
        ));
    }

    #[test]
    fn parse_config_accepts_empty_content() {
        let config = parse_config("", Path::new("x.yml")).unwrap();
        assert_eq!(config, WizardConfig::default());
    }
}
