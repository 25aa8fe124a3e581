//! References: branches, tags and revisions handed between steps.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::models::{shorten_sha, Upstream};

/// A branch reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchReference {
    pub repo_path: PathBuf,
    pub name: String,
    pub remote: bool,
    pub upstream: Option<Upstream>,
    pub sha: Option<String>,
}

/// A tag reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReference {
    pub repo_path: PathBuf,
    pub name: String,
    pub sha: Option<String>,
}

/// A commit reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionReference {
    pub repo_path: PathBuf,
    pub sha: String,
    pub message: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Anything a command can be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitReference {
    Branch(BranchReference),
    Tag(TagReference),
    Revision(RevisionReference),
}

impl GitReference {
    /// A local branch reference.
    pub fn branch(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::Branch(BranchReference {
            repo_path: repo_path.into(),
            name: name.into(),
            remote: false,
            upstream: None,
            sha: None,
        })
    }

    /// A remote-tracking branch reference.
    pub fn remote_branch(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::Branch(BranchReference {
            repo_path: repo_path.into(),
            name: name.into(),
            remote: true,
            upstream: None,
            sha: None,
        })
    }

    pub fn tag(repo_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::Tag(TagReference {
            repo_path: repo_path.into(),
            name: name.into(),
            sha: None,
        })
    }

    pub fn revision(repo_path: impl Into<PathBuf>, sha: impl Into<String>) -> Self {
        Self::Revision(RevisionReference {
            repo_path: repo_path.into(),
            sha: sha.into(),
            message: None,
            date: None,
        })
    }

    /// Name usable on a git command line.
    pub fn ref_name(&self) -> &str {
        match self {
            Self::Branch(b) => &b.name,
            Self::Tag(t) => &t.name,
            Self::Revision(r) => &r.sha,
        }
    }

    /// Human readable name; revisions are shortened.
    pub fn name(&self) -> &str {
        match self {
            Self::Revision(r) => shorten_sha(&r.sha),
            _ => self.ref_name(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        match self {
            Self::Branch(b) => &b.repo_path,
            Self::Tag(t) => &t.repo_path,
            Self::Revision(r) => &r.repo_path,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    pub fn is_remote_branch(&self) -> bool {
        matches!(self, Self::Branch(b) if b.remote)
    }

    pub fn is_local_branch(&self) -> bool {
        matches!(self, Self::Branch(b) if !b.remote)
    }

    pub fn is_revision(&self) -> bool {
        matches!(self, Self::Revision(_))
    }

    pub fn as_branch(&self) -> Option<&BranchReference> {
        match self {
            Self::Branch(b) => Some(b),
            _ => None,
        }
    }

    /// Commit date, known only for revisions loaded from a log.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Revision(r) => r.date,
            _ => None,
        }
    }

    /// Kind word used in titles and details.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Branch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::Revision(_) => "commit",
        }
    }

    /// Label with its kind, e.g. `branch main`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind_label(), self.name())
    }
}

impl fmt::Display for GitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a reference without its remote prefix.
pub fn name_without_remote(reference: &GitReference) -> String {
    match reference {
        GitReference::Branch(b) if b.remote => b
            .name
            .split_once('/')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_else(|| b.name.clone()),
        _ => reference.ref_name().to_string(),
    }
}

/// Label for one or more references: a single label, or a count.
pub fn references_label(references: &[GitReference]) -> String {
    match references {
        [] => String::new(),
        [single] => single.label(),
        [first, ..] => {
            let kind = first.kind_label();
            if references.iter().all(|r| r.kind_label() == kind) {
                let noun = match kind {
                    "branch" => "branches".to_string(),
                    other => format!("{}s", other),
                };
                format!("{} {}", references.len(), noun)
            } else {
                format!("{} references", references.len())
            }
        }
    }
}

/// `from..to` range notation.
pub fn revision_range(from: &str, to: &str) -> String {
    format!("{}..{}", from, to)
}
