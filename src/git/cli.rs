//! [`GitProvider`] backed by the `git` executable.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{LazyLock, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;

use super::error::{
    ApplyPatchErrorReason, GitError, GitResult, WorktreeCreateErrorReason,
    WorktreeDeleteErrorReason,
};
use super::models::{
    Branch, Commit, Remote, RepoStatus, Repository, Tag, TrackingState, Upstream, Worktree,
};
use super::provider::{
    CherryPickOptions, DeleteBranchOptions, GitProvider, PullOptions, PushOptions,
    SwitchOptions, WorktreeCreateOptions, WorktreeDeleteOptions,
};
use super::reference::{name_without_remote, GitReference};

const BRANCH_FORMAT: &str = "%(refname)%00%(objectname)%00%(upstream:short)%00%(upstream:track)%00%(HEAD)%00%(committerdate:iso-strict)%00%(worktreepath)";
const LOG_FORMAT: &str = "%H%x00%s%x00%an%x00%cI";

/// Runs `git -C <repo> ...` for every query and operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    repos: Vec<Repository>,
    cwd: PathBuf,
    force_with_lease: bool,
    force_if_includes: bool,
}

impl GitCli {
    /// Resolve each path to the top level of its repository.
    pub fn discover(paths: &[PathBuf], cwd: &Path) -> GitResult<Self> {
        let mut repos: Vec<Repository> = Vec::new();
        for path in paths {
            let output = exec(path, &["rev-parse", "--show-toplevel"])?;
            if !output.status.success() {
                return Err(GitError::NotARepository { path: path.clone() });
            }
            let repo = Repository::new(stdout_of(&output).trim());
            if !repos.contains(&repo) {
                repos.push(repo);
            }
        }
        tracing::debug!("Discovered {} repositories", repos.len());

        Ok(Self {
            repos,
            cwd: cwd.to_path_buf(),
            force_with_lease: true,
            force_if_includes: true,
        })
    }

    /// Choose how `--force` pushes are spelled.
    pub fn with_force_mode(mut self, with_lease: bool, if_includes: bool) -> Self {
        self.force_with_lease = with_lease;
        self.force_if_includes = if_includes;
        self
    }

    fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
        let output = exec(dir, args)?;
        if output.status.success() {
            Ok(stdout_of(&output))
        } else {
            Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: stderr_of(&output),
            })
        }
    }

    /// Run a query whose failure just means "nothing there".
    fn run_quiet(&self, dir: &Path, args: &[&str]) -> GitResult<Option<String>> {
        let output = exec(dir, args)?;
        Ok(output.status.success().then(|| stdout_of(&output)))
    }

    fn force_args(&self, repo: &Repository) -> Vec<&'static str> {
        if !self.force_with_lease {
            return vec!["--force"];
        }
        let mut args = vec!["--force-with-lease"];
        if self.force_if_includes && self.supports_force_if_includes(repo) {
            args.push("--force-if-includes");
        }
        args
    }

    fn push_one(&self, repo: &Repository, options: &PushOptions) -> GitResult<()> {
        let mut args: Vec<String> = vec!["push".into()];
        if options.force {
            args.extend(self.force_args(repo).into_iter().map(String::from));
        }

        if let Some(remote) = &options.publish {
            let branch = match &options.reference {
                Some(reference) => reference.ref_name().to_string(),
                None => self
                    .branch(repo, None)?
                    .map(|b| b.name)
                    .ok_or_else(|| GitError::CommandFailed {
                        command: "git push".into(),
                        message: "HEAD is detached; nothing to publish".into(),
                    })?,
            };
            args.extend(["--set-upstream".into(), remote.clone(), branch]);
        } else if let Some(reference) = &options.reference {
            match reference {
                GitReference::Branch(b) => {
                    if let Some(upstream) = &b.upstream {
                        args.push(upstream.remote_name().to_string());
                        args.push(format!("{}:{}", b.name, upstream.branch_name()));
                    }
                }
                other => {
                    let current = self.branch(repo, None)?;
                    if let Some(upstream) = current.and_then(|b| b.upstream) {
                        args.push(upstream.remote_name().to_string());
                        args.push(format!(
                            "{}:refs/heads/{}",
                            other.ref_name(),
                            upstream.branch_name()
                        ));
                    }
                }
            }
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&repo.path, &args).map(|_| ())
    }
}

impl GitProvider for GitCli {
    fn open_repositories(&self) -> Vec<Repository> {
        self.repos.clone()
    }

    fn common_repository(&self, repo: &Repository) -> GitResult<Option<Repository>> {
        let common = self.run(
            &repo.path,
            &["rev-parse", "--path-format=absolute", "--git-common-dir"],
        )?;
        let common = PathBuf::from(common.trim());
        let root = match common.file_name() {
            Some(name) if name == ".git" => common.parent().map(Path::to_path_buf),
            _ => None,
        };
        Ok(root
            .filter(|root| root != &repo.path)
            .map(Repository::new))
    }

    fn branch(&self, repo: &Repository, name: Option<&str>) -> GitResult<Option<Branch>> {
        let branches = self.branches(repo)?;
        Ok(match name {
            Some(name) => branches.into_iter().find(|b| b.name == name),
            None => branches.into_iter().find(|b| b.current),
        })
    }

    fn branches(&self, repo: &Repository) -> GitResult<Vec<Branch>> {
        let format = format!("--format={}", BRANCH_FORMAT);
        let output = self.run(
            &repo.path,
            &["for-each-ref", &format, "refs/heads", "refs/remotes"],
        )?;
        Ok(parse_branches(&output, &repo.path))
    }

    fn tags(&self, repo: &Repository) -> GitResult<Vec<Tag>> {
        let output = self.run(
            &repo.path,
            &[
                "for-each-ref",
                "--sort=-creatordate",
                "--format=%(refname:short)%00%(objectname)",
                "refs/tags",
            ],
        )?;
        Ok(output
            .lines()
            .filter_map(|line| {
                let (name, sha) = line.split_once('\0')?;
                Some(Tag {
                    repo_path: repo.path.clone(),
                    name: name.to_string(),
                    sha: Some(sha.to_string()),
                })
            })
            .collect())
    }

    fn remotes(&self, repo: &Repository) -> GitResult<Vec<Remote>> {
        let output = self.run(&repo.path, &["remote", "-v"])?;
        Ok(parse_remotes(&output))
    }

    fn status(&self, repo: &Repository) -> GitResult<Option<RepoStatus>> {
        let output = self.run_quiet(&repo.path, &["status", "--porcelain=v2", "--branch"])?;
        Ok(output.map(|o| parse_status(&o)))
    }

    fn last_fetched(&self, repo: &Repository) -> GitResult<Option<DateTime<Utc>>> {
        let Some(path) = self.run_quiet(&repo.path, &["rev-parse", "--git-path", "FETCH_HEAD"])?
        else {
            return Ok(None);
        };
        let path = repo.path.join(path.trim());
        match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => Ok(Some(DateTime::<Utc>::from(modified))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn log(&self, repo: &Repository, range: &str, limit: usize) -> GitResult<Vec<Commit>> {
        let format = format!("--format={}", LOG_FORMAT);
        let limit = format!("-n{}", limit);
        let output = self.run(&repo.path, &["log", &format, &limit, range, "--"])?;
        Ok(parse_log(&output, &repo.path))
    }

    fn commit_branches(&self, repo: &Repository, sha: &str) -> GitResult<Vec<String>> {
        let output = self.run(
            &repo.path,
            &["branch", "-a", "--contains", sha, "--format=%(refname:short)"],
        )?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.ends_with("/HEAD"))
            .map(String::from)
            .collect())
    }

    fn resolve_revision(&self, repo: &Repository, text: &str) -> GitResult<Option<Commit>> {
        let spec = format!("{}^{{commit}}", text.trim());
        let Some(sha) = self.run_quiet(&repo.path, &["rev-parse", "--verify", "--quiet", &spec])?
        else {
            return Ok(None);
        };
        Ok(self.log(repo, sha.trim(), 1)?.into_iter().next())
    }

    fn worktrees(&self, repo: &Repository) -> GitResult<Vec<Worktree>> {
        let output = self.run(&repo.path, &["worktree", "list", "--porcelain"])?;
        let mut worktrees = parse_worktrees(&output, &repo.path);
        let cwd = self.cwd.canonicalize().unwrap_or_else(|_| self.cwd.clone());
        for wt in &mut worktrees {
            let path = wt.path.canonicalize().unwrap_or_else(|_| wt.path.clone());
            wt.opened = cwd.starts_with(&path)
                && !worktrees_nested_deeper(&cwd, &path, &output);
        }
        Ok(worktrees)
    }

    fn has_changes(&self, path: &Path) -> GitResult<bool> {
        let output = self.run(path, &["status", "--porcelain"])?;
        Ok(!output.trim().is_empty())
    }

    fn diff(&self, path: &Path, staged: bool) -> GitResult<String> {
        let mut args = vec!["diff", "--binary"];
        if staged {
            args.push("--cached");
        }
        args.push("HEAD");
        self.run(path, &args)
    }

    fn validate_branch_name(&self, repo: &Repository, name: &str) -> GitResult<bool> {
        let output = exec(&repo.path, &["check-ref-format", "--branch", name])?;
        Ok(output.status.success())
    }

    fn supports_force_if_includes(&self, repo: &Repository) -> bool {
        static SUPPORTED: OnceLock<bool> = OnceLock::new();
        *SUPPORTED.get_or_init(|| {
            self.run(&repo.path, &["--version"])
                .ok()
                .and_then(|v| parse_version(&v))
                .is_some_and(|version| version >= (2, 30))
        })
    }

    fn fetch(&self, repo: &Repository) -> GitResult<()> {
        self.run(&repo.path, &["fetch"]).map(|_| ())
    }

    fn fetch_branch(
        &self,
        repo: &Repository,
        branch: &GitReference,
        pull: bool,
    ) -> GitResult<()> {
        let Some(b) = branch.as_branch() else {
            return self.fetch(repo);
        };
        if b.remote {
            let remote = b.name.split('/').next().unwrap_or(&b.name);
            let name = name_without_remote(branch);
            return self.run(&repo.path, &["fetch", remote, &name]).map(|_| ());
        }
        let Some(upstream) = &b.upstream else {
            return self.fetch(repo);
        };
        let refspec = if pull {
            format!("{}:{}", upstream.branch_name(), b.name)
        } else {
            upstream.branch_name().to_string()
        };
        self.run(&repo.path, &["fetch", upstream.remote_name(), &refspec])
            .map(|_| ())
    }

    fn push_all(&self, repos: &[Repository], options: &PushOptions) -> GitResult<()> {
        for repo in repos {
            self.push_one(repo, options)?;
        }
        Ok(())
    }

    fn pull_all(&self, repos: &[Repository], options: &PullOptions) -> GitResult<()> {
        for repo in repos {
            if options.rebase {
                self.run(&repo.path, &["pull", "--rebase"])?;
            } else {
                self.run(&repo.path, &["pull"])?;
            }
        }
        Ok(())
    }

    fn switch_to(
        &self,
        repos: &[Repository],
        reference: &GitReference,
        options: &SwitchOptions,
    ) -> GitResult<()> {
        for repo in repos {
            match &options.create_branch {
                Some(name) => {
                    self.run(&repo.path, &["checkout", "-b", name, reference.ref_name()])?;
                }
                None => {
                    self.run(&repo.path, &["checkout", reference.ref_name()])?;
                }
            }
        }
        Ok(())
    }

    fn merge_fast_forward(&self, repo: &Repository, reference: &GitReference) -> GitResult<()> {
        self.run(&repo.path, &["merge", "--ff-only", reference.ref_name()])
            .map(|_| ())
    }

    fn create_branch(
        &self,
        repo: &Repository,
        name: &str,
        start_point: &GitReference,
    ) -> GitResult<()> {
        self.run(&repo.path, &["branch", name, start_point.ref_name()])
            .map(|_| ())
    }

    fn rename_branch(&self, repo: &Repository, from: &str, to: &str) -> GitResult<()> {
        self.run(&repo.path, &["branch", "-m", from, to]).map(|_| ())
    }

    fn delete_branches(
        &self,
        repo: &Repository,
        references: &[GitReference],
        options: &DeleteBranchOptions,
    ) -> GitResult<()> {
        let mut local: Vec<&str> = Vec::new();
        let mut remote: Vec<(String, String)> = Vec::new();

        for reference in references {
            let Some(b) = reference.as_branch() else {
                continue;
            };
            if b.remote {
                let remote_name = b.name.split('/').next().unwrap_or(&b.name).to_string();
                remote.push((remote_name, name_without_remote(reference)));
                continue;
            }
            local.push(&b.name);
            if options.remote {
                if let Some(upstream) = b.upstream.as_ref().filter(|u| !u.missing) {
                    remote.push((
                        upstream.remote_name().to_string(),
                        upstream.branch_name().to_string(),
                    ));
                }
            }
        }

        if !local.is_empty() {
            let mut args = vec!["branch", if options.force { "-D" } else { "-d" }];
            args.extend(local);
            self.run(&repo.path, &args)?;
        }
        for (remote_name, branch) in remote {
            self.run(&repo.path, &["push", &remote_name, "--delete", &branch])?;
        }
        Ok(())
    }

    fn cherry_pick(
        &self,
        repo: &Repository,
        shas: &[String],
        options: &CherryPickOptions,
    ) -> GitResult<()> {
        let mut args = vec!["cherry-pick"];
        if options.edit {
            args.push("--edit");
        }
        if options.no_commit {
            args.push("--no-commit");
        }
        args.extend(shas.iter().map(String::as_str));
        self.run(&repo.path, &args).map(|_| ())
    }

    fn create_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeCreateOptions,
    ) -> GitResult<Worktree> {
        let path_arg = path.to_string_lossy();
        let mut args = vec!["worktree", "add"];
        if options.force {
            args.push("--force");
        }
        if let Some(name) = &options.create_branch {
            args.extend(["-b", name.as_str()]);
        }
        if options.detach {
            args.push("--detach");
        }
        args.push(&path_arg);
        if let Some(commitish) = &options.commitish {
            args.push(commitish);
        }

        let output = exec(&repo.path, &args)?;
        if !output.status.success() {
            let message = stderr_of(&output);
            return Err(GitError::WorktreeCreate {
                reason: classify_worktree_create(&message),
                message,
            });
        }

        let created = self
            .worktrees(repo)?
            .into_iter()
            .find(|wt| wt.path == path);
        Ok(created.unwrap_or_else(|| {
            let mut wt = Worktree::new(&repo.path, path);
            wt.branch = options
                .create_branch
                .clone()
                .or_else(|| options.commitish.clone());
            wt
        }))
    }

    fn delete_worktree(
        &self,
        repo: &Repository,
        path: &Path,
        options: &WorktreeDeleteOptions,
    ) -> GitResult<()> {
        let path_arg = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if options.force {
            args.push("--force");
        }
        args.push(&path_arg);

        let output = exec(&repo.path, &args)?;
        if output.status.success() {
            return Ok(());
        }
        let message = stderr_of(&output);
        Err(GitError::WorktreeDelete {
            reason: classify_worktree_delete(&message),
            message,
        })
    }

    fn apply_patch(&self, path: &Path, patch: &str) -> GitResult<()> {
        let args = ["apply", "--3way", "--whitespace=nowarn", "-"];
        let output = exec_with_input(path, &args, patch)?;
        if output.status.success() {
            return Ok(());
        }
        let message = stderr_of(&output);
        Err(GitError::ApplyPatch {
            reason: classify_apply_patch(&message),
            message,
        })
    }
}

fn exec(dir: &Path, args: &[&str]) -> GitResult<Output> {
    tracing::debug!("git -C {} {}", dir.display(), args.join(" "));
    Ok(Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .output()?)
}

/// Like [`exec`], feeding `input` to git on stdin.
fn exec_with_input(dir: &Path, args: &[&str], input: &str) -> GitResult<Output> {
    tracing::debug!(
        "git -C {} {} ({} bytes on stdin)",
        dir.display(),
        args.join(" "),
        input.len()
    );
    let mut child = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }
    Ok(child.wait_with_output()?)
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// A linked worktree nested inside `path` that also contains `cwd`.
fn worktrees_nested_deeper(cwd: &Path, path: &Path, listing: &str) -> bool {
    listing
        .lines()
        .filter_map(|l| l.strip_prefix("worktree "))
        .map(PathBuf::from)
        .any(|other| other != path && other.starts_with(path) && cwd.starts_with(&other))
}

static AHEAD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ahead (\d+)").expect("AHEAD_REGEX must compile"));
static BEHIND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"behind (\d+)").expect("BEHIND_REGEX must compile"));

/// Parse `%(upstream:track)` output such as `[ahead 1, behind 2]`.
pub(crate) fn parse_tracking(track: &str) -> TrackingState {
    let count = |re: &Regex| {
        re.captures(track)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    TrackingState::new(count(&AHEAD_REGEX), count(&BEHIND_REGEX))
}

pub(crate) fn parse_branches(output: &str, repo_path: &Path) -> Vec<Branch> {
    let mut local = Vec::new();
    let mut remote = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split('\0').collect();
        let [refname, sha, upstream, track, head, date, worktree, ..] = fields.as_slice() else {
            continue;
        };

        let (name, is_remote) = if let Some(name) = refname.strip_prefix("refs/heads/") {
            (name, false)
        } else if let Some(name) = refname.strip_prefix("refs/remotes/") {
            if name.ends_with("/HEAD") {
                continue;
            }
            (name, true)
        } else {
            continue;
        };

        let mut branch = Branch::local(repo_path, name);
        branch.remote = is_remote;
        branch.current = *head == "*";
        branch.sha = Some(sha.to_string()).filter(|s| !s.is_empty());
        branch.date = DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|d| d.with_timezone(&Utc));
        if !upstream.is_empty() {
            branch.upstream = Some(if track.contains("gone") {
                Upstream::gone(*upstream)
            } else {
                Upstream::new(*upstream)
            });
            branch.state = parse_tracking(track);
        }
        if !worktree.is_empty() && Path::new(worktree) != repo_path {
            branch.worktree_path = Some(PathBuf::from(worktree));
        }

        if is_remote {
            remote.push(branch);
        } else {
            local.push(branch);
        }
    }

    local.extend(remote);
    local
}

pub(crate) fn parse_remotes(output: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if !remotes.iter().any(|r| r.name == name) {
            remotes.push(Remote::new(name, url));
        }
    }
    remotes
}

pub(crate) fn parse_status(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();
    for line in output.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            if head != "(detached)" {
                status.branch = Some(head.to_string());
            }
        } else if let Some(upstream) = line.strip_prefix("# branch.upstream ") {
            status.upstream = Some(Upstream::new(upstream));
        } else if let Some(ab) = line.strip_prefix("# branch.ab ") {
            for part in ab.split_whitespace() {
                if let Some(n) = part.strip_prefix('+') {
                    status.state.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = part.strip_prefix('-') {
                    status.state.behind = n.parse().unwrap_or(0);
                }
            }
        } else if !line.starts_with('#') && !line.trim().is_empty() {
            status.has_changes = true;
        }
    }
    if status.upstream.is_some() && !output.contains("# branch.ab ") {
        if let Some(upstream) = status.upstream.as_mut() {
            upstream.missing = true;
        }
    }
    status
}

pub(crate) fn parse_log(output: &str, repo_path: &Path) -> Vec<Commit> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\0');
            let sha = fields.next()?;
            let summary = fields.next().unwrap_or_default();
            let author = fields.next().unwrap_or_default();
            let date = fields
                .next()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc));
            Some(Commit {
                repo_path: repo_path.to_path_buf(),
                sha: sha.to_string(),
                summary: summary.to_string(),
                author: author.to_string(),
                date,
            })
        })
        .collect()
}

pub(crate) fn parse_worktrees(output: &str, repo_path: &Path) -> Vec<Worktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<Worktree> = None;

    for line in output.lines() {
        if line.is_empty() {
            if let Some(wt) = current.take() {
                worktrees.push(wt);
            }
            continue;
        }

        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, Some(v)),
            None => (line, None),
        };

        match (key, current.as_mut()) {
            ("worktree", _) => {
                if let Some(wt) = current.take() {
                    worktrees.push(wt);
                }
                current = value.map(|path| Worktree::new(repo_path, path));
            }
            ("HEAD", Some(wt)) => wt.sha = value.map(String::from),
            ("branch", Some(wt)) => {
                wt.branch = value.map(|b| b.strip_prefix("refs/heads/").unwrap_or(b).to_string());
            }
            _ => {}
        }
    }
    if let Some(wt) = current {
        worktrees.push(wt);
    }

    if let Some(first) = worktrees.first_mut() {
        first.main = true;
    }
    worktrees
}

pub(crate) fn parse_version(output: &str) -> Option<(u32, u32)> {
    let version = output.trim().strip_prefix("git version ")?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

pub(crate) fn classify_worktree_create(message: &str) -> WorktreeCreateErrorReason {
    if message.contains("already checked out") || message.contains("is already used by worktree")
    {
        WorktreeCreateErrorReason::AlreadyCheckedOut
    } else if message.contains("already exists") {
        WorktreeCreateErrorReason::AlreadyExists
    } else {
        WorktreeCreateErrorReason::Other
    }
}

pub(crate) fn classify_worktree_delete(message: &str) -> WorktreeDeleteErrorReason {
    if message.contains("is a main working tree") {
        WorktreeDeleteErrorReason::MainWorkingTree
    } else if message.contains("contains modified or untracked files")
        || message.contains("use --force to delete it")
    {
        WorktreeDeleteErrorReason::HasChanges
    } else {
        WorktreeDeleteErrorReason::Other
    }
}

pub(crate) fn classify_apply_patch(message: &str) -> ApplyPatchErrorReason {
    if message.contains("with conflicts") {
        ApplyPatchErrorReason::AppliedWithConflicts
    } else if message.contains("does not match index")
        || message.contains("already exists in working directory")
        || message.contains("would be overwritten")
    {
        ApplyPatchErrorReason::WouldOverwrite
    } else {
        ApplyPatchErrorReason::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_parses_ahead_and_behind() {
        assert_eq!(parse_tracking("[ahead 3]"), TrackingState::new(3, 0));
        assert_eq!(parse_tracking("[behind 2]"), TrackingState::new(0, 2));
        assert_eq!(parse_tracking("[ahead 1, behind 4]"), TrackingState::new(1, 4));
        assert_eq!(parse_tracking(""), TrackingState::default());
        assert_eq!(parse_tracking("[gone]"), TrackingState::default());
    }

    #[test]
    fn branches_parse_locals_before_remotes() {
        let output = [
            "refs/remotes/origin/HEAD\0aaa\0\0\0 \0\0",
            "refs/remotes/origin/main\0bbb\0\0\0 \0\0",
            "refs/heads/main\0ccc\0origin/main\0[ahead 2]\0*\02024-05-01T10:00:00+00:00\0/repo",
            "refs/heads/old\0ddd\0origin/old\0[gone]\0 \0\0",
            "refs/heads/wt\0eee\0\0\0 \0\0/repo.worktrees/wt",
        ]
        .join("\n");
        let branches = parse_branches(&output, Path::new("/repo"));

        let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "old", "wt", "origin/main"]);

        let main = &branches[0];
        assert!(main.current);
        assert_eq!(main.state.ahead, 2);
        assert!(main.date.is_some());
        assert_eq!(main.worktree_path, None);
        assert!(branches[1].upstream.as_ref().is_some_and(|u| u.missing));
        assert_eq!(
            branches[2].worktree_path,
            Some(PathBuf::from("/repo.worktrees/wt"))
        );
        assert!(branches[3].remote);
    }

    #[test]
    fn remotes_are_deduplicated() {
        let output = "origin\tgit@host:a.git (fetch)\norigin\tgit@host:a.git (push)\nfork\thttps://x (fetch)\n";
        let remotes = parse_remotes(output);
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[1].name, "fork");
    }

    #[test]
    fn status_reads_branch_headers() {
        let output = "# branch.oid abc\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +3 -1\n1 .M N... 100644 100644 100644 a b src/lib.rs\n";
        let status = parse_status(output);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.state, TrackingState::new(3, 1));
        assert!(status.has_changes);
        assert!(!status.upstream.as_ref().is_some_and(|u| u.missing));
    }

    #[test]
    fn status_detached_has_no_branch() {
        let status = parse_status("# branch.oid abc\n# branch.head (detached)\n");
        assert_eq!(status.branch, None);
        assert!(!status.has_changes);
    }

    #[test]
    fn log_parses_fields() {
        let output = "0123456789\0Fix bug\0Ada\02024-01-02T03:04:05+00:00\nfedcba9876\0Add test\0Bob\0\n";
        let commits = parse_log(output, Path::new("/r"));
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].summary, "Fix bug");
        assert!(commits[0].date.is_some());
        assert_eq!(commits[1].author, "Bob");
        assert!(commits[1].date.is_none());
    }

    #[test]
    fn worktrees_mark_first_as_main() {
        let output = "worktree /repo\nHEAD abc\nbranch refs/heads/main\n\nworktree /repo.worktrees/feature\nHEAD def\nbranch refs/heads/feature\n\nworktree /tmp/detached\nHEAD 123\ndetached\n";
        let worktrees = parse_worktrees(output, Path::new("/repo"));
        assert_eq!(worktrees.len(), 3);
        assert!(worktrees[0].main);
        assert!(!worktrees[1].main);
        assert_eq!(worktrees[1].branch.as_deref(), Some("feature"));
        assert_eq!(worktrees[2].branch, None);
        assert_eq!(worktrees[2].sha.as_deref(), Some("123"));
    }

    #[test]
    fn version_parses() {
        assert_eq!(parse_version("git version 2.39.2\n"), Some((2, 39)));
        assert_eq!(parse_version("git version 2.30.0.windows.1"), Some((2, 30)));
        assert_eq!(parse_version("nonsense"), None);
    }

    #[test]
    fn worktree_errors_are_classified() {
        assert_eq!(
            classify_worktree_create("fatal: 'main' is already checked out at '/repo'"),
            WorktreeCreateErrorReason::AlreadyCheckedOut
        );
        assert_eq!(
            classify_worktree_create("fatal: '/tmp/x' already exists"),
            WorktreeCreateErrorReason::AlreadyExists
        );
        assert_eq!(
            classify_worktree_delete("fatal: '/tmp/x' contains modified or untracked files, use --force to delete it"),
            WorktreeDeleteErrorReason::HasChanges
        );
        assert_eq!(
            classify_worktree_delete("fatal: '/repo' is a main working tree"),
            WorktreeDeleteErrorReason::MainWorkingTree
        );
        assert_eq!(
            classify_worktree_delete("fatal: boom"),
            WorktreeDeleteErrorReason::Other
        );
    }

    #[test]
    fn apply_errors_are_classified() {
        assert_eq!(
            classify_apply_patch("Applied patch to 'src/lib.rs' with conflicts.\nU src/lib.rs"),
            ApplyPatchErrorReason::AppliedWithConflicts
        );
        assert_eq!(
            classify_apply_patch("error: src/lib.rs: does not match index"),
            ApplyPatchErrorReason::WouldOverwrite
        );
        assert_eq!(
            classify_apply_patch("error: new.txt: already exists in working directory"),
            ApplyPatchErrorReason::WouldOverwrite
        );
        assert_eq!(
            classify_apply_patch("error: corrupt patch at line 7"),
            ApplyPatchErrorReason::Other
        );
    }
}
