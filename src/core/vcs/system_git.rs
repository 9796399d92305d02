//! System git backend
//!
//! Shells out to the `git` binary for every query. Each call is one
//! subprocess with an isolated environment; output is parsed here so the
//! rest of the tool never sees raw git text.

use super::{CommitId, VcsClient};
use crate::core::error::{AuditError, AuditResult, GitError, ResultExt};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// Git backend using system git (zero crate dependencies)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl SystemGit {
  pub fn new() -> Self {
    Self
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to `dir`
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(&self, dir: &Path) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(dir);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    // Never block on a credential prompt
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }

  /// Run a prepared command, mapping spawn errors and non-zero exits to `GitError`
  fn run(&self, mut cmd: Command, label: &str) -> AuditResult<Output> {
    debug!(command = label, "running git");
    let output = cmd.output().with_context(|| format!("Failed to execute {}", label))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(AuditError::Git(GitError::CommandFailed {
        command: label.to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(output)
  }
}

impl VcsClient for SystemGit {
  fn clone_mirror(&self, url: &str, dest: &Path) -> AuditResult<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("Failed to create mirror root {}", parent.display()))?;

    // git runs inside `parent`, so the destination is named relative to it
    let name = dest.file_name().ok_or_else(|| {
      AuditError::message(format!("Mirror path {} has no directory name", dest.display()))
    })?;
    let mut cmd = self.git_cmd(parent);
    cmd.args(["clone", "--no-checkout", "--quiet", url]).arg(name);
    self.run(cmd, &format!("git clone {}", url))?;
    Ok(())
  }

  fn fetch_all(&self, repo: &Path) -> AuditResult<()> {
    let mut cmd = self.git_cmd(repo);
    cmd.args(["fetch", "--all", "--tags", "--quiet"]);
    self.run(cmd, "git fetch --all")?;
    Ok(())
  }

  fn find_trailer_commit(
    &self,
    repo: &Path,
    after: DateTime<Utc>,
    branch: &str,
    change_id: &str,
  ) -> AuditResult<Option<CommitId>> {
    let mut cmd = self.git_cmd(repo);
    cmd.args(["log", "--format=raw", "--fixed-strings"]);
    cmd.arg(format!("--grep={}", change_id));
    cmd.arg(format!("--after={}", after.format("%Y-%m-%d %H:%M:%S +0000")));
    cmd.arg(format!("origin/{}", branch));
    cmd.arg("--");

    let output = self.run(cmd, &format!("git log origin/{}", branch))?;
    Ok(parse_trailer_commit(&String::from_utf8_lossy(&output.stdout), change_id))
  }

  fn tags_containing(&self, repo: &Path, commit: &CommitId) -> AuditResult<Vec<String>> {
    let mut cmd = self.git_cmd(repo);
    cmd.args(["tag", "--contains", commit.as_str()]);

    let output = self.run(cmd, &format!("git tag --contains {}", commit))?;
    let tags = String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();

    Ok(tags)
  }

  fn tag_commit_time(&self, repo: &Path, tag: &str) -> AuditResult<i64> {
    let mut cmd = self.git_cmd(repo);
    cmd.args(["log", "-1", "--format=%ct"]).arg(format!("refs/tags/{}", tag)).arg("--");

    let output = self.run(cmd, &format!("git log -1 {}", tag))?;
    parse_timestamp(&String::from_utf8_lossy(&output.stdout))
      .ok_or_else(|| AuditError::message(format!("Invalid commit time for tag {}", tag)))
  }
}

/// Find the first commit in `git log --format=raw` output carrying the trailer
/// `Change-Id: <change_id>` (exact match, surrounding whitespace ignored)
fn parse_trailer_commit(log: &str, change_id: &str) -> Option<CommitId> {
  let mut current: Option<&str> = None;

  for line in log.lines() {
    if let Some(rest) = line.strip_prefix("commit ") {
      current = rest.split_whitespace().next();
      continue;
    }

    if let Some(value) = line.trim_start().strip_prefix("Change-Id:")
      && value.trim() == change_id
      && let Some(sha) = current
    {
      return Some(CommitId::new(sha));
    }
  }

  None
}

/// Parse git timestamp (seconds since epoch)
fn parse_timestamp(ts_str: &str) -> Option<i64> {
  ts_str.split_whitespace().next().and_then(|s| s.parse().ok())
}
