pub mod system_git;

pub use system_git::SystemGit;

use crate::core::error::AuditResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A commit hash as printed by git
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
  pub fn new(sha: impl Into<String>) -> Self {
    Self(sha.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CommitId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// The version-control queries the audit depends on
///
/// Every method operates on a local mirror directory. Implementations report
/// "not found" as `Ok(None)` / `Ok(vec![])` and reserve `Err` for commands
/// that could not run or exited unsuccessfully.
pub trait VcsClient: Send + Sync {
  /// Clone `url` into `dest`, which must not exist yet
  fn clone_mirror(&self, url: &str, dest: &Path) -> AuditResult<()>;

  /// Fetch every remote branch and tag into an existing mirror
  fn fetch_all(&self, repo: &Path) -> AuditResult<()>;

  /// First commit on `origin/<branch>` newer than `after` whose message carries
  /// a `Change-Id:` trailer equal to `change_id`
  fn find_trailer_commit(
    &self,
    repo: &Path,
    after: DateTime<Utc>,
    branch: &str,
    change_id: &str,
  ) -> AuditResult<Option<CommitId>>;

  /// Names of all tags whose history contains `commit`
  fn tags_containing(&self, repo: &Path, commit: &CommitId) -> AuditResult<Vec<String>>;

  /// Commit time (seconds since epoch) of the commit a tag points at
  fn tag_commit_time(&self, repo: &Path, tag: &str) -> AuditResult<i64>;
}
