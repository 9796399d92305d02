//! Local repository mirrors and commit/tag resolution
//!
//! Each review project gets one mirror directory under the configured root.
//! [`MirrorStore`] is the read-through cache handed to the audit: the first
//! request for a project clones (or refreshes) its mirror, later requests
//! reuse the same [`RepoResolver`]. A project whose mirror could not be set
//! up stays unavailable for the rest of the run.

use crate::core::error::{AuditError, AuditResult, GitError};
use crate::core::tag::{TagKind, classify};
use crate::core::vcs::{CommitId, VcsClient};
use crate::utils;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where mirrors live and where they are cloned from
#[derive(Debug, Clone)]
pub struct MirrorSettings {
  /// Directory holding one mirror per project
  pub root: PathBuf,
  /// Clone URL template with a `{project}` placeholder
  pub clone_url: String,
  /// Mirrors older than this are refreshed before use
  pub max_age: Duration,
}

/// Commit and tag lookups against one project's mirror
pub struct RepoResolver {
  project: String,
  path: PathBuf,
  vcs: Arc<dyn VcsClient>,
}

impl RepoResolver {
  pub fn new(project: impl Into<String>, path: impl Into<PathBuf>, vcs: Arc<dyn VcsClient>) -> Self {
    Self {
      project: project.into(),
      path: path.into(),
      vcs,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Merge commit of a change on `branch`, searching history newer than `after`
  ///
  /// Best effort: a rewritten history or a too-narrow window yields `None`
  /// even for a merged change.
  pub fn find_merge_commit(
    &self,
    after: DateTime<Utc>,
    branch: &str,
    change_id: &str,
  ) -> AuditResult<Option<CommitId>> {
    let commit = self.vcs.find_trailer_commit(&self.path, after, branch, change_id)?;
    debug!(project = %self.project, change_id, commit = ?commit, "merge commit lookup");
    Ok(commit)
  }

  /// Earliest tag that contains `commit`
  ///
  /// Final release tags take precedence; pre-release tags are the fallback;
  /// development tags are never returned.
  pub fn find_earliest_tag(&self, commit: &CommitId) -> AuditResult<Option<String>> {
    let mut finals = Vec::new();
    let mut pre_releases = Vec::new();

    for tag in self.vcs.tags_containing(&self.path, commit)? {
      match classify(&tag) {
        TagKind::Final => finals.push(tag),
        TagKind::PreRelease => pre_releases.push(tag),
        TagKind::Development => {}
      }
    }

    let candidates = if finals.is_empty() { pre_releases } else { finals };

    let mut timed = Vec::with_capacity(candidates.len());
    for tag in candidates {
      let time = self.vcs.tag_commit_time(&self.path, &tag)?;
      timed.push((time, tag));
    }

    let earliest = select_earliest(timed);
    debug!(project = %self.project, %commit, tag = ?earliest, "earliest tag lookup");
    Ok(earliest)
  }
}

/// Oldest tag wins; equal times fall back to the lexicographically smallest name
fn select_earliest(timed: Vec<(i64, String)>) -> Option<String> {
  timed.into_iter().min().map(|(_, tag)| tag)
}

enum MirrorEntry {
  Ready(Arc<RepoResolver>),
  Unavailable(String),
}

/// Per-run cache of project mirrors
pub struct MirrorStore {
  settings: MirrorSettings,
  vcs: Arc<dyn VcsClient>,
  mirrors: Mutex<HashMap<String, MirrorEntry>>,
}

impl MirrorStore {
  pub fn new(settings: MirrorSettings, vcs: Arc<dyn VcsClient>) -> Self {
    Self {
      settings,
      vcs,
      mirrors: Mutex::new(HashMap::new()),
    }
  }

  /// Register an already prepared mirror
  #[cfg(test)]
  pub(crate) fn with_mirror(self, project: &str, path: impl Into<PathBuf>) -> Self {
    let resolver = RepoResolver::new(project, path, Arc::clone(&self.vcs));
    self.insert(project, MirrorEntry::Ready(Arc::new(resolver)))
  }

  /// Register a mirror that failed to set up
  #[cfg(test)]
  pub(crate) fn with_unavailable(self, project: &str, reason: &str) -> Self {
    self.insert(project, MirrorEntry::Unavailable(reason.to_string()))
  }

  #[cfg(test)]
  fn insert(mut self, project: &str, entry: MirrorEntry) -> Self {
    let mirrors = self.mirrors.get_mut().unwrap_or_else(|e| e.into_inner());
    mirrors.insert(project.to_string(), entry);
    self
  }

  /// Resolver for `project`, setting up its mirror on first use
  ///
  /// The cache lock is held while the mirror is created, so concurrent
  /// callers never clone the same project twice.
  pub fn resolver(&self, project: &str) -> AuditResult<Arc<RepoResolver>> {
    let mut mirrors = self.mirrors.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(entry) = mirrors.get(project) {
      return match entry {
        MirrorEntry::Ready(resolver) => Ok(Arc::clone(resolver)),
        MirrorEntry::Unavailable(reason) => Err(mirror_unavailable(project, reason)),
      };
    }

    let entry = match self.ensure_mirror(project) {
      Ok(path) => MirrorEntry::Ready(Arc::new(RepoResolver::new(project, path, Arc::clone(&self.vcs)))),
      Err(err) => {
        warn!(project, error = %err, "mirror unavailable, changes in this project stay unresolved");
        MirrorEntry::Unavailable(err.to_string())
      }
    };

    let result = match &entry {
      MirrorEntry::Ready(resolver) => Ok(Arc::clone(resolver)),
      MirrorEntry::Unavailable(reason) => Err(mirror_unavailable(project, reason)),
    };
    mirrors.insert(project.to_string(), entry);
    result
  }

  /// Clone the mirror if missing, refresh it if stale
  fn ensure_mirror(&self, project: &str) -> AuditResult<PathBuf> {
    let path = utils::mirror_path(&self.settings.root, project)?;

    if !path.exists() {
      let url = utils::expand_template(&self.settings.clone_url, "project", project);
      info!(project, %url, path = %path.display(), "cloning mirror");
      self.vcs.clone_mirror(&url, &path)?;
      return Ok(path);
    }

    if is_stale(&path, self.settings.max_age) {
      info!(project, "refreshing stale mirror");
      if let Err(err) = self.vcs.fetch_all(&path) {
        warn!(project, error = %err, "mirror refresh failed, using existing history");
      }
    }

    Ok(path)
  }
}

fn mirror_unavailable(project: &str, reason: &str) -> AuditError {
  AuditError::Git(GitError::MirrorUnavailable {
    project: project.to_string(),
    reason: reason.to_string(),
  })
}

/// A mirror is stale when its last fetch (or creation, if never fetched) is
/// older than `max_age`. Unreadable timestamps count as stale.
fn is_stale(path: &Path, max_age: Duration) -> bool {
  let marker = [path.join(".git").join("FETCH_HEAD"), path.join("FETCH_HEAD")]
    .into_iter()
    .find(|p| p.exists())
    .unwrap_or_else(|| path.to_path_buf());

  match std::fs::metadata(&marker).and_then(|m| m.modified()) {
    Ok(modified) => modified.elapsed().map(|age| age > max_age).unwrap_or(false),
    Err(_) => true,
  }
}
