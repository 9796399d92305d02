//! Review changes and the tracker status each one implies

use crate::core::mirror::MirrorStore;
use crate::core::status::BugStatus;
use crate::core::tag::{TagKind, classify};
use crate::core::vcs::CommitId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Lifecycle state of a change as reported by the review server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeState {
  New,
  Draft,
  Merged,
  Abandoned,
}

impl fmt::Display for ChangeState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ChangeState::New => write!(f, "NEW"),
      ChangeState::Draft => write!(f, "DRAFT"),
      ChangeState::Merged => write!(f, "MERGED"),
      ChangeState::Abandoned => write!(f, "ABANDONED"),
    }
  }
}

/// One change as returned by the review server
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRecord {
  pub change_id: String,
  #[serde(deserialize_with = "review_timestamp::deserialize")]
  pub created: DateTime<Utc>,
  pub branch: String,
  pub project: String,
  pub status: ChangeState,
  pub subject: String,
  #[serde(rename = "_number", default)]
  pub number: Option<u64>,
}

/// Review server timestamps: `2014-04-06 12:34:56.000000000`, always UTC
pub mod review_timestamp {
  use chrono::{DateTime, NaiveDateTime, Utc};
  use serde::{Deserialize, Deserializer};

  const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

  pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, FORMAT).map(|naive| naive.and_utc())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
  }
}

/// Outcome of one memoized lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
  Found(T),
  /// Nothing to find, or the search came back empty
  NotFound,
  /// The lookup could not run (mirror unavailable, git failure)
  Failed(String),
}

impl<T> Lookup<T> {
  pub fn found(&self) -> Option<&T> {
    match self {
      Lookup::Found(value) => Some(value),
      _ => None,
    }
  }
}

/// A change together with lazily resolved merge commit and release tag
///
/// Resolution happens on first use of any predicate and is memoized, so each
/// change costs at most one commit search and one tag search per run. The
/// project mirror is only requested once a merged change needs it.
/// Two `ChangeStatus` values are equal when their change ids are equal.
pub struct ChangeStatus {
  record: ChangeRecord,
  mirrors: Arc<MirrorStore>,
  commit: OnceCell<Lookup<CommitId>>,
  tag: OnceCell<Lookup<String>>,
}

impl ChangeStatus {
  /// Wrap a change; its project mirror comes from `mirrors` when first needed
  pub fn new(record: ChangeRecord, mirrors: Arc<MirrorStore>) -> Self {
    Self {
      record,
      mirrors,
      commit: OnceCell::new(),
      tag: OnceCell::new(),
    }
  }

  pub fn record(&self) -> &ChangeRecord {
    &self.record
  }

  pub fn change_id(&self) -> &str {
    &self.record.change_id
  }

  /// Abbreviated change id used in messages
  pub fn short_id(&self) -> &str {
    let id = &self.record.change_id;
    id.char_indices().nth(7).map(|(idx, _)| &id[..idx]).unwrap_or(id)
  }

  pub fn is_merged(&self) -> bool {
    self.record.status == ChangeState::Merged
  }

  pub fn is_abandoned(&self) -> bool {
    self.record.status == ChangeState::Abandoned
  }

  /// Merge commit lookup; never attempted for unmerged changes
  pub fn commit_lookup(&self) -> &Lookup<CommitId> {
    self.commit.get_or_init(|| {
      if !self.is_merged() {
        return Lookup::NotFound;
      }

      let resolver = match self.mirrors.resolver(&self.record.project) {
        Ok(resolver) => resolver,
        Err(err) => return Lookup::Failed(err.to_string()),
      };

      match resolver.find_merge_commit(self.record.created, &self.record.branch, &self.record.change_id) {
        Ok(Some(commit)) => Lookup::Found(commit),
        Ok(None) => Lookup::NotFound,
        Err(err) => {
          warn!(change = %self.short_id(), error = %err, "merge commit lookup failed");
          Lookup::Failed(err.to_string())
        }
      }
    })
  }

  /// Earliest release tag lookup; only attempted once a commit is known
  pub fn tag_lookup(&self) -> &Lookup<String> {
    self.tag.get_or_init(|| {
      let Some(commit) = self.commit_lookup().found() else {
        return Lookup::NotFound;
      };
      let resolver = match self.mirrors.resolver(&self.record.project) {
        Ok(resolver) => resolver,
        Err(err) => return Lookup::Failed(err.to_string()),
      };

      match resolver.find_earliest_tag(commit) {
        Ok(Some(tag)) => Lookup::Found(tag),
        Ok(None) => Lookup::NotFound,
        Err(err) => {
          warn!(change = %self.short_id(), error = %err, "tag lookup failed");
          Lookup::Failed(err.to_string())
        }
      }
    })
  }

  pub fn commit(&self) -> Option<&CommitId> {
    self.commit_lookup().found()
  }

  pub fn tag(&self) -> Option<&str> {
    self.tag_lookup().found().map(String::as_str)
  }

  /// First resolution failure, if any lookup could not run
  pub fn resolution_failure(&self) -> Option<&str> {
    if let Lookup::Failed(reason) = self.commit_lookup() {
      return Some(reason);
    }
    match self.tag_lookup() {
      Lookup::Failed(reason) => Some(reason),
      _ => None,
    }
  }

  pub fn tag_kind(&self) -> Option<TagKind> {
    self.tag().map(classify)
  }

  /// Fix is in a build handed to testers
  pub fn is_for_qa(&self) -> bool {
    self.tag_kind() == Some(TagKind::PreRelease)
  }

  /// Fix is in a final release
  pub fn is_released(&self) -> bool {
    match self.tag_kind() {
      None | Some(TagKind::PreRelease) | Some(TagKind::Development) => false,
      Some(TagKind::Final) => true,
    }
  }

  /// Tracker status this change requires on its own
  pub fn expected_bug_status(&self) -> BugStatus {
    if self.is_for_qa() {
      BugStatus::OnQa
    } else if self.is_released() {
      BugStatus::Closed
    } else if self.is_merged() {
      BugStatus::Modified
    } else {
      BugStatus::Post
    }
  }

  /// Explanation used when the tracker disagrees with this change
  pub fn mismatch_message(&self) -> String {
    match self.tag() {
      Some(tag) if self.is_released() => format!("Bug should be CLOSED, {} contains a fix", tag),
      Some(tag) if self.is_for_qa() => format!("Bug should be ON_QA, use {} for verification of the fix", tag),
      _ if self.is_merged() => format!("Change {} has been merged, but bug is not in MODIFIED", self.short_id()),
      _ => format!("Bug should be in POST, change {} is not merged yet", self.short_id()),
    }
  }
}

impl PartialEq for ChangeStatus {
  fn eq(&self, other: &Self) -> bool {
    self.record.change_id == other.record.change_id
  }
}

impl Eq for ChangeStatus {}

impl fmt::Debug for ChangeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChangeStatus")
      .field("change_id", &self.record.change_id)
      .field("status", &self.record.status)
      .field("commit", &self.commit.get())
      .field("tag", &self.tag.get())
      .finish()
  }
}

impl fmt::Display for ChangeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}] {} {} ({})",
      self.record.branch,
      self.short_id(),
      self.record.subject,
      self.record.status
    )
  }
}
