//! Tracker records and the Bugzilla REST source
//!
//! The audit only reads from the tracker. Records are fetched as snapshots,
//! filtered by keyword and component deny-lists, and (for meta "tracker"
//! records) expanded to everything that transitively blocks them.

use crate::core::error::{AuditError, AuditResult, FetchError, ResultExt};
use crate::core::status::BugStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::debug;

const INCLUDE_FIELDS: &str = "id,status,summary,version,assigned_to,keywords,component,depends_on";

/// Snapshot of one tracker record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerRecord {
  pub id: u64,
  /// Raw status; classified when the record is audited
  pub status: String,
  #[serde(default)]
  pub summary: String,
  #[serde(default, deserialize_with = "one_or_many")]
  pub version: Vec<String>,
  #[serde(default)]
  pub assigned_to: Option<String>,
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default, deserialize_with = "one_or_many")]
  pub component: Vec<String>,
  /// Records blocking this one
  #[serde(default)]
  pub depends_on: Vec<u64>,
}

impl TrackerRecord {
  pub fn version_label(&self) -> String {
    self.version.join(", ")
  }
}

/// Bugzilla installations disagree on whether `version` and `component` are
/// strings or lists
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match OneOrMany::deserialize(deserializer)? {
    OneOrMany::One(value) => vec![value],
    OneOrMany::Many(values) => values,
  })
}

/// Which records to fetch
#[derive(Debug, Clone)]
pub struct TrackerQuery {
  pub product: String,
  pub statuses: Vec<BugStatus>,
}

/// Keyword and component deny-lists applied before auditing
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  pub exclude_keywords: Vec<String>,
  pub exclude_components: Vec<String>,
}

impl RecordFilter {
  /// Reason a record is left out of the audit, if any
  pub fn exclusion(&self, record: &TrackerRecord) -> Option<String> {
    if let Some(keyword) = record.keywords.iter().find(|k| self.exclude_keywords.contains(k)) {
      return Some(format!("keyword {}", keyword));
    }
    if let Some(component) = record.component.iter().find(|c| self.exclude_components.contains(c)) {
      return Some(format!("component {}", component));
    }
    None
  }
}

/// Read-only access to the tracker
pub trait TrackerSource {
  /// Records matching `query`
  fn open_records(&self, query: &TrackerQuery) -> AuditResult<Vec<TrackerRecord>>;

  /// A single record by id
  fn record(&self, id: u64) -> AuditResult<TrackerRecord>;
}

/// Every record that transitively blocks `tracker_id`, each exactly once
///
/// Walks `depends_on` breadth-first with a visited set, so cyclic blocking
/// relationships terminate. The tracker record itself is not included.
pub fn records_blocking(source: &dyn TrackerSource, tracker_id: u64) -> AuditResult<Vec<TrackerRecord>> {
  let root = source.record(tracker_id)?;
  let mut visited = HashSet::from([tracker_id]);
  let mut queue: VecDeque<u64> = root.depends_on.iter().copied().collect();
  let mut found = Vec::new();

  while let Some(id) = queue.pop_front() {
    if !visited.insert(id) {
      continue;
    }

    let record = source.record(id)?;
    queue.extend(record.depends_on.iter().copied().filter(|dep| !visited.contains(dep)));
    found.push(record);
  }

  debug!(tracker_id, blocking = found.len(), "expanded tracker");
  Ok(found)
}

#[derive(Deserialize)]
struct BugList {
  #[serde(default)]
  bugs: Vec<TrackerRecord>,
  #[serde(default)]
  error: bool,
  #[serde(default)]
  message: Option<String>,
}

/// Bugzilla over its REST API (`/rest/bug`)
pub struct BugzillaClient {
  base_url: String,
  http: reqwest::blocking::Client,
}

impl BugzillaClient {
  pub fn new(base_url: &str) -> AuditResult<Self> {
    let http = reqwest::blocking::Client::builder()
      .user_agent(concat!("bugcheck/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(120))
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      http,
    })
  }

  fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> AuditResult<T> {
    let url = format!("{}{}", self.base_url, path);
    debug!(%url, "tracker request");

    let body = self
      .http
      .get(&url)
      .query(params)
      .send()
      .and_then(|r| r.error_for_status())
      .and_then(|r| r.text())?;

    serde_json::from_str(&body).map_err(|e| malformed(&url, e.to_string()))
  }

  fn bugs(&self, path: &str, params: &[(&str, String)]) -> AuditResult<Vec<TrackerRecord>> {
    let list: BugList = self.get(path, params)?;
    if list.error {
      return Err(malformed(
        &format!("{}{}", self.base_url, path),
        list.message.unwrap_or_else(|| "error without message".to_string()),
      ));
    }
    Ok(list.bugs)
  }
}

impl TrackerSource for BugzillaClient {
  fn open_records(&self, query: &TrackerQuery) -> AuditResult<Vec<TrackerRecord>> {
    let mut params = vec![
      ("product", query.product.clone()),
      ("include_fields", INCLUDE_FIELDS.to_string()),
    ];
    params.extend(query.statuses.iter().map(|s| ("status", s.to_string())));

    self.bugs("/rest/bug", &params)
  }

  fn record(&self, id: u64) -> AuditResult<TrackerRecord> {
    let path = format!("/rest/bug/{}", id);
    self
      .bugs(&path, &[("include_fields", INCLUDE_FIELDS.to_string())])?
      .into_iter()
      .next()
      .ok_or_else(|| malformed(&format!("{}{}", self.base_url, path), format!("bug {} not returned", id)))
  }
}

fn malformed(url: &str, reason: String) -> AuditError {
  AuditError::Fetch(FetchError::Malformed {
    source_name: url.to_string(),
    reason,
  })
}
