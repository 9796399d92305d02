//! Code-review source (Gerrit REST)

use crate::core::change::ChangeRecord;
use crate::core::error::{AuditError, AuditResult, FetchError, ResultExt};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Review-side status filter
///
/// `Closed` matches both merged and abandoned changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
  Open,
  Merged,
  Closed,
}

impl fmt::Display for ReviewStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReviewStatus::Open => write!(f, "open"),
      ReviewStatus::Merged => write!(f, "merged"),
      ReviewStatus::Closed => write!(f, "closed"),
    }
  }
}

/// A change search by status and topic
#[derive(Debug, Clone)]
pub struct ChangeQuery {
  pub status: ReviewStatus,
  pub topic: String,
}

impl ChangeQuery {
  pub fn by_topic(status: ReviewStatus, topic: impl Into<String>) -> Self {
    Self {
      status,
      topic: topic.into(),
    }
  }

  /// Render as Gerrit query syntax
  pub fn to_query_string(&self) -> String {
    format!("status:{} topic:{}", self.status, self.topic)
  }
}

/// Read-only access to the review server
pub trait ReviewSource {
  fn changes(&self, query: &ChangeQuery) -> AuditResult<Vec<ChangeRecord>>;
}

/// Parse a Gerrit JSON response
///
/// Gerrit prefixes every JSON body with one line (`)]}'`) that must be
/// discarded before parsing.
pub fn parse_review_body(source_name: &str, body: &str) -> AuditResult<Vec<ChangeRecord>> {
  let json = body.split_once('\n').map(|(_, rest)| rest).unwrap_or("");

  serde_json::from_str(json).map_err(|e| {
    AuditError::Fetch(FetchError::Malformed {
      source_name: source_name.to_string(),
      reason: e.to_string(),
    })
  })
}

pub struct GerritClient {
  base_url: String,
  http: reqwest::blocking::Client,
}

impl GerritClient {
  pub fn new(base_url: &str) -> AuditResult<Self> {
    let http = reqwest::blocking::Client::builder()
      .user_agent(concat!("bugcheck/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(60))
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      http,
    })
  }
}

impl ReviewSource for GerritClient {
  fn changes(&self, query: &ChangeQuery) -> AuditResult<Vec<ChangeRecord>> {
    let url = format!("{}/changes/", self.base_url);
    let q = query.to_query_string();
    debug!(%url, query = %q, "review request");

    let body = self
      .http
      .get(&url)
      .query(&[("q", q.as_str())])
      .send()
      .and_then(|r| r.error_for_status())
      .and_then(|r| r.text())?;

    parse_review_body(&url, &body)
  }
}
