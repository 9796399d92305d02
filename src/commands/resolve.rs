//! Resolve a single change without consulting the tracker

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::core::change::{ChangeRecord, ChangeState, ChangeStatus, review_timestamp};
use crate::core::context::AuditContext;
use crate::core::error::{AuditError, AuditResult};
use crate::core::status::BugStatus;
use crate::core::tag::TagKind;

#[derive(Debug, Serialize)]
struct Resolution {
  project: String,
  mirror: String,
  branch: String,
  change_id: String,
  commit: Option<String>,
  tag: Option<String>,
  tag_kind: Option<TagKind>,
  implied_status: BugStatus,
}

/// Run the resolve command
pub fn run_resolve(
  ctx: &AuditContext,
  project: String,
  branch: String,
  change_id: String,
  after: Option<String>,
  json: bool,
) -> AuditResult<()> {
  let created = match after.as_deref() {
    Some(raw) => parse_after(raw)?,
    None => DateTime::<Utc>::UNIX_EPOCH,
  };

  let resolver = ctx.mirrors.resolver(&project)?;
  let mirror = resolver.path().display().to_string();
  let change = ChangeStatus::new(
    ChangeRecord {
      change_id,
      created,
      branch,
      project,
      status: ChangeState::Merged,
      subject: String::new(),
      number: None,
    },
    Arc::clone(&ctx.mirrors),
  );

  if let Some(reason) = change.resolution_failure() {
    return Err(AuditError::message(reason.to_string()).context(format!("Failed to resolve {}", change.change_id())));
  }

  let resolution = Resolution {
    project: change.record().project.clone(),
    mirror,
    branch: change.record().branch.clone(),
    change_id: change.change_id().to_string(),
    commit: change.commit().map(|c| c.to_string()),
    tag: change.tag().map(str::to_string),
    tag_kind: change.tag_kind(),
    implied_status: change.expected_bug_status(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    return Ok(());
  }

  println!("🔍 {} [{}] {}", resolution.project, resolution.branch, resolution.change_id);
  println!("   mirror:  {}", resolution.mirror);
  match &resolution.commit {
    Some(commit) => println!("   commit:  {}", commit),
    None => println!("   commit:  (not found on origin/{})", resolution.branch),
  }
  match (&resolution.tag, resolution.tag_kind) {
    (Some(tag), Some(kind)) => println!("   tag:     {} ({})", tag, kind),
    _ => println!("   tag:     (none)"),
  }
  println!("   status:  {}", resolution.implied_status);

  Ok(())
}

/// Accepts review-server timestamps, RFC 3339, or a bare date
fn parse_after(raw: &str) -> AuditResult<DateTime<Utc>> {
  if let Ok(ts) = review_timestamp::parse(raw) {
    return Ok(ts);
  }
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Ok(ts.with_timezone(&Utc));
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    && let Some(midnight) = date.and_hms_opt(0, 0, 0)
  {
    return Ok(midnight.and_utc());
  }

  Err(AuditError::with_help(
    format!("Invalid --after value '{}'", raw),
    "Use YYYY-MM-DD, RFC 3339, or 'YYYY-MM-DD HH:MM:SS'",
  ))
}
