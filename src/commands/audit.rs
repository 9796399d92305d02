//! Audit command: check tracker records against their review changes

use crate::core::change::ChangeStatus;
use crate::core::config::AuditConfig;
use crate::core::context::AuditContext;
use crate::core::error::{AuditResult, ExitCode};
use crate::core::mirror::MirrorStore;
use crate::core::reconcile::{Reconciliation, verify};
use crate::core::review::{ChangeQuery, ReviewSource, ReviewStatus};
use crate::core::tracker::{TrackerRecord, TrackerSource, records_blocking};
use crate::ui::progress::RecordProgress;
use crate::utils;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A record whose status disagrees with its changes
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
  pub bug: u64,
  pub version: String,
  pub status: String,
  pub summary: String,
  pub assignee: Option<String>,
  pub changes: Vec<String>,
  pub explanation: String,
}

/// A record that could not be audited
#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
  pub bug: u64,
  pub reason: String,
}

/// A change whose commit or tag could not be looked up
#[derive(Debug, Clone, Serialize)]
pub struct Unresolved {
  pub bug: u64,
  pub change: String,
  pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
  pub audited: usize,
  pub consistent: usize,
  pub excluded: usize,
  pub findings: Vec<Finding>,
  pub skipped: Vec<Skipped>,
  pub unresolved: Vec<Unresolved>,
}

impl AuditReport {
  /// Anything that should make the run exit non-zero
  pub fn has_findings(&self) -> bool {
    !self.findings.is_empty() || !self.skipped.is_empty() || !self.unresolved.is_empty()
  }
}

/// Run the audit command
pub fn run_audit(ctx: &AuditContext, bugs: Vec<u64>, tracker: Option<u64>, json: bool) -> AuditResult<()> {
  let source = ctx.tracker()?;
  let (records, excluded) = collect_records(&source, &ctx.config, &bugs, tracker)?;
  info!(records = records.len(), excluded, "fetched tracker records");

  let review = ctx.review()?;
  let mut report = audit_records(&records, &review, &ctx.mirrors, &ctx.config, !json);
  report.excluded = excluded;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report);
  }

  if report.has_findings() {
    std::process::exit(ExitCode::Findings.as_i32());
  }

  Ok(())
}

/// Fetch the records to audit; returns them with the number excluded by filters
///
/// Failing to fetch the record list is fatal: there is nothing to audit.
pub fn collect_records(
  source: &dyn TrackerSource,
  config: &AuditConfig,
  bugs: &[u64],
  tracker: Option<u64>,
) -> AuditResult<(Vec<TrackerRecord>, usize)> {
  if !bugs.is_empty() {
    let records = bugs.iter().map(|id| source.record(*id)).collect::<AuditResult<Vec<_>>>()?;
    return Ok((records, 0));
  }

  let candidates = match tracker {
    Some(tracker_id) => records_blocking(source, tracker_id)?
      .into_iter()
      .filter(|r| config.tracker.statuses.iter().any(|s| s.as_str() == r.status))
      .collect(),
    None => source.open_records(&config.tracker_query())?,
  };

  let filter = config.record_filter();
  let total = candidates.len();
  let records: Vec<TrackerRecord> = candidates
    .into_iter()
    .filter(|r| match filter.exclusion(r) {
      Some(reason) => {
        debug!(bug = r.id, %reason, "excluded");
        false
      }
      None => true,
    })
    .collect();

  let excluded = total - records.len();
  Ok((records, excluded))
}

/// Audit every record; per-record problems are collected, never propagated
pub fn audit_records(
  records: &[TrackerRecord],
  review: &dyn ReviewSource,
  mirrors: &Arc<MirrorStore>,
  config: &AuditConfig,
  show_progress: bool,
) -> AuditReport {
  let mut report = AuditReport::default();
  let mut progress = if show_progress {
    RecordProgress::new(records.len(), format!("Auditing {} records", records.len()))
  } else {
    None
  };

  for record in records {
    audit_record(record, review, mirrors, &config.review.topic, &mut report);
    if let Some(p) = progress.as_mut() {
      p.inc();
    }
  }

  report
}

fn audit_record(
  record: &TrackerRecord,
  review: &dyn ReviewSource,
  mirrors: &Arc<MirrorStore>,
  topic: &str,
  report: &mut AuditReport,
) {
  report.audited += 1;
  let changes = fetch_changes(record.id, review, mirrors, topic);

  match verify(record, &changes) {
    Ok(Reconciliation::Consistent) => {
      debug!(bug = record.id, "consistent");
      report.consistent += 1;
    }
    Ok(Reconciliation::Inconsistent { explanation, assignee }) => {
      report.findings.push(Finding {
        bug: record.id,
        version: record.version_label(),
        status: record.status.clone(),
        summary: record.summary.clone(),
        assignee,
        changes: changes.iter().map(|c| c.to_string()).collect(),
        explanation,
      });
    }
    Err(err) => {
      warn!(bug = record.id, error = %err, "record skipped");
      report.skipped.push(Skipped {
        bug: record.id,
        reason: err.to_string(),
      });
      return;
    }
  }

  for change in &changes {
    if let Some(reason) = change.resolution_failure() {
      report.unresolved.push(Unresolved {
        bug: record.id,
        change: change.to_string(),
        reason: reason.to_string(),
      });
    }
  }
}

/// Open changes first, then merged, then closed ones; duplicates keep their
/// first position. A failed query counts as "no changes" for that status.
fn fetch_changes(bug: u64, review: &dyn ReviewSource, mirrors: &Arc<MirrorStore>, topic: &str) -> Vec<ChangeStatus> {
  let topic = utils::expand_template(topic, "bug", &bug.to_string());
  let mut changes: Vec<ChangeStatus> = Vec::new();

  for status in [ReviewStatus::Open, ReviewStatus::Merged, ReviewStatus::Closed] {
    let records = match review.changes(&ChangeQuery::by_topic(status, topic.as_str())) {
      Ok(records) => records,
      Err(err) => {
        warn!(bug, %status, error = %err, "change query failed, treating as no changes");
        continue;
      }
    };

    for record in records {
      let change = ChangeStatus::new(record, Arc::clone(mirrors));
      if !changes.contains(&change) {
        changes.push(change);
      }
    }
  }

  changes
}

fn print_report(report: &AuditReport) {
  for finding in &report.findings {
    println!(
      "Bug #{} [{}] {}: {}",
      finding.bug, finding.version, finding.status, finding.summary
    );
    for change in &finding.changes {
      println!("  {}", change);
    }
    println!("  ** {} **", finding.explanation);
    if let Some(assignee) = &finding.assignee {
      println!("  -> {}", assignee);
    }
    println!();
  }

  if !report.skipped.is_empty() {
    println!("⚠️  {} record(s) could not be audited", report.skipped.len());
    for skipped in &report.skipped {
      println!("   Bug #{}: {}", skipped.bug, skipped.reason);
    }
    println!();
  }

  if !report.unresolved.is_empty() {
    println!("⚠️  {} change(s) could not be resolved", report.unresolved.len());
    for unresolved in &report.unresolved {
      println!("   Bug #{} {}", unresolved.bug, unresolved.change);
      println!("      {}", unresolved.reason.lines().next().unwrap_or(""));
    }
    println!();
  }

  if report.findings.is_empty() {
    println!("✅ {} record(s) audited, all consistent", report.audited);
  } else {
    println!(
      "❌ {} of {} record(s) inconsistent",
      report.findings.len(),
      report.audited
    );
  }
  if report.excluded > 0 {
    println!("   ({} record(s) excluded by keyword/component filters)", report.excluded);
  }
}
