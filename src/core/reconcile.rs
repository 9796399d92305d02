//! Tracker status reconciliation
//!
//! A record's status must equal the status implied by its least advanced live
//! change. Abandoned changes are ignored; a record with no changes at all (or
//! only abandoned ones) must be NEW, ASSIGNED or CLOSED.
//!
//! ```text
//!   change A: merged, in v3.5.0      -> CLOSED
//!   change B: merged, no tag yet     -> MODIFIED   <- least advanced
//!   change C: abandoned              -> (ignored)
//!   tracker must be MODIFIED
//! ```

use crate::core::change::ChangeStatus;
use crate::core::error::AuditResult;
use crate::core::status::BugStatus;
use crate::core::tracker::TrackerRecord;
use serde::Serialize;
use tracing::debug;

/// Outcome of checking one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Reconciliation {
  Consistent,
  Inconsistent {
    explanation: String,
    /// Who should act on the finding
    assignee: Option<String>,
  },
}

impl Reconciliation {
  pub fn is_consistent(&self) -> bool {
    matches!(self, Reconciliation::Consistent)
  }
}

/// Check a record's status against its changes
///
/// Fails only when the record's status is outside the known lifecycle.
/// On ties between equally advanced changes the first one listed explains
/// the mismatch.
pub fn verify(record: &TrackerRecord, changes: &[ChangeStatus]) -> AuditResult<Reconciliation> {
  let status: BugStatus = record.status.parse()?;
  let inconsistent = |explanation: String| Reconciliation::Inconsistent {
    explanation,
    assignee: record.assigned_to.clone(),
  };

  if changes.is_empty() {
    if status.allows_no_change() {
      return Ok(Reconciliation::Consistent);
    }
    return Ok(inconsistent(format!("No change posted, but bug is in {}", status)));
  }

  let live: Vec<&ChangeStatus> = changes.iter().filter(|c| !c.is_abandoned()).collect();

  if live.is_empty() && !status.allows_no_change() {
    return Ok(inconsistent(format!("Bug is in {}, but all changes were abandoned", status)));
  }

  let mut least: Option<(&ChangeStatus, BugStatus)> = None;
  for change in live {
    let implied = change.expected_bug_status();
    debug!(bug = record.id, change = %change.short_id(), %implied, "implied status");
    if least.is_none_or(|(_, lowest)| implied.order() < lowest.order()) {
      least = Some((change, implied));
    }
  }

  match least {
    Some((change, implied)) if implied.order() != status.order() => Ok(inconsistent(change.mismatch_message())),
    _ => Ok(Reconciliation::Consistent),
  }
}
