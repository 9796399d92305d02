//! Tracker status lifecycle
//!
//! Six canonical statuses in a fixed total order, plus `VERIFIED`, which sits
//! at the same position as `ON_QA`. Comparisons between statuses always go
//! through [`BugStatus::order`], never through the enum's own ordering, so the
//! alias compares equal to `ON_QA`.

use crate::core::error::StatusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugStatus {
  New,
  Assigned,
  Post,
  Modified,
  OnQa,
  Verified,
  Closed,
}

/// Statuses in which a record may legitimately have no live change
pub const NO_CHANGE_STATUSES: [BugStatus; 3] = [BugStatus::New, BugStatus::Assigned, BugStatus::Closed];

/// Statuses queried by default: everything that is not yet closed
pub const OPEN_STATUSES: [BugStatus; 6] = [
  BugStatus::New,
  BugStatus::Assigned,
  BugStatus::Post,
  BugStatus::Modified,
  BugStatus::OnQa,
  BugStatus::Verified,
];

impl BugStatus {
  /// Position in the lifecycle: NEW < ASSIGNED < POST < MODIFIED < ON_QA (= VERIFIED) < CLOSED
  pub fn order(self) -> u8 {
    match self {
      BugStatus::New => 0,
      BugStatus::Assigned => 1,
      BugStatus::Post => 2,
      BugStatus::Modified => 3,
      BugStatus::OnQa | BugStatus::Verified => 4,
      BugStatus::Closed => 5,
    }
  }

  /// Whether a record in this status may have no live change at all
  pub fn allows_no_change(self) -> bool {
    NO_CHANGE_STATUSES.contains(&self)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      BugStatus::New => "NEW",
      BugStatus::Assigned => "ASSIGNED",
      BugStatus::Post => "POST",
      BugStatus::Modified => "MODIFIED",
      BugStatus::OnQa => "ON_QA",
      BugStatus::Verified => "VERIFIED",
      BugStatus::Closed => "CLOSED",
    }
  }
}

impl fmt::Display for BugStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BugStatus {
  type Err = StatusError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "NEW" => Ok(BugStatus::New),
      "ASSIGNED" => Ok(BugStatus::Assigned),
      "POST" => Ok(BugStatus::Post),
      "MODIFIED" => Ok(BugStatus::Modified),
      "ON_QA" => Ok(BugStatus::OnQa),
      "VERIFIED" => Ok(BugStatus::Verified),
      "CLOSED" => Ok(BugStatus::Closed),
      other => Err(StatusError::Unknown {
        status: other.to_string(),
      }),
    }
  }
}
