//! Release tag classification
//!
//! Tags are classified by plain substring matching, case-sensitive and
//! unanchored: `v3.7.0qa1`, `v3.7.0beta2` and `v3.7.0rc1` are all pre-release
//! builds, `v3.7.0dev` is a development build and anything else is final.

use serde::Serialize;
use std::fmt;

/// Substrings that mark a build handed to testers
const PRE_RELEASE_MARKERS: [&str; 4] = ["qa", "alpha", "beta", "rc"];

/// Substring that marks a development snapshot
const DEVELOPMENT_MARKER: &str = "dev";

/// What kind of build a tag denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
  PreRelease,
  Development,
  Final,
}

impl fmt::Display for TagKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TagKind::PreRelease => write!(f, "pre-release"),
      TagKind::Development => write!(f, "development"),
      TagKind::Final => write!(f, "final"),
    }
  }
}

/// Classify a tag name. Total over any input; the empty string is `Final`.
pub fn classify(tag: &str) -> TagKind {
  if PRE_RELEASE_MARKERS.iter().any(|marker| tag.contains(marker)) {
    TagKind::PreRelease
  } else if tag.contains(DEVELOPMENT_MARKER) {
    TagKind::Development
  } else {
    TagKind::Final
  }
}
