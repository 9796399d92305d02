//! Progress indicators for long-running audits
//!
//! Uses `linya`, which draws to stderr. Bars are only shown when stderr is a
//! terminal so that logs and piped output stay clean.

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// Progress bar over the records being audited
pub struct RecordProgress {
  progress: Progress,
  bar: Bar,
}

impl RecordProgress {
  /// Create a progress bar, or `None` when there is nothing to draw on
  pub fn new(total: usize, label: impl Into<String>) -> Option<Self> {
    if total == 0 || !std::io::stderr().is_terminal() {
      return None;
    }

    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Some(Self { progress, bar })
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
