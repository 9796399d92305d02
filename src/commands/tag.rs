use serde::Serialize;

use crate::core::error::AuditResult;
use crate::core::tag::{TagKind, classify};

#[derive(Debug, Serialize)]
struct TagReport<'a> {
  tag: &'a str,
  kind: TagKind,
}

/// Classify release tag names
pub fn run_tag(tags: Vec<String>, json: bool) -> AuditResult<()> {
  let reports: Vec<TagReport> = tags
    .iter()
    .map(|tag| TagReport {
      tag,
      kind: classify(tag),
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&reports)?);
    return Ok(());
  }

  let width = tags.iter().map(|t| t.len()).max().unwrap_or(0);
  for report in &reports {
    println!("{:<width$}  {}", report.tag, report.kind, width = width);
  }

  Ok(())
}
