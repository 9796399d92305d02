//! Tests for the `tag` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_tag_classification() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let output = run_bugcheck(temp.path(), &["tag", "v3.5.0", "v3.5.0qa1", "v3.6dev", "v3.5.1beta2"])?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  let out = stdout(&output);
  let lines: Vec<&str> = out.lines().collect();
  assert_eq!(lines.len(), 4);
  assert!(lines[0].starts_with("v3.5.0 ") && lines[0].ends_with("final"));
  assert!(lines[1].ends_with("pre-release"));
  assert!(lines[2].ends_with("development"));
  assert!(lines[3].ends_with("pre-release"));

  Ok(())
}

#[test]
fn test_tag_json() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let output = run_bugcheck(temp.path(), &["tag", "--json", "v3.4.0alpha", "release-3.4"])?;
  assert!(output.status.success());

  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(parsed[0]["tag"], "v3.4.0alpha");
  assert_eq!(parsed[0]["kind"], "pre_release");
  assert_eq!(parsed[1]["kind"], "final");

  Ok(())
}

#[test]
fn test_tag_requires_arguments() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let output = run_bugcheck(temp.path(), &["tag"])?;
  assert!(!output.status.success());
  Ok(())
}
