//! Tests for the `resolve` command

use crate::helpers::*;
use anyhow::Result;

const RELEASED: &str = "I1010000000000000000000000000000000000000";
const IN_BETA: &str = "I1050000000000000000000000000000000000000";

/// master: import, fix (v3.5.0beta1, v3.5.0), fix (v3.5.1beta1, v3.6dev)
fn setup() -> Result<TestSite> {
  let site = TestSite::new()?;
  let repo = site.upstream("glusterfs")?;

  repo.commit("nfs: fix crash on lookup", Some(RELEASED), "2014-04-07T10:00:00Z")?;
  repo.tag("v3.5.0beta1")?;
  repo.tag("v3.5.0")?;
  repo.commit("afr: fix split-brain detection", Some(IN_BETA), "2014-04-10T10:00:00Z")?;
  repo.tag("v3.5.1beta1")?;
  repo.tag("v3.6dev")?;

  // Resolve never contacts the servers
  site.write_config("http://127.0.0.1:9")?;
  Ok(site)
}

#[test]
fn test_resolve_released_change() -> Result<()> {
  let site = setup()?;

  let output = run_bugcheck(
    &site.work_dir(),
    &["resolve", "--project", "glusterfs", "--branch", "master", "--change-id", RELEASED],
  )?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  let out = stdout(&output);
  assert!(out.contains("v3.5.0 (final)"), "stdout: {}", out);
  assert!(out.contains("CLOSED"));
  assert!(site.mirror_root().join("glusterfs").exists());

  Ok(())
}

#[test]
fn test_resolve_json_prefers_pre_release_over_development() -> Result<()> {
  let site = setup()?;

  let output = run_bugcheck(
    &site.work_dir(),
    &[
      "resolve",
      "--project",
      "glusterfs",
      "--branch",
      "master",
      "--change-id",
      IN_BETA,
      "--after",
      "2014-04-06",
      "--json",
    ],
  )?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(parsed["tag"], "v3.5.1beta1");
  assert_eq!(parsed["tag_kind"], "pre_release");
  assert_eq!(parsed["implied_status"], "ON_QA");
  assert_eq!(parsed["commit"].as_str().map(str::len), Some(40));

  Ok(())
}

#[test]
fn test_resolve_outside_search_window() -> Result<()> {
  let site = setup()?;

  // The fix was committed before the window opens
  let output = run_bugcheck(
    &site.work_dir(),
    &[
      "resolve",
      "--project",
      "glusterfs",
      "--branch",
      "master",
      "--change-id",
      RELEASED,
      "--after",
      "2014-04-08",
      "--json",
    ],
  )?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert!(parsed["commit"].is_null());
  assert_eq!(parsed["implied_status"], "MODIFIED");

  Ok(())
}

#[test]
fn test_resolve_unknown_project_fails() -> Result<()> {
  let site = setup()?;

  let output = run_bugcheck(
    &site.work_dir(),
    &["resolve", "--project", "nonexistent", "--branch", "master", "--change-id", RELEASED],
  )?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("nonexistent"));

  Ok(())
}
