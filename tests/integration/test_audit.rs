//! Tests for the `audit` command

use crate::helpers::*;
use anyhow::Result;

const RELEASED: &str = "I1010000000000000000000000000000000000000";
const OPEN: &str = "I1020000000000000000000000000000000000000";
const IN_BETA: &str = "I1050000000000000000000000000000000000000";
const ABANDONED: &str = "I1060000000000000000000000000000000000000";

/// Upstream history plus a stub server answering for six records:
///
/// - 101 MODIFIED, fix released in v3.5.0            -> should be CLOSED
/// - 102 POST, change still open                     -> consistent
/// - 103 NEW, no changes                             -> consistent
/// - 104 NEW, keyword Tracking                       -> excluded
/// - 105 ON_QA, fix in v3.5.1beta1                   -> consistent
/// - 106 POST, only change abandoned                 -> all changes abandoned
fn setup() -> Result<(TestSite, StubServer)> {
  let site = TestSite::new()?;
  let repo = site.upstream("glusterfs")?;

  repo.commit("nfs: fix crash on lookup", Some(RELEASED), "2014-04-07T10:00:00Z")?;
  repo.tag("v3.5.0")?;
  repo.commit("afr: fix split-brain detection", Some(IN_BETA), "2014-04-10T10:00:00Z")?;
  repo.tag("v3.5.1beta1")?;

  let bugs = bug_list(&[
    bug(101, "MODIFIED", &[]),
    bug(102, "POST", &[]),
    bug(103, "NEW", &[]),
    bug(104, "NEW", &["Tracking"]),
    bug(105, "ON_QA", &[]),
    bug(106, "POST", &[]),
  ]);

  let routes = vec![
    ("/rest/bug/101".to_string(), bug_list(&[bug(101, "MODIFIED", &[])])),
    ("/rest/bug?".to_string(), bugs),
    (
      "q=status:merged topic:bug-101".to_string(),
      change_list(&[change(RELEASED, "MERGED", "nfs: fix crash on lookup")]),
    ),
    (
      "q=status:open topic:bug-102".to_string(),
      change_list(&[change(OPEN, "NEW", "dht: fix rename race")]),
    ),
    (
      "q=status:merged topic:bug-105".to_string(),
      change_list(&[change(IN_BETA, "MERGED", "afr: fix split-brain detection")]),
    ),
    (
      "q=status:closed topic:bug-106".to_string(),
      change_list(&[change(ABANDONED, "ABANDONED", "rejected approach")]),
    ),
    ("/changes/".to_string(), change_list(&[])),
  ];

  let server = StubServer::start(routes)?;
  site.write_config(&server.url)?;
  Ok((site, server))
}

#[test]
fn test_audit_reports_inconsistent_records() -> Result<()> {
  let (site, _server) = setup()?;

  let output = run_bugcheck(&site.work_dir(), &["audit"])?;
  let out = stdout(&output);
  assert_eq!(output.status.code(), Some(3), "stdout: {}\nstderr: {}", out, stderr(&output));

  assert!(out.contains("Bug #101 [mainline] MODIFIED: bug 101"));
  assert!(out.contains("** Bug should be CLOSED, v3.5.0 contains a fix **"));
  assert!(out.contains("[master] I101000 nfs: fix crash on lookup (MERGED)"));
  assert!(out.contains("-> dev@example.com"));

  assert!(out.contains("Bug #106"));
  assert!(out.contains("** Bug is in POST, but all changes were abandoned **"));

  for consistent in ["Bug #102", "Bug #103", "Bug #105"] {
    assert!(!out.contains(consistent), "{} reported: {}", consistent, out);
  }
  assert!(!out.contains("Bug #104"));
  assert!(out.contains("1 record(s) excluded"));

  Ok(())
}

#[test]
fn test_audit_json_report() -> Result<()> {
  let (site, _server) = setup()?;

  let output = run_bugcheck(&site.work_dir(), &["audit", "--json"])?;
  assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["audited"], 5);
  assert_eq!(report["consistent"], 3);
  assert_eq!(report["excluded"], 1);

  let findings = report["findings"].as_array().cloned().unwrap_or_default();
  let bugs: Vec<u64> = findings.iter().filter_map(|f| f["bug"].as_u64()).collect();
  assert_eq!(bugs, vec![101, 106]);
  assert_eq!(findings[0]["explanation"], "Bug should be CLOSED, v3.5.0 contains a fix");
  assert!(report["unresolved"].as_array().is_some_and(|u| u.is_empty()));

  Ok(())
}

#[test]
fn test_audit_single_bug_reuses_mirror() -> Result<()> {
  let (site, _server) = setup()?;

  let output = run_bugcheck(&site.work_dir(), &["audit", "--bug", "101"])?;
  assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
  assert!(site.mirror_root().join("glusterfs").join(".git").exists());

  // A second run finds the fresh mirror and does not clone again
  let output = run_bugcheck(&site.work_dir(), &["-v", "audit", "--bug", "101"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(!stderr(&output).contains("cloning mirror"));

  Ok(())
}

#[test]
fn test_audit_with_relative_mirror_root() -> Result<()> {
  let (site, server) = setup()?;
  site.write_config_with_mirror_root(&server.url, "mirrors")?;

  let output = run_bugcheck(&site.work_dir(), &["audit", "--bug", "101", "--json"])?;
  assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["findings"][0]["explanation"], "Bug should be CLOSED, v3.5.0 contains a fix");
  assert!(report["unresolved"].as_array().is_some_and(|u| u.is_empty()));

  let mirrors = site.work_dir().join("mirrors");
  assert!(mirrors.join("glusterfs").join(".git").exists());
  assert!(!mirrors.join("mirrors").exists());

  Ok(())
}

#[test]
fn test_audit_without_findings_exits_zero() -> Result<()> {
  let site = TestSite::new()?;
  site.upstream("glusterfs")?;

  let server = StubServer::start(vec![
    ("/rest/bug?".to_string(), bug_list(&[bug(201, "NEW", &[]), bug(202, "ASSIGNED", &[])])),
    ("/changes/".to_string(), change_list(&[])),
  ])?;
  site.write_config(&server.url)?;

  let output = run_bugcheck(&site.work_dir(), &["audit"])?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(stdout(&output).contains("2 record(s) audited, all consistent"));

  Ok(())
}

#[test]
fn test_unknown_status_is_reported() -> Result<()> {
  let site = TestSite::new()?;
  site.upstream("glusterfs")?;

  let server = StubServer::start(vec![
    ("/rest/bug/301".to_string(), bug_list(&[bug(301, "RELEASE_PENDING", &[])])),
    ("/changes/".to_string(), change_list(&[])),
  ])?;
  site.write_config(&server.url)?;

  let output = run_bugcheck(&site.work_dir(), &["audit", "--bug", "301"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("Unknown tracker status 'RELEASE_PENDING'"));

  Ok(())
}

#[test]
fn test_unreachable_tracker_is_a_system_error() -> Result<()> {
  let site = TestSite::new()?;

  // Reserve a port, then free it so nothing is listening
  let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
  site.write_config(&format!("http://127.0.0.1:{}", port))?;

  let output = run_bugcheck(&site.work_dir(), &["audit"])?;
  assert_eq!(output.status.code(), Some(2));

  Ok(())
}
