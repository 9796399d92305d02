//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;

  let output = run_bugcheck(temp.path(), &["init"])?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  let config = std::fs::read_to_string(temp.path().join("bugcheck.toml"))?;
  assert!(config.contains("[tracker]"));
  assert!(config.contains("[review]"));
  assert!(config.contains("[mirrors]"));
  assert!(config.contains("GlusterFS"));
  assert!(config.contains("Tracking"));

  Ok(())
}

#[test]
fn test_init_refuses_existing_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  std::fs::write(temp.path().join("bugcheck.toml"), "[tracker]\nproduct = 'custom'\n")?;

  let output = run_bugcheck(temp.path(), &["init"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("--force"));
  assert!(std::fs::read_to_string(temp.path().join("bugcheck.toml"))?.contains("custom"));

  let output = run_bugcheck(temp.path(), &["init", "--force"])?;
  assert!(output.status.success());
  assert!(std::fs::read_to_string(temp.path().join("bugcheck.toml"))?.contains("GlusterFS"));

  Ok(())
}

#[test]
fn test_invalid_config_is_a_user_error() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  std::fs::write(temp.path().join("bugcheck.toml"), "[tracker]\nstatuses = ['RELEASE_PENDING']\n")?;

  let output = run_bugcheck(temp.path(), &["audit"])?;
  assert_eq!(output.status.code(), Some(1));

  let output = run_bugcheck(temp.path(), &["--config", "missing.toml", "audit"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("missing.toml"));

  Ok(())
}
