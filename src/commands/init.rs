use std::path::Path;

use crate::core::config::AuditConfig;
use crate::core::error::{AuditError, AuditResult};

/// Write a default bugcheck.toml into `dir`
pub fn run_init(dir: &Path, force: bool) -> AuditResult<()> {
  if let Some(existing) = AuditConfig::find_config_path(dir)
    && !force
  {
    return Err(AuditError::with_help(
      format!("Configuration already exists at {}", existing.display()),
      "Use --force to overwrite it with the defaults",
    ));
  }

  let path = AuditConfig::default().save(dir)?;

  println!("✅ Wrote default configuration to {}", path.display());
  println!("\n📝 Next steps:");
  println!("   1. Point [tracker] and [review] at your Bugzilla and Gerrit instances");
  println!("   2. Choose a [mirrors] root with room for one clone per project");
  println!("   3. Run `bugcheck audit`");

  Ok(())
}
