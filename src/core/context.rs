//! Audit context - build once, pass everywhere
//!
//! Holds the loaded configuration and the per-run mirror store. The mirror
//! store is the only state shared between records; commands receive it by
//! reference through this context instead of reaching for a global.

use crate::core::config::AuditConfig;
use crate::core::error::AuditResult;
use crate::core::mirror::MirrorStore;
use crate::core::review::GerritClient;
use crate::core::tracker::BugzillaClient;
use crate::core::vcs::{SystemGit, VcsClient};
use std::path::Path;
use std::sync::Arc;

pub struct AuditContext {
  /// Loaded (or default) configuration
  pub config: Arc<AuditConfig>,

  /// Project mirrors, set up on first use
  pub mirrors: Arc<MirrorStore>,
}

impl AuditContext {
  /// Load configuration and prepare the mirror store backed by system git
  pub fn build(root: &Path, config_path: Option<&Path>) -> AuditResult<Self> {
    let config = AuditConfig::load(config_path, root)?;
    let vcs: Arc<dyn VcsClient> = Arc::new(SystemGit::new());
    Ok(Self::with_vcs(config, vcs))
  }

  pub fn with_vcs(config: AuditConfig, vcs: Arc<dyn VcsClient>) -> Self {
    let mirrors = Arc::new(MirrorStore::new(config.mirror_settings(), vcs));
    Self {
      config: Arc::new(config),
      mirrors,
    }
  }

  pub fn tracker(&self) -> AuditResult<BugzillaClient> {
    BugzillaClient::new(&self.config.tracker.url)
  }

  pub fn review(&self) -> AuditResult<GerritClient> {
    GerritClient::new(&self.config.review.url)
  }
}
