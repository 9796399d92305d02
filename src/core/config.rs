use crate::core::error::{AuditError, AuditResult, ConfigError, ResultExt};
use crate::core::mirror::MirrorSettings;
use crate::core::status::{BugStatus, OPEN_STATUSES};
use crate::core::tracker::{RecordFilter, TrackerQuery};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for bugcheck
/// Searched in order: bugcheck.toml, .bugcheck.toml, .config/bugcheck.toml
/// Every field has a default, so the file is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
  #[serde(default)]
  pub tracker: TrackerConfig,
  #[serde(default)]
  pub review: ReviewConfig,
  #[serde(default)]
  pub mirrors: MirrorConfig,
}

/// Issue tracker (Bugzilla) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
  /// Base URL of the Bugzilla instance
  #[serde(default = "default_tracker_url")]
  pub url: String,

  /// Product whose records are audited
  #[serde(default = "default_product")]
  pub product: String,

  /// Statuses to fetch (default: every status before CLOSED)
  #[serde(default = "default_statuses")]
  pub statuses: Vec<BugStatus>,

  /// Records with any of these keywords are skipped (default: ["Tracking"])
  #[serde(default = "default_exclude_keywords")]
  pub exclude_keywords: Vec<String>,

  /// Records in any of these components are skipped
  #[serde(default)]
  pub exclude_components: Vec<String>,
}

fn default_tracker_url() -> String {
  "https://bugzilla.redhat.com".to_string()
}

fn default_product() -> String {
  "GlusterFS".to_string()
}

fn default_statuses() -> Vec<BugStatus> {
  OPEN_STATUSES.to_vec()
}

fn default_exclude_keywords() -> Vec<String> {
  vec!["Tracking".to_string()]
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self {
      url: default_tracker_url(),
      product: default_product(),
      statuses: default_statuses(),
      exclude_keywords: default_exclude_keywords(),
      exclude_components: Vec::new(),
    }
  }
}

/// Code review (Gerrit) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
  /// Base URL of the Gerrit instance
  #[serde(default = "default_review_url")]
  pub url: String,

  /// Topic under which changes for a record are posted (`{bug}` = record id)
  #[serde(default = "default_topic")]
  pub topic: String,

  /// Clone URL template (`{project}` = review project); default: `<url>/{project}`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub clone_url: Option<String>,
}

fn default_review_url() -> String {
  "https://review.gluster.org".to_string()
}

fn default_topic() -> String {
  "bug-{bug}".to_string()
}

impl Default for ReviewConfig {
  fn default() -> Self {
    Self {
      url: default_review_url(),
      topic: default_topic(),
      clone_url: None,
    }
  }
}

impl ReviewConfig {
  pub fn clone_url(&self) -> String {
    self
      .clone_url
      .clone()
      .unwrap_or_else(|| format!("{}/{{project}}", self.url.trim_end_matches('/')))
  }
}

/// Local mirror settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
  /// Directory holding one mirror per review project
  #[serde(default = "default_mirror_root")]
  pub root: PathBuf,

  /// Mirrors last fetched longer ago than this are refreshed
  #[serde(default = "default_refresh_hours")]
  pub refresh_hours: u64,
}

fn default_mirror_root() -> PathBuf {
  PathBuf::from("/tmp/gluster.org")
}

fn default_refresh_hours() -> u64 {
  12
}

impl Default for MirrorConfig {
  fn default() -> Self {
    Self {
      root: default_mirror_root(),
      refresh_hours: default_refresh_hours(),
    }
  }
}

impl AuditConfig {
  /// Find config file in search order: bugcheck.toml, .bugcheck.toml, .config/bugcheck.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("bugcheck.toml"),
      path.join(".bugcheck.toml"),
      path.join(".config").join("bugcheck.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from an explicit file, or search `dir`; defaults when nothing is found
  pub fn load(explicit: Option<&Path>, dir: &Path) -> AuditResult<Self> {
    let config_path = match explicit {
      Some(path) if !path.exists() => {
        return Err(AuditError::Config(ConfigError::NotFound {
          path: path.to_path_buf(),
        }));
      }
      Some(path) => path.to_path_buf(),
      None => match Self::find_config_path(dir) {
        Some(path) => path,
        None => return Ok(Self::default()),
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    Ok(config)
  }

  /// Parse and validate TOML content
  pub fn parse(content: &str) -> AuditResult<Self> {
    let config: AuditConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Save config to bugcheck.toml in `dir`
  pub fn save(&self, dir: &Path) -> AuditResult<PathBuf> {
    let config_path = dir.join("bugcheck.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  pub fn validate(&self) -> AuditResult<()> {
    for (field, url) in [("tracker.url", &self.tracker.url), ("review.url", &self.review.url)] {
      if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(invalid(field, format!("'{}' is not an http(s) URL", url)));
      }
    }

    if self.tracker.statuses.is_empty() {
      return Err(invalid("tracker.statuses", "at least one status is required".to_string()));
    }

    if !self.review.topic.contains("{bug}") {
      return Err(invalid("review.topic", "template must contain {bug}".to_string()));
    }

    let clone_url = self.review.clone_url();
    if !clone_url.contains("{project}") {
      return Err(invalid("review.clone_url", "template must contain {project}".to_string()));
    }
    if !utils::is_valid_remote_url(&clone_url) {
      return Err(invalid(
        "review.clone_url",
        format!("'{}' is neither a git URL nor a local path", clone_url),
      ));
    }

    if self.mirrors.refresh_hours == 0 {
      return Err(invalid("mirrors.refresh_hours", "must be greater than zero".to_string()));
    }

    Ok(())
  }

  pub fn tracker_query(&self) -> TrackerQuery {
    TrackerQuery {
      product: self.tracker.product.clone(),
      statuses: self.tracker.statuses.clone(),
    }
  }

  pub fn record_filter(&self) -> RecordFilter {
    RecordFilter {
      exclude_keywords: self.tracker.exclude_keywords.clone(),
      exclude_components: self.tracker.exclude_components.clone(),
    }
  }

  pub fn mirror_settings(&self) -> MirrorSettings {
    MirrorSettings {
      root: self.mirrors.root.clone(),
      clone_url: self.review.clone_url(),
      max_age: Duration::from_secs(self.mirrors.refresh_hours * 3600),
    }
  }
}

fn invalid(field: &str, reason: String) -> AuditError {
  AuditError::Config(ConfigError::Invalid {
    field: field.to_string(),
    reason,
  })
}
