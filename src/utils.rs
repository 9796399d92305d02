//! Utility functions for remote URLs and mirror paths

use crate::core::error::{AuditError, AuditResult, ResultExt};
use std::path::{Component, Path, PathBuf};

/// Check if a path is a local filesystem path (not a remote URL)
///
/// Returns true for:
/// - Absolute paths on Unix: /path/to/repo
/// - Absolute paths on Windows: C:\path\to\repo or C:/path/to/repo
/// - Relative paths: ./path or ../path
///
/// Returns false for:
/// - SSH URLs: git@review.example.org:project.git
/// - HTTPS URLs: <https://review.example.org/project>
pub fn is_local_path(path: &str) -> bool {
  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/), checked before the URL test since it contains ':'
  if path.len() >= 3 {
    let bytes = path.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
      return true;
    }
  }

  if path.starts_with('/') && !path.contains("://") && !path.contains('@') {
    return true;
  }

  if Path::new(path).is_absolute() {
    return true;
  }

  false
}

/// Check if a URL looks like something `git clone` accepts
pub fn is_valid_remote_url(url: &str) -> bool {
  url.starts_with("git@")
    || url.starts_with("ssh://")
    || url.starts_with("git://")
    || url.starts_with("https://")
    || url.starts_with("http://")
    || is_local_path(url)
}

/// Substitute `{key}` in a template
pub fn expand_template(template: &str, key: &str, value: &str) -> String {
  template.replace(&format!("{{{}}}", key), value)
}

/// Absolute directory of a project's mirror below `root`
///
/// Project names may be nested (`gluster/glusterfs`), but must stay inside the
/// root: absolute names and `..` components are rejected. A relative root is
/// taken relative to the current directory.
pub fn mirror_path(root: &Path, project: &str) -> AuditResult<PathBuf> {
  let relative = Path::new(project);
  let escapes = project.is_empty()
    || relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_)));

  if escapes {
    return Err(AuditError::message(format!(
      "Refusing to mirror project '{}': name must be a relative path without '..'",
      project
    )));
  }

  let path = root.join(relative);
  std::path::absolute(&path).with_context(|| format!("Failed to resolve mirror path {}", path.display()))
}
