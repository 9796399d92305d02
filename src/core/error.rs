//! Error types for bugcheck with contextual messages and exit codes
//!
//! One error enum for the whole tool, split into categories so that callers
//! can tell a tooling failure (git, network) from bad input (an unknown
//! tracker status, a malformed payload). Inconsistent records are not errors;
//! they are the audit's output and live in `core::reconcile`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for bugcheck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, unknown status)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// The audit ran and found inconsistent records or unresolved changes
  Findings = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for bugcheck
#[derive(Debug)]
pub enum AuditError {
  /// Configuration errors
  Config(ConfigError),

  /// Git and mirror errors
  Git(GitError),

  /// Tracker status outside the known lifecycle
  Status(StatusError),

  /// Tracker or review server errors
  Fetch(FetchError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl AuditError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    AuditError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    AuditError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      AuditError::Message { message, context, help } => AuditError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      AuditError::Io(e) => AuditError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      AuditError::Config(_) => ExitCode::User,
      AuditError::Git(_) => ExitCode::System,
      AuditError::Status(_) => ExitCode::User,
      AuditError::Fetch(_) => ExitCode::System,
      AuditError::Io(_) => ExitCode::System,
      AuditError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      AuditError::Config(e) => e.help_message(),
      AuditError::Git(e) => e.help_message(),
      AuditError::Fetch(e) => e.help_message(),
      AuditError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for AuditError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AuditError::Config(e) => write!(f, "{}", e),
      AuditError::Git(e) => write!(f, "{}", e),
      AuditError::Status(e) => write!(f, "{}", e),
      AuditError::Fetch(e) => write!(f, "{}", e),
      AuditError::Io(e) => write!(f, "I/O error: {}", e),
      AuditError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for AuditError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      AuditError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for AuditError {
  fn from(err: io::Error) -> Self {
    AuditError::Io(err)
  }
}

impl From<String> for AuditError {
  fn from(msg: String) -> Self {
    AuditError::message(msg)
  }
}

impl From<&str> for AuditError {
  fn from(msg: &str) -> Self {
    AuditError::message(msg)
  }
}

impl From<toml_edit::de::Error> for AuditError {
  fn from(err: toml_edit::de::Error) -> Self {
    AuditError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for AuditError {
  fn from(err: toml_edit::ser::Error) -> Self {
    AuditError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for AuditError {
  fn from(err: serde_json::Error) -> Self {
    AuditError::message(format!("JSON error: {}", err))
  }
}

impl From<reqwest::Error> for AuditError {
  fn from(err: reqwest::Error) -> Self {
    let url = err.url().map(|u| u.to_string()).unwrap_or_else(|| "<unknown>".to_string());
    AuditError::Fetch(FetchError::Http {
      url,
      reason: err.to_string(),
    })
  }
}

impl From<StatusError> for AuditError {
  fn from(err: StatusError) -> Self {
    AuditError::Status(err)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// Field present but unusable
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `bugcheck init` to create a configuration file.".to_string()),
      ConfigError::Invalid { field, .. } => Some(format!("Fix `{}` in bugcheck.toml or remove it to use the default.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid configuration for `{}`: {}", field, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed (non-zero exit or could not be spawned)
  CommandFailed { command: String, stderr: String },

  /// Mirror for a project could not be created or opened
  MirrorUnavailable { project: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::MirrorUnavailable { .. } => {
        Some("Check network access to the review server and the `[mirrors]` root directory.".to_string())
      }
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::MirrorUnavailable { project, reason } => {
        write!(f, "Mirror for project '{}' is unavailable: {}", project, reason.trim_end())
      }
    }
  }
}

/// A tracker status outside the fixed lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
  Unknown { status: String },
}

impl fmt::Display for StatusError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StatusError::Unknown { status } => write!(f, "Unknown tracker status '{}'", status),
    }
  }
}

/// Tracker/review server errors
#[derive(Debug)]
pub enum FetchError {
  /// Transport failure or non-success HTTP status
  Http { url: String, reason: String },

  /// Response arrived but does not have the expected shape
  Malformed { source_name: String, reason: String },
}

impl FetchError {
  fn help_message(&self) -> Option<String> {
    match self {
      FetchError::Http { .. } => Some("Check the server URL in bugcheck.toml and your network access.".to_string()),
      FetchError::Malformed { .. } => None,
    }
  }
}

impl fmt::Display for FetchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FetchError::Http { url, reason } => write!(f, "Request to {} failed: {}", url, reason),
      FetchError::Malformed { source_name, reason } => {
        write!(f, "Malformed response from {}: {}", source_name, reason)
      }
    }
  }
}

/// Result type alias for bugcheck
pub type AuditResult<T> = Result<T, AuditError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> AuditResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> AuditResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<AuditError>,
{
  fn context(self, ctx: impl Into<String>) -> AuditResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> AuditResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &AuditError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
