//! Tracing initialisation
//!
//! Diagnostics go to stderr through `tracing`; the audit report itself is
//! printed to stdout by the commands.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over `info`.
/// Only the first call in a process has any effect.
pub fn init(verbose: bool, json: bool) {
  let level = if verbose { Level::DEBUG } else { Level::INFO };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_writer(std::io::stderr).with_target(false).json())
      .try_init()
      .ok();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
      .try_init()
      .ok();
  }
}
