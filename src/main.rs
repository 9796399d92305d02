mod commands;
mod core;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use crate::core::context::AuditContext;
use crate::core::error::{AuditError, print_error};
use std::path::PathBuf;

/// Audit bug tracker statuses against code review and release history
#[derive(Parser)]
#[command(name = "bugcheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Configuration file (default: search bugcheck.toml, .bugcheck.toml, .config/bugcheck.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON lines on stderr
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Audit open tracker records against their review changes
  Audit {
    /// Audit only these records
    #[arg(long = "bug", value_name = "ID")]
    bugs: Vec<u64>,
    /// Audit every record blocking this tracker record
    #[arg(long, value_name = "ID", conflicts_with = "bugs")]
    tracker: Option<u64>,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Resolve one merged change to its commit, earliest tag and implied status
  Resolve {
    /// Review project (also the mirror name)
    #[arg(long)]
    project: String,
    /// Branch the change was merged into
    #[arg(long)]
    branch: String,
    /// Change-Id trailer value
    #[arg(long)]
    change_id: String,
    /// Only search history after this time (YYYY-MM-DD, RFC 3339, or review timestamp)
    #[arg(long)]
    after: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Classify release tag names
  Tag {
    /// Tag names
    #[arg(required = true)]
    tags: Vec<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Write a default bugcheck.toml in the current directory
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  ui::logging::init(cli.verbose, cli.log_json);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Only commands that touch mirrors load the configuration
  let config = cli.config.as_deref();
  let result = match cli.command {
    Commands::Audit { bugs, tracker, json } => {
      AuditContext::build(&root, config).and_then(|ctx| commands::run_audit(&ctx, bugs, tracker, json))
    }
    Commands::Resolve {
      project,
      branch,
      change_id,
      after,
      json,
    } => AuditContext::build(&root, config)
      .and_then(|ctx| commands::run_resolve(&ctx, project, branch, change_id, after, json)),
    Commands::Tag { tags, json } => commands::run_tag(tags, json),
    Commands::Init { force } => commands::run_init(&root, force),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: AuditError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
