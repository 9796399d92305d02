//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use tempfile::TempDir;

/// Scratch area holding an upstream project repo, the mirror root and the config
pub struct TestSite {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestSite {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::create_dir_all(path.join("upstream"))?;
    std::fs::create_dir_all(path.join("work"))?;
    Ok(Self { _root: root, path })
  }

  /// Directory the CLI is run from
  pub fn work_dir(&self) -> PathBuf {
    self.path.join("work")
  }

  pub fn mirror_root(&self) -> PathBuf {
    self.path.join("mirrors")
  }

  /// Create an upstream repository for `project` with one initial commit
  pub fn upstream(&self, project: &str) -> Result<UpstreamRepo> {
    let path = self.path.join("upstream").join(project);
    std::fs::create_dir_all(&path)?;

    git(&path, &["init", "--initial-branch=master"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    let repo = UpstreamRepo { path };
    repo.commit("Initial import", None, "2014-04-01T09:00:00Z")?;
    Ok(repo)
  }

  /// Write bugcheck.toml pointing every source at the stub server and the upstream repos
  pub fn write_config(&self, server_url: &str) -> Result<PathBuf> {
    self.write_config_with_mirror_root(server_url, &self.mirror_root().display().to_string())
  }

  /// Like [`TestSite::write_config`], with `root` written verbatim as the mirror root
  pub fn write_config_with_mirror_root(&self, server_url: &str, root: &str) -> Result<PathBuf> {
    let config = format!(
      r#"[tracker]
url = '{url}'
product = 'GlusterFS'

[review]
url = '{url}'
clone_url = '{upstream}/{{project}}'

[mirrors]
root = '{mirrors}'
"#,
      url = server_url,
      upstream = self.path.join("upstream").display(),
      mirrors = root,
    );

    let path = self.work_dir().join("bugcheck.toml");
    std::fs::write(&path, config)?;
    Ok(path)
  }
}

/// An upstream project the mirrors are cloned from
pub struct UpstreamRepo {
  pub path: PathBuf,
}

impl UpstreamRepo {
  /// Commit a file change with a fixed date, optionally carrying a Change-Id trailer
  pub fn commit(&self, subject: &str, change_id: Option<&str>, date: &str) -> Result<String> {
    let file = self.path.join("CHANGES");
    let mut content = std::fs::read_to_string(&file).unwrap_or_default();
    content.push_str(subject);
    content.push('\n');
    std::fs::write(&file, content)?;

    let message = match change_id {
      Some(id) => format!("{}\n\nChange-Id: {}\n", subject, id),
      None => format!("{}\n", subject),
    };

    git(&self.path, &["add", "."])?;
    let output = Command::new("git")
      .current_dir(&self.path)
      .args(["commit", "-q", "-m", &message])
      .env("GIT_AUTHOR_DATE", date)
      .env("GIT_COMMITTER_DATE", date)
      .output()
      .context("Failed to run git commit")?;
    if !output.status.success() {
      anyhow::bail!("git commit failed: {}", String::from_utf8_lossy(&output.stderr));
    }

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the bugcheck CLI; non-zero exits are returned, not turned into errors
pub fn run_bugcheck(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_bugcheck");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run bugcheck")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

/// Canned HTTP responder standing in for Bugzilla and Gerrit
///
/// Each route is a substring matched against the percent-decoded request
/// target; the first match answers with its body, anything else gets a 404.
pub struct StubServer {
  pub url: String,
}

impl StubServer {
  pub fn start(routes: Vec<(String, String)>) -> Result<Self> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}", listener.local_addr()?);
    let routes = Arc::new(routes);

    std::thread::spawn(move || {
      for stream in listener.incoming().flatten() {
        let routes = Arc::clone(&routes);
        std::thread::spawn(move || {
          let _ = respond(stream, &routes);
        });
      }
    });

    Ok(Self { url })
  }
}

fn respond(mut stream: TcpStream, routes: &[(String, String)]) -> std::io::Result<()> {
  let mut reader = BufReader::new(stream.try_clone()?);
  let mut request_line = String::new();
  reader.read_line(&mut request_line)?;

  // Drain headers; only GET requests are expected
  loop {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 || line == "\r\n" || line == "\n" {
      break;
    }
  }

  let target = decode(request_line.split_whitespace().nth(1).unwrap_or("/"));
  let (status, body) = match routes.iter().find(|(key, _)| target.contains(key.as_str())) {
    Some((_, body)) => ("200 OK", body.as_str()),
    None => ("404 Not Found", "not found"),
  };

  write!(
    stream,
    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
    status,
    body.len(),
    body
  )?;
  stream.flush()
}

fn decode(target: &str) -> String {
  let bytes = target.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      b'+' => out.push(b' '),
      b'%' if i + 2 < bytes.len() => {
        match u8::from_str_radix(&target[i + 1..i + 3], 16) {
          Ok(byte) => {
            out.push(byte);
            i += 2;
          }
          Err(_) => out.push(b'%'),
        }
      }
      other => out.push(other),
    }
    i += 1;
  }

  String::from_utf8_lossy(&out).to_string()
}

/// Bugzilla `/rest/bug` body
pub fn bug_list(bugs: &[serde_json::Value]) -> String {
  serde_json::json!({ "bugs": bugs }).to_string()
}

pub fn bug(id: u64, status: &str, keywords: &[&str]) -> serde_json::Value {
  serde_json::json!({
    "id": id,
    "status": status,
    "summary": format!("bug {}", id),
    "version": ["mainline"],
    "assigned_to": "dev@example.com",
    "keywords": keywords,
    "component": ["core"],
    "depends_on": [],
  })
}

/// Gerrit `/changes/` body, including the leading guard line
pub fn change_list(changes: &[serde_json::Value]) -> String {
  format!(")]}}'\n{}\n", serde_json::Value::Array(changes.to_vec()))
}

pub fn change(change_id: &str, status: &str, subject: &str) -> serde_json::Value {
  serde_json::json!({
    "project": "glusterfs",
    "branch": "master",
    "change_id": change_id,
    "subject": subject,
    "status": status,
    "created": "2014-04-06 12:00:00.000000000",
  })
}
