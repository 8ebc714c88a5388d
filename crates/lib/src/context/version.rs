//! Toolchain and language version providers.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::hasher::HashError;

use super::{LanguageVersionProvider, ToolchainVersionProvider};

/// A version known up front, e.g. passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVersion(pub String);

impl StaticVersion {
  pub fn new(version: impl Into<String>) -> Self {
    Self(version.into())
  }

  fn get(&self, tool: &str) -> Result<String, HashError> {
    let version = self.0.trim();
    if version.is_empty() {
      return Err(HashError::VersionUnavailable {
        tool: tool.to_string(),
        message: "empty version string".to_string(),
      });
    }
    Ok(version.to_string())
  }
}

#[async_trait]
impl ToolchainVersionProvider for StaticVersion {
  async fn toolchain_version(&self) -> Result<String, HashError> {
    self.get("toolchain")
  }
}

#[async_trait]
impl LanguageVersionProvider for StaticVersion {
  async fn language_version(&self) -> Result<String, HashError> {
    self.get("language")
  }
}

/// Probes a version by running a command and reading its first output line.
///
/// For example `xcodebuild -version` prints `Xcode 15.0` first, and
/// `swift --version` prints the compiler banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVersion {
  pub program: String,
  pub args: Vec<String>,
}

impl CommandVersion {
  pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
    Self {
      program: program.into(),
      args: args.into_iter().map(Into::into).collect(),
    }
  }

  /// Build from an argv list; `None` when the list is empty.
  pub fn from_argv(argv: &[String]) -> Option<Self> {
    let (program, args) = argv.split_first()?;
    Some(Self::new(program.clone(), args.iter().cloned()))
  }

  async fn probe(&self, tool: &str) -> Result<String, HashError> {
    let unavailable = |message: String| HashError::VersionUnavailable {
      tool: tool.to_string(),
      message,
    };

    debug!(tool, program = %self.program, args = ?self.args, "probing version");

    let output = Command::new(&self.program)
      .args(&self.args)
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|e| unavailable(format!("failed to run {}: {}", self.program, e)))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "version probe stderr");
      }
      return Err(unavailable(format!(
        "{} exited with code {:?}",
        self.program,
        output.status.code()
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
      .lines()
      .map(str::trim)
      .find(|line| !line.is_empty())
      .map(str::to_string)
      .ok_or_else(|| unavailable(format!("{} printed no version", self.program)))
  }
}

#[async_trait]
impl ToolchainVersionProvider for CommandVersion {
  async fn toolchain_version(&self) -> Result<String, HashError> {
    self.probe("toolchain").await
  }
}

#[async_trait]
impl LanguageVersionProvider for CommandVersion {
  async fn language_version(&self) -> Result<String, HashError> {
    self.probe("language").await
  }
}
