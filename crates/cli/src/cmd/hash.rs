//! Implementation of the `cachekey hash` command.
//!
//! This command loads a graph manifest, computes the content hash of every
//! cacheable node and prints the resulting map.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use cachekey_lib::graph::load_graph;
use cachekey_lib::{
  CommandVersion, FileContentHasher, GraphConfigurationResolver, GraphContentHasher, HashError, HasherConfig,
  LanguageVersionProvider, Platform, StaticVersion, ToolchainVersionProvider,
};

use crate::output::{OutputFormat, format_elapsed, print_json, print_success};

#[derive(Debug, Args)]
pub struct HashArgs {
  /// Path to the graph manifest (JSON)
  pub manifest: PathBuf,

  /// Build configuration to hash for
  #[arg(short, long)]
  pub configuration: Option<String>,

  /// Configuration used when none is requested
  #[arg(long)]
  pub default_configuration: Option<String>,

  /// Target name to leave out (repeatable)
  #[arg(short = 'x', long = "exclude")]
  pub excluded: Vec<String>,

  /// Only publish nodes building for this platform (e.g. aarch64-ios)
  #[arg(short, long, value_parser = parse_platform)]
  pub destination: Option<Platform>,

  /// Toolchain version, instead of running the manifest's probe
  #[arg(long)]
  pub toolchain_version: Option<String>,

  /// Language version, instead of running the manifest's probe
  #[arg(long)]
  pub language_version: Option<String>,

  /// Maximum number of nodes hashed concurrently
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  pub output: OutputFormat,
}

fn parse_platform(value: &str) -> Result<Platform, String> {
  value.parse()
}

pub fn cmd_hash(args: &HashArgs) -> Result<()> {
  let loaded = load_graph(&args.manifest)
    .with_context(|| format!("Failed to load graph manifest: {}", args.manifest.display()))?;

  let toolchain = toolchain_provider(args.toolchain_version.as_deref(), loaded.manifest.toolchain_probe.as_deref())?;
  let language = language_provider(args.language_version.as_deref(), loaded.manifest.language_probe.as_deref())?;

  let mut config = HasherConfig::default();
  if let Some(jobs) = args.jobs {
    config.parallelism = jobs.max(1);
  }
  debug!(parallelism = config.parallelism, "hasher configuration");

  let hasher = GraphContentHasher::new(
    Arc::new(FileContentHasher),
    Arc::new(GraphConfigurationResolver),
    toolchain,
    language,
  )
  .with_config(config);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();

  let hashes = rt
    .block_on(hasher.content_hashes(
      &loaded.graph,
      args.configuration.as_deref(),
      args.default_configuration.as_deref(),
      &args.excluded,
      args.destination,
    ))
    .context("Failed to compute content hashes")?;

  if args.output.is_json() {
    return print_json(&hashes);
  }

  for (node, digest) in hashes.iter() {
    println!("{}  {}", digest, node);
  }
  print_success(&format!(
    "Hashed {} node(s) in {}",
    hashes.len(),
    format_elapsed(started.elapsed())
  ));

  Ok(())
}

/// An explicit version wins over the manifest's probe command.
fn toolchain_provider(flag: Option<&str>, probe: Option<&[String]>) -> Result<Arc<dyn ToolchainVersionProvider>> {
  if let Some(version) = flag {
    return Ok(Arc::new(StaticVersion::new(version)));
  }
  match probe.and_then(CommandVersion::from_argv) {
    Some(command) => Ok(Arc::new(command)),
    None => Err(not_configured("toolchain", "--toolchain-version", "toolchain_probe")),
  }
}

fn language_provider(flag: Option<&str>, probe: Option<&[String]>) -> Result<Arc<dyn LanguageVersionProvider>> {
  if let Some(version) = flag {
    return Ok(Arc::new(StaticVersion::new(version)));
  }
  match probe.and_then(CommandVersion::from_argv) {
    Some(command) => Ok(Arc::new(command)),
    None => Err(not_configured("language", "--language-version", "language_probe")),
  }
}

fn not_configured(tool: &str, flag: &str, key: &str) -> anyhow::Error {
  HashError::VersionUnavailable {
    tool: tool.to_string(),
    message: format!("pass {} or set \"{}\" in the manifest", flag, key),
  }
  .into()
}
