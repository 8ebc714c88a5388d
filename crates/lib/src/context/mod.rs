//! Run context for a hashing invocation.
//!
//! The run context gathers the values that affect every node digest: the
//! effective build configuration, the toolchain and language versions, and
//! the optional destination platform. Each value comes from an injected
//! collaborator so production probes and test doubles are interchangeable.

pub mod resolver;
pub mod version;

use async_trait::async_trait;
use tracing::debug;

use crate::graph::Graph;
use crate::hasher::HashError;
use crate::platform::Platform;

pub use resolver::GraphConfigurationResolver;
pub use version::{CommandVersion, StaticVersion};

/// Resolves the build configuration to hash with when none was requested.
#[async_trait]
pub trait ConfigurationResolver: Send + Sync {
  /// Returns the configuration name, or `ConfigurationResolution` if none
  /// can be determined for `graph`.
  async fn resolve_default_configuration(
    &self,
    requested: Option<&str>,
    configuration_override: Option<&str>,
    graph: &Graph,
  ) -> Result<String, HashError>;
}

/// Reports the host toolchain version (e.g. the IDE or build host).
#[async_trait]
pub trait ToolchainVersionProvider: Send + Sync {
  async fn toolchain_version(&self) -> Result<String, HashError>;
}

/// Reports the source-language version.
#[async_trait]
pub trait LanguageVersionProvider: Send + Sync {
  async fn language_version(&self) -> Result<String, HashError>;
}

/// Immutable per-invocation inputs shared by every node digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
  pub configuration: String,
  pub toolchain_version: String,
  pub language_version: String,
  pub destination: Option<Platform>,
}

impl RunContext {
  /// Resolve the run context from its collaborators.
  ///
  /// The resolver always decides the configuration, so it can reject a
  /// requested name no project declares. Both versions are fetched
  /// concurrently and either failure is fatal.
  pub async fn resolve(
    graph: &Graph,
    requested: Option<&str>,
    configuration_override: Option<&str>,
    destination: Option<Platform>,
    resolver: &dyn ConfigurationResolver,
    toolchain: &dyn ToolchainVersionProvider,
    language: &dyn LanguageVersionProvider,
  ) -> Result<Self, HashError> {
    let configuration = resolver
      .resolve_default_configuration(requested, configuration_override, graph)
      .await?;

    let (toolchain_version, language_version) =
      tokio::try_join!(toolchain.toolchain_version(), language.language_version())?;

    debug!(
      configuration = %configuration,
      toolchain = %toolchain_version,
      language = %language_version,
      destination = ?destination.map(|d| d.triple()),
      "resolved run context"
    );

    Ok(Self {
      configuration,
      toolchain_version,
      language_version,
      destination,
    })
  }

  /// Strings mixed into every node digest, in a fixed order:
  /// configuration, toolchain version, language version, then destination.
  pub fn additional_inputs(&self) -> Vec<String> {
    let mut inputs = vec![
      self.configuration.clone(),
      self.toolchain_version.clone(),
      self.language_version.clone(),
    ];
    if let Some(destination) = &self.destination {
      inputs.push(destination.triple());
    }
    inputs
  }
}
