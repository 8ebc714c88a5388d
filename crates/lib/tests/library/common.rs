//! Shared collaborators and graph builders for library integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use cachekey_lib::graph::BuildVariant;
use cachekey_lib::util::hash::hash_bytes;
use cachekey_lib::{
  ConfigurationResolver, Digest, Graph, GraphContentHasher, HashError, HasherConfig, LanguageVersionProvider,
  LeafHasher, Node, NodeId, ProductKind, Project, ToolchainVersionProvider,
};

pub const PROJECT_PATH: &str = "/Project/Path";

pub fn id(name: &str) -> NodeId {
  NodeId::new(PROJECT_PATH, name)
}

pub fn target(name: &str, product: ProductKind) -> Node {
  Node::new(PROJECT_PATH, name, product)
}

pub fn project() -> Project {
  Project::new("P", PROJECT_PATH).with_configuration("Debug", BuildVariant::Debug)
}

/// Leaf hasher with per-node content overrides and a call log.
#[derive(Default)]
pub struct MockLeafHasher {
  content: Mutex<HashMap<String, String>>,
  failing: Mutex<Option<String>>,
  calls: Mutex<Vec<NodeId>>,
}

impl MockLeafHasher {
  pub fn set_content(&self, name: &str, content: &str) {
    self.content.lock().unwrap().insert(name.to_string(), content.to_string());
  }

  pub fn fail_on(&self, name: &str) {
    *self.failing.lock().unwrap() = Some(name.to_string());
  }

  pub fn calls_for(&self, id: &NodeId) -> usize {
    self.calls.lock().unwrap().iter().filter(|c| *c == id).count()
  }

  pub fn called(&self) -> Vec<NodeId> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl LeafHasher for MockLeafHasher {
  async fn hash_leaf(&self, node: &Node) -> Result<Digest, HashError> {
    self.calls.lock().unwrap().push(node.id.clone());

    if self.failing.lock().unwrap().as_deref() == Some(node.name()) {
      return Err(HashError::LeafHash {
        node: node.id.clone(),
        message: "unreadable file".to_string(),
      });
    }

    let content = self
      .content
      .lock()
      .unwrap()
      .get(node.name())
      .cloned()
      .unwrap_or_else(|| node.name().to_string());
    Ok(hash_bytes(content.as_bytes()))
  }
}

/// Configuration resolver accepting any requested name, falling back to a
/// fixed default.
pub struct MockConfiguration(pub Option<String>);

#[async_trait]
impl ConfigurationResolver for MockConfiguration {
  async fn resolve_default_configuration(
    &self,
    requested: Option<&str>,
    configuration_override: Option<&str>,
    _graph: &Graph,
  ) -> Result<String, HashError> {
    requested
      .or(configuration_override)
      .map(str::to_string)
      .or_else(|| self.0.clone())
      .ok_or_else(|| HashError::ConfigurationResolution("no default configuration".to_string()))
  }
}

/// Version provider returning a fixed answer, or failing when `None`.
pub struct MockVersion(pub Option<String>);

impl MockVersion {
  pub fn of(version: &str) -> Self {
    Self(Some(version.to_string()))
  }

  fn get(&self, tool: &str) -> Result<String, HashError> {
    self.0.clone().ok_or_else(|| HashError::VersionUnavailable {
      tool: tool.to_string(),
      message: "not installed".to_string(),
    })
  }
}

#[async_trait]
impl ToolchainVersionProvider for MockVersion {
  async fn toolchain_version(&self) -> Result<String, HashError> {
    self.get("toolchain")
  }
}

#[async_trait]
impl LanguageVersionProvider for MockVersion {
  async fn language_version(&self) -> Result<String, HashError> {
    self.get("language")
  }
}

/// Subject wired with mocks: default configuration "Debug", toolchain
/// "15.0.0", language "5.10.0".
pub fn subject(leaf: Arc<MockLeafHasher>) -> GraphContentHasher {
  subject_with(leaf, MockConfiguration(Some("Debug".to_string())), MockVersion::of("15.0.0"), MockVersion::of("5.10.0"))
}

pub fn subject_with(
  leaf: Arc<MockLeafHasher>,
  configuration: MockConfiguration,
  toolchain: MockVersion,
  language: MockVersion,
) -> GraphContentHasher {
  GraphContentHasher::new(leaf, Arc::new(configuration), Arc::new(toolchain), Arc::new(language))
    .with_config(HasherConfig { parallelism: 4 })
}

pub fn no_exclusions() -> Vec<String> {
  Vec::new()
}
