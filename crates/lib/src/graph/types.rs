//! Core graph types: projects, nodes and their identities.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Platform;

/// Identity of a node: the owning project's root path plus the node name.
///
/// Ordering is by project path, then name. The hash engine relies on this
/// ordering when combining dependency digests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
  pub project: PathBuf,
  pub name: String,
}

impl NodeId {
  pub fn new(project: impl Into<PathBuf>, name: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.project.display(), self.name)
  }
}

/// What a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
  Executable,
  Library,
  Framework,
  /// A bundle carrying resources, often synthesized for another node.
  ResourceBundle,
  TestBundle,
  /// Metadata or grouping node with no artifact of its own.
  Other,
}

impl ProductKind {
  /// Whether nodes of this kind produce a cacheable artifact.
  pub fn is_hashable(&self) -> bool {
    !matches!(self, ProductKind::Other)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ProductKind::Executable => "executable",
      ProductKind::Library => "library",
      ProductKind::Framework => "framework",
      ProductKind::ResourceBundle => "resource_bundle",
      ProductKind::TestBundle => "test_bundle",
      ProductKind::Other => "other",
    }
  }
}

/// Build variant of a named configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildVariant {
  Debug,
  Release,
}

/// A project groups nodes under a common root path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub name: String,
  pub path: PathBuf,
  /// Declared build configurations, keyed by name.
  #[serde(default)]
  pub configurations: BTreeMap<String, BuildVariant>,
}

impl Project {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      configurations: BTreeMap::new(),
    }
  }

  pub fn with_configuration(mut self, name: &str, variant: BuildVariant) -> Self {
    self.configurations.insert(name.to_string(), variant);
    self
  }

  /// Name of the resource bundle synthesized for one of this project's nodes.
  pub fn bundle_name(&self, node_name: &str) -> String {
    format!("{}_{}", self.name, node_name)
  }
}

/// A buildable unit in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: NodeId,
  pub product: ProductKind,
  /// Direct dependencies in declaration order.
  pub dependencies: Vec<NodeId>,
  /// Source paths relative to the project root.
  pub sources: Vec<PathBuf>,
  /// Resource paths relative to the project root. May name directories.
  pub resources: Vec<PathBuf>,
  pub settings: BTreeMap<String, String>,
  pub platform: Option<Platform>,
}

impl Node {
  pub fn new(project: impl Into<PathBuf>, name: impl Into<String>, product: ProductKind) -> Self {
    Self {
      id: NodeId::new(project, name),
      product,
      dependencies: Vec::new(),
      sources: Vec::new(),
      resources: Vec::new(),
      settings: BTreeMap::new(),
      platform: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.id.name
  }

  pub fn project(&self) -> &Path {
    &self.id.project
  }

  pub fn with_dependency(mut self, dependency: NodeId) -> Self {
    self.dependencies.push(dependency);
    self
  }

  pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
    self.sources.push(path.into());
    self
  }

  pub fn with_resource(mut self, path: impl Into<PathBuf>) -> Self {
    self.resources.push(path.into());
    self
  }

  pub fn with_setting(mut self, key: &str, value: &str) -> Self {
    self.settings.insert(key.to_string(), value.to_string());
    self
  }

  pub fn with_platform(mut self, platform: Platform) -> Self {
    self.platform = Some(platform);
    self
  }

  /// Whether this node builds for `destination`. Nodes without a declared
  /// platform match every destination.
  pub fn matches_destination(&self, destination: Option<&Platform>) -> bool {
    match (destination, &self.platform) {
      (Some(destination), Some(platform)) => destination == platform,
      _ => true,
    }
  }
}

/// Errors raised while constructing or loading a graph.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("duplicate project: {0}")]
  DuplicateProject(PathBuf),

  #[error("duplicate node: {0}")]
  DuplicateNode(NodeId),

  #[error("node {node} belongs to unknown project {project}")]
  UnknownProject { node: NodeId, project: PathBuf },

  #[error("node {node} depends on unknown node {dependency}")]
  UnknownDependency { node: NodeId, dependency: NodeId },

  #[error("failed to read graph manifest {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse graph manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Immutable project dependency graph.
///
/// Projects are keyed by root path and nodes by [`NodeId`]. Construction
/// validates that every node belongs to a known project and every dependency
/// names a known node; acyclicity is checked when the graph is hashed.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  projects: BTreeMap<PathBuf, Project>,
  nodes: BTreeMap<NodeId, Node>,
}

impl Graph {
  pub fn new(
    projects: impl IntoIterator<Item = Project>,
    nodes: impl IntoIterator<Item = Node>,
  ) -> Result<Self, GraphError> {
    let mut graph = Graph::default();

    for project in projects {
      if graph.projects.contains_key(&project.path) {
        return Err(GraphError::DuplicateProject(project.path));
      }
      graph.projects.insert(project.path.clone(), project);
    }

    for mut node in nodes {
      if !graph.projects.contains_key(node.project()) {
        return Err(GraphError::UnknownProject {
          project: node.project().to_path_buf(),
          node: node.id,
        });
      }
      if graph.nodes.contains_key(&node.id) {
        return Err(GraphError::DuplicateNode(node.id));
      }

      // Repeated edges carry no extra meaning
      let mut seen = HashSet::new();
      node.dependencies.retain(|dep| seen.insert(dep.clone()));

      graph.nodes.insert(node.id.clone(), node);
    }

    for node in graph.nodes.values() {
      if let Some(missing) = node.dependencies.iter().find(|dep| !graph.nodes.contains_key(*dep)) {
        return Err(GraphError::UnknownDependency {
          node: node.id.clone(),
          dependency: missing.clone(),
        });
      }
    }

    Ok(graph)
  }

  pub fn node(&self, id: &NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  /// All nodes, ordered by identity.
  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn project(&self, path: &Path) -> Option<&Project> {
    self.projects.get(path)
  }

  pub fn projects(&self) -> impl Iterator<Item = &Project> {
    self.projects.values()
  }
}
