//! JSON graph manifests.
//!
//! A manifest describes projects, their targets and dependency edges, plus
//! optional commands used to probe toolchain and language versions. Relative
//! project paths are resolved against the manifest's directory.
//!
//! # Example
//!
//! ```json
//! {
//!   "projects": [
//!     {
//!       "name": "App",
//!       "path": "app",
//!       "configurations": { "Debug": "debug", "Release": "release" },
//!       "targets": [
//!         { "name": "Core", "product": "framework", "sources": ["Sources/Core"] },
//!         { "name": "App", "product": "executable",
//!           "dependencies": [{ "target": "Core" }] }
//!       ]
//!     }
//!   ],
//!   "toolchain_probe": ["xcodebuild", "-version"],
//!   "language_probe": ["swift", "--version"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::Platform;

use super::types::{BuildVariant, Graph, GraphError, Node, NodeId, Project, ProductKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphManifest {
  pub projects: Vec<ProjectManifest>,
  /// Command printing the toolchain version, e.g. `["xcodebuild", "-version"]`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub toolchain_probe: Option<Vec<String>>,
  /// Command printing the language version, e.g. `["swift", "--version"]`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language_probe: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
  pub name: String,
  pub path: PathBuf,
  #[serde(default)]
  pub configurations: BTreeMap<String, BuildVariant>,
  #[serde(default)]
  pub targets: Vec<TargetManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetManifest {
  pub name: String,
  pub product: ProductKind,
  #[serde(default)]
  pub dependencies: Vec<DependencyRef>,
  #[serde(default)]
  pub sources: Vec<PathBuf>,
  #[serde(default)]
  pub resources: Vec<PathBuf>,
  #[serde(default)]
  pub settings: BTreeMap<String, String>,
  #[serde(default)]
  pub platform: Option<Platform>,
}

/// Reference to a target, in the same project unless `project` is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRef {
  #[serde(default)]
  pub project: Option<PathBuf>,
  pub target: String,
}

impl GraphManifest {
  /// Read and parse a manifest file.
  pub fn load(path: &Path) -> Result<Self, GraphError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| GraphError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Build a validated [`Graph`], resolving relative paths against `base_dir`.
  pub fn to_graph(&self, base_dir: &Path) -> Result<Graph, GraphError> {
    let mut projects = Vec::with_capacity(self.projects.len());
    let mut nodes = Vec::new();

    for project in &self.projects {
      let root = resolve(base_dir, &project.path);

      for target in &project.targets {
        let dependencies = target
          .dependencies
          .iter()
          .map(|dep| {
            let dep_root = dep.project.as_ref().map_or_else(|| root.clone(), |p| resolve(base_dir, p));
            NodeId::new(dep_root, dep.target.clone())
          })
          .collect();

        nodes.push(Node {
          id: NodeId::new(root.clone(), target.name.clone()),
          product: target.product,
          dependencies,
          sources: target.sources.clone(),
          resources: target.resources.clone(),
          settings: target.settings.clone(),
          platform: target.platform,
        });
      }

      projects.push(Project {
        name: project.name.clone(),
        path: root,
        configurations: project.configurations.clone(),
      });
    }

    debug!(projects = projects.len(), nodes = nodes.len(), "loaded graph manifest");

    Graph::new(projects, nodes)
  }
}

/// A graph together with the manifest it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
  pub graph: Graph,
  pub manifest: GraphManifest,
}

/// Load a manifest file and build its graph.
pub fn load_graph(path: &Path) -> Result<LoadedGraph, GraphError> {
  let manifest = GraphManifest::load(path)?;

  let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  let base_dir = dunce::canonicalize(parent).map_err(|source| GraphError::Io {
    path: parent.to_path_buf(),
    source,
  })?;

  let graph = manifest.to_graph(&base_dir)?;
  Ok(LoadedGraph { graph, manifest })
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base_dir.join(path)
  }
}
