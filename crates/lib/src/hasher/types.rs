//! Error and configuration types for graph hashing.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors that abort a hashing invocation.
///
/// Every variant is fatal: a failed invocation never publishes a partial
/// hash map, since a missing entry could be mistaken for "unchanged".
#[derive(Debug, Error)]
pub enum HashError {
  /// No usable build configuration could be determined.
  #[error("could not resolve build configuration: {0}")]
  ConfigurationResolution(String),

  /// A host toolchain or language version could not be read.
  #[error("{tool} version unavailable: {message}")]
  VersionUnavailable { tool: String, message: String },

  /// A node's own content could not be hashed.
  #[error("failed to hash {node}: {message}")]
  LeafHash { node: NodeId, message: String },

  /// Cycle detected in the dependency graph.
  #[error("dependency cycle detected")]
  CycleDetected,

  /// A hashing task panicked or was cancelled.
  #[error("hashing task failed: {0}")]
  TaskFailed(String),
}

impl HashError {
  /// Attribute a leaf hashing failure to `node`.
  ///
  /// Collaborators may report failures without naming the node; the engine
  /// uses this so callers always learn which node failed.
  pub fn for_node(self, node: &NodeId) -> Self {
    match self {
      HashError::LeafHash { .. } => self,
      other => HashError::LeafHash {
        node: node.clone(),
        message: other.to_string(),
      },
    }
  }
}

/// Configuration for a hashing invocation.
#[derive(Debug, Clone)]
pub struct HasherConfig {
  /// Maximum number of leaf hashes computed concurrently.
  pub parallelism: usize,
}

impl Default for HasherConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
