//! Leaf content hashing.
//!
//! A leaf digest covers a single node's own inputs and nothing about its
//! dependencies. The engine combines leaf digests into graph-aware digests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::consts::CACHE_VERSION;
use crate::graph::Node;
use crate::util::hash::{Digest, DigestBuilder, hash_path};

use super::types::HashError;

/// Hashes one node's own content.
#[async_trait]
pub trait LeafHasher: Send + Sync {
  /// Returns the node's leaf digest, or `LeafHash` naming the node when its
  /// content cannot be read.
  async fn hash_leaf(&self, node: &Node) -> Result<Digest, HashError>;
}

/// Leaf hasher reading a node's sources and resources from disk.
///
/// The digest covers the node name, product kind, platform, build settings
/// and, for each source and resource, its project-relative path and content
/// digest. Directories are hashed recursively. Paths are sorted first so
/// declaration order does not matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContentHasher;

impl FileContentHasher {
  fn hash_node(node: &Node) -> Result<Digest, HashError> {
    let root = node.project();

    let mut builder = DigestBuilder::new(CACHE_VERSION);
    builder
      .str_field(b'N', node.name())
      .str_field(b'K', node.product.as_str());

    if let Some(platform) = &node.platform {
      builder.str_field(b'P', &platform.triple());
    }

    for (key, value) in &node.settings {
      builder.str_field(b'S', key).str_field(b'V', value);
    }

    for path in sorted(&node.sources) {
      let digest = Self::hash_input(node, root, path)?;
      builder.str_field(b'F', &portable(path)).str_field(b'H', digest.as_str());
    }

    for path in sorted(&node.resources) {
      let digest = Self::hash_input(node, root, path)?;
      builder.str_field(b'R', &portable(path)).str_field(b'H', digest.as_str());
    }

    Ok(builder.finish())
  }

  fn hash_input(node: &Node, root: &Path, path: &Path) -> Result<Digest, HashError> {
    let full = root.join(path);
    if !full.exists() {
      return Err(HashError::LeafHash {
        node: node.id.clone(),
        message: format!("missing input {}", full.display()),
      });
    }
    hash_path(&full).map_err(|e| HashError::LeafHash {
      node: node.id.clone(),
      message: e.to_string(),
    })
  }
}

#[async_trait]
impl LeafHasher for FileContentHasher {
  async fn hash_leaf(&self, node: &Node) -> Result<Digest, HashError> {
    debug!(node = %node.id, sources = node.sources.len(), resources = node.resources.len(), "hashing leaf");

    let owned = node.clone();
    tokio::task::spawn_blocking(move || Self::hash_node(&owned))
      .await
      .map_err(|e| HashError::LeafHash {
        node: node.id.clone(),
        message: format!("hashing task failed: {}", e),
      })?
  }
}

fn sorted(paths: &[PathBuf]) -> Vec<&PathBuf> {
  let mut sorted: Vec<&PathBuf> = paths.iter().collect();
  sorted.sort();
  sorted.dedup();
  sorted
}

/// Path string with forward slashes, so digests match across hosts.
fn portable(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}
