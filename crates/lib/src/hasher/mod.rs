//! Graph content hashing.
//!
//! This module provides the main entry point for computing cache keys for a
//! project graph. It handles:
//! - Filtering out excluded nodes and their synthesized resource bundles
//! - Resolving run-wide inputs (configuration, toolchain, language, destination)
//! - Deriving a digest per node from its own content and its dependencies
//! - Publishing the resulting map

pub mod dag;
pub mod engine;
pub mod leaf;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, info};

use crate::context::{ConfigurationResolver, LanguageVersionProvider, RunContext, ToolchainVersionProvider};
use crate::filter::TargetFilter;
use crate::graph::{Graph, NodeId};
use crate::platform::Platform;
use crate::util::hash::Digest;

pub use dag::HashDag;
pub use engine::combine_digest;
pub use leaf::{FileContentHasher, LeafHasher};
pub use types::{HashError, HasherConfig};

/// Node digests published by one hashing invocation.
///
/// Contains exactly the included, hashable nodes matching the destination.
/// Serializes as a JSON object keyed by `"{project}:{name}"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentHashes {
  hashes: BTreeMap<NodeId, Digest>,
}

impl ContentHashes {
  pub fn get(&self, id: &NodeId) -> Option<&Digest> {
    self.hashes.get(id)
  }

  pub fn contains(&self, id: &NodeId) -> bool {
    self.hashes.contains_key(id)
  }

  /// Entries ordered by node identity.
  pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Digest)> {
    self.hashes.iter()
  }

  pub fn len(&self) -> usize {
    self.hashes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hashes.is_empty()
  }

  pub fn into_inner(self) -> BTreeMap<NodeId, Digest> {
    self.hashes
  }
}

impl Serialize for ContentHashes {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.hashes.len()))?;
    for (id, digest) in &self.hashes {
      map.serialize_entry(&id.to_string(), digest)?;
    }
    map.end()
  }
}

/// Computes content hashes for a graph.
///
/// Every external collaborator is injected at construction, so production
/// probes and test doubles are interchangeable.
pub struct GraphContentHasher {
  leaf: Arc<dyn LeafHasher>,
  configuration: Arc<dyn ConfigurationResolver>,
  toolchain: Arc<dyn ToolchainVersionProvider>,
  language: Arc<dyn LanguageVersionProvider>,
  config: HasherConfig,
}

impl GraphContentHasher {
  pub fn new(
    leaf: Arc<dyn LeafHasher>,
    configuration: Arc<dyn ConfigurationResolver>,
    toolchain: Arc<dyn ToolchainVersionProvider>,
    language: Arc<dyn LanguageVersionProvider>,
  ) -> Self {
    Self {
      leaf,
      configuration,
      toolchain,
      language,
      config: HasherConfig::default(),
    }
  }

  pub fn with_config(mut self, config: HasherConfig) -> Self {
    self.config = config;
    self
  }

  /// Compute the digest of every cacheable node in `graph`.
  ///
  /// # Arguments
  ///
  /// * `graph` - The project graph
  /// * `configuration` - Explicitly requested build configuration
  /// * `default_configuration` - Override used when resolving the default configuration
  /// * `excluded` - Node names to leave out, along with their `"{project}_{name}"` bundles
  /// * `destination` - Only publish nodes building for this platform
  ///
  /// # Errors
  ///
  /// Fails with `ConfigurationResolution`, `VersionUnavailable`, `LeafHash`
  /// or `CycleDetected`. No partial result is ever returned.
  pub async fn content_hashes<S: AsRef<str>>(
    &self,
    graph: &Graph,
    configuration: Option<&str>,
    default_configuration: Option<&str>,
    excluded: impl IntoIterator<Item = S>,
    destination: Option<Platform>,
  ) -> Result<ContentHashes, HashError> {
    let started = Instant::now();
    info!(nodes = graph.node_count(), "computing content hashes");

    let filter = TargetFilter::new(graph, excluded);
    let mut excluded_names: Vec<&str> = filter.excluded_names().collect();
    excluded_names.sort_unstable();
    debug!(excluded = ?excluded_names, "target filter");
    let context = RunContext::resolve(
      graph,
      configuration,
      default_configuration,
      destination,
      self.configuration.as_ref(),
      self.toolchain.as_ref(),
      self.language.as_ref(),
    )
    .await?;

    let dag = HashDag::new(graph, &filter, context.destination.as_ref())?;
    debug!(
      included = dag.node_count(),
      hashable = dag.hashable_count(),
      "built hashing DAG"
    );

    let digests = engine::hash_dag(&dag, &self.leaf, &context.additional_inputs(), &self.config).await?;
    let hashes = publish(graph, digests, context.destination.as_ref());

    info!(
      hashed = hashes.len(),
      configuration = %context.configuration,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "content hashes complete"
    );

    Ok(hashes)
  }
}

/// Keep only digests of nodes building for `destination`.
fn publish(graph: &Graph, digests: BTreeMap<NodeId, Digest>, destination: Option<&Platform>) -> ContentHashes {
  let hashes = digests
    .into_iter()
    .filter(|(id, _)| {
      let keep = graph
        .node(id)
        .is_some_and(|node| node.product.is_hashable() && node.matches_destination(destination));
      if !keep {
        debug!(node = %id, "not built for destination, skipping");
      }
      keep
    })
    .collect();

  ContentHashes { hashes }
}
